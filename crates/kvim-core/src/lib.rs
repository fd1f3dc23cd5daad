//! Session core for kvim: open tabs, their classification and highlighting,
//! and the per-project annotation stores they share.

pub mod error;
pub mod highlight;
pub mod session;

pub use error::{ErrorKind, Result, SessionError};
pub use highlight::{HighlightQueue, HighlightRequest, PumpReport};
pub use session::Session;

pub use kvim_config::{SessionConfig, SessionPaths};
pub use kvim_document::{Document, DocumentId};
