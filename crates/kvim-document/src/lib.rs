//! Document handling for kvim
//!
//! This crate provides the open-buffer model:
//! - File-backed and untitled documents
//! - Dirty tracking against the last persisted snapshot
//! - Language and workspace context derived when a file is opened
//! - Revision-checked keyword highlights

pub mod document;

pub use document::{Document, DocumentError, DocumentId, Result, normalize_path};
