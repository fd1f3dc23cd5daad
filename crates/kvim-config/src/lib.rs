//! Persistent state for kvim sessions
//!
//! - Per-workspace TODO annotations under `<project>/.kvim/todo.kvim`
//! - Flat key/value property files for recent files and session geometry
//! - The user's `config.toml`

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub mod properties;
pub mod recent;
pub mod session;
pub mod settings;
pub mod todo;

pub use properties::{Properties, PropertiesError};
pub use recent::{RECENT_CAPACITY, RecentEntry, RecentFiles};
pub use session::{SessionProperties, WindowGeometry};
pub use settings::{
    HighlightConfig, HighlightMode, MarkerConfig, SessionConfig, SessionPaths, SettingsError,
    StoreConfig,
};
pub use todo::{AnnotationStore, StoreError, StoreOptions, TodoItem};

/// Replace `path` with `contents` by writing a sibling temp file and renaming it
/// over the target, so readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
