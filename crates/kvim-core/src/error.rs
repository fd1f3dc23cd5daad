use kvim_config::{PropertiesError, SettingsError, StoreError};
use kvim_document::DocumentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Properties(#[from] PropertiesError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Invalid session operation: {0}")]
    InvalidState(String),
}

/// Coarse classification shared by every session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    CorruptStore,
    Io,
    InvalidState,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Document(DocumentError::NotFound(_)) => ErrorKind::NotFound,
            SessionError::Document(DocumentError::InvalidState(_))
            | SessionError::Store(StoreError::InvalidState(_))
            | SessionError::InvalidState(_) => ErrorKind::InvalidState,
            SessionError::Store(StoreError::CorruptStore { .. }) => ErrorKind::CorruptStore,
            SessionError::Document(DocumentError::Io { .. })
            | SessionError::Store(StoreError::Io { .. })
            | SessionError::Properties(_)
            | SessionError::Settings(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn no_document(index: usize) -> Self {
        SessionError::InvalidState(format!("no open document at index {index}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn kinds_follow_the_wrapped_error() {
        let missing: SessionError = DocumentError::NotFound(PathBuf::from("/gone")).into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let corrupt: SessionError = StoreError::CorruptStore {
            path: PathBuf::from("/p/.kvim/todo.kvim"),
            reason: "duplicate name".into(),
        }
        .into();
        assert_eq!(corrupt.kind(), ErrorKind::CorruptStore);

        let io: SessionError = StoreError::Io {
            path: PathBuf::from("/p/.kvim/todo.kvim"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
        .into();
        assert_eq!(io.kind(), ErrorKind::Io);

        assert_eq!(SessionError::no_document(3).kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn messages_pass_through() {
        let err: SessionError = DocumentError::InvalidState("buffer is dirty".into()).into();
        assert_eq!(err.to_string(), "Invalid document operation: buffer is dirty");
        assert_eq!(
            SessionError::no_document(2).to_string(),
            "Invalid session operation: no open document at index 2"
        );
    }
}
