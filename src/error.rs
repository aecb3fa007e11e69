use thiserror::Error;

/// Failures surfaced by [`crate::index::FileIndex`].
///
/// The HTTP layer maps `NotFound` to 404 and `Internal` to 500; the message
/// is passed through to the client in both cases.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IndexError {
    pub fn invalid_file_type() -> Self {
        Self::NotFound("Invalid file type".to_string())
    }

    pub fn file_not_found() -> Self {
        Self::NotFound("File not found".to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<tokio::task::JoinError> for IndexError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("index task failed: {}", err))
    }
}
