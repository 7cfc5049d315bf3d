use feoxdb::FeoxError;
use fluently_backend::BackendError;
use thiserror::Error;

/// Errors raised by [`FeOxDbBackend`](crate::FeOxDbBackend).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// The store rejected an operation.
    #[error("feoxdb: {0}")]
    FeOxDb(#[from] FeoxError),

    /// The database directory could not be prepared.
    #[error("feoxdb io: {0}")]
    Io(#[from] std::io::Error),

    /// Builder values that can not be used together.
    #[error("invalid feoxdb configuration: {0}")]
    InvalidConfig(String),
}

impl From<FeOxDbError> for BackendError {
    fn from(error: FeOxDbError) -> Self {
        match error {
            FeOxDbError::Io(err) => BackendError::connection(err),
            other => BackendError::internal(other),
        }
    }
}
