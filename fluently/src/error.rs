use fluently_backend::BackendError;
use fluently_core::HeaderError;
use thiserror::Error;

/// Boxed error produced outside this crate (transports, middleware factories).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the client, its pipeline and built-in stages.
#[derive(Debug, Error)]
pub enum Error {
    /// A middleware factory failed while the pipeline was being built.
    #[error("middleware #{index} `{name}` could not be built: {reason}")]
    InvalidMiddleware {
        /// Position of the descriptor, 0 being outermost.
        index: usize,
        /// Descriptor name.
        name: String,
        /// Factory error message.
        reason: String,
    },

    /// The request failed validation before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration is invalid or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cache tier failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A header could not be added or converted.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// The transport failed to perform the exchange.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The exchange was cancelled through its cancellation token.
    #[error("request cancelled")]
    Cancelled,

    /// A body could not be serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wraps a transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Transport(error.into())
    }
}

/// Result alias with [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
