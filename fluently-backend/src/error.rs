use std::sync::Arc;

use thiserror::Error;

use crate::format::FormatError;

/// Opaque error source shared between clones of an error.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// Error describing general groups of failures in cache tier interaction.
///
/// Errors are cheap to clone: a single failed durable lookup may be observed by
/// every caller coalesced on the same fast-tier key.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not bounded with network interaction.
    #[error(transparent)]
    InternalError(ErrorSource),
    /// Network interaction error.
    #[error(transparent)]
    ConnectionError(ErrorSource),
    /// Serializing\Deserializing data error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

impl BackendError {
    /// Wraps any error as [`BackendError::InternalError`].
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::InternalError(Arc::new(error))
    }

    /// Wraps any error as [`BackendError::ConnectionError`].
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::ConnectionError(Arc::new(error))
    }

    /// Returns `true` when a stored entry could not be decoded.
    pub fn is_corrupt_entry(&self) -> bool {
        matches!(self, BackendError::FormatError(FormatError::Deserialize(_)))
    }
}

/// Result alias used across cache tiers.
pub type BackendResult<T> = Result<T, BackendError>;
