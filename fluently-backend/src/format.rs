//! Value formats for the durable tier.
//!
//! A [`Format`] turns a [`CachedResponse`] into the bytes a durable store keeps
//! and back. [`JsonFormat`] is human readable and the default;
//! [`BincodeFormat`] is compact.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use fluently_core::CachedResponse;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FormatError {
    #[error("failed to serialize cache entry: {0}")]
    Serialize(Arc<dyn std::error::Error + Send + Sync>),

    #[error("failed to deserialize cache entry: {0}")]
    Deserialize(Arc<dyn std::error::Error + Send + Sync>),
}

impl FormatError {
    fn serialize<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FormatError::Serialize(Arc::new(error))
    }

    fn deserialize<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FormatError::Deserialize(Arc::new(error))
    }
}

/// Object-safe serialization strategy for cache entries.
pub trait Format: Debug + Send + Sync {
    /// Encodes an entry.
    fn serialize(&self, entry: &CachedResponse) -> Result<Bytes, FormatError>;

    /// Decodes an entry.
    fn deserialize(&self, data: &[u8]) -> Result<CachedResponse, FormatError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, entry: &CachedResponse) -> Result<Bytes, FormatError> {
        serde_json::to_vec(entry)
            .map(Bytes::from)
            .map_err(FormatError::serialize)
    }

    fn deserialize(&self, data: &[u8]) -> Result<CachedResponse, FormatError> {
        serde_json::from_slice(data).map_err(FormatError::deserialize)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Bincode 2 over serde, standard configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize(&self, entry: &CachedResponse) -> Result<Bytes, FormatError> {
        bincode::serde::encode_to_vec(entry, bincode::config::standard())
            .map(Bytes::from)
            .map_err(FormatError::serialize)
    }

    fn deserialize(&self, data: &[u8]) -> Result<CachedResponse, FormatError> {
        bincode::serde::decode_from_slice(data, bincode::config::standard())
            .map(|(entry, _)| entry)
            .map_err(FormatError::deserialize)
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}
