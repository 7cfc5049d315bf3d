use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use fluently_core::CachedResponse;

use crate::{
    BackendResult, KeyFormat,
    format::{Format, JsonFormat},
};

/// Serialized shape of a cache entry as the durable tier stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEntry {
    /// Storage key, already passed through the backend's [`KeyFormat`].
    pub key: String,
    /// Encoded [`CachedResponse`].
    pub data: Bytes,
}

/// Durable cache store.
///
/// Implementations only move bytes; encoding and key derivation live in
/// [`CacheBackend`]. `insert` must be all-or-nothing: a failed insert leaves
/// no partial entry behind.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Reads the raw entry stored under `key`, `None` when absent.
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>>;

    /// Stores `entry`, replacing any entry under the same key.
    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()>;

    /// Returns the name of this backend, used in logs.
    fn name(&self) -> &str {
        "backend"
    }

    /// Encoding of stored values. Defaults to [`JsonFormat`].
    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }

    /// Mapping from fingerprints to storage keys. Defaults to
    /// [`KeyFormat::Plain`].
    fn key_format(&self) -> &KeyFormat {
        &KeyFormat::Plain
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (*self).find(key).await
    }

    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()> {
        (*self).insert(entry).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }

    fn key_format(&self) -> &KeyFormat {
        (*self).key_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (**self).find(key).await
    }

    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()> {
        (**self).insert(entry).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }

    fn key_format(&self) -> &KeyFormat {
        (**self).key_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + 'static> {
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (**self).find(key).await
    }

    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()> {
        (**self).insert(entry).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }

    fn key_format(&self) -> &KeyFormat {
        (**self).key_format()
    }
}

/// Typed operations over a [`Backend`].
///
/// `get` and `set` take fingerprints and [`CachedResponse`] snapshots, and
/// handle key derivation and value encoding with the backend's own formats.
pub trait CacheBackend: Backend {
    /// Reads and decodes the entry for `fingerprint`.
    ///
    /// An entry that fails to decode is reported as
    /// [`FormatError::Deserialize`](crate::FormatError::Deserialize).
    fn get(
        &self,
        fingerprint: &str,
    ) -> impl Future<Output = BackendResult<Option<CachedResponse>>> + Send {
        async move {
            let key = self.key_format().format(fingerprint);
            match self.find(&key).await? {
                Some(data) => {
                    let entry = self.value_format().deserialize(&data)?;
                    tracing::trace!(backend = self.name(), bytes = data.len(), "durable hit");
                    Ok(Some(entry))
                }
                None => Ok(None),
            }
        }
    }

    /// Encodes `entry` and inserts it under its fingerprint.
    ///
    /// Encoding happens before the store is touched, so an entry that can not
    /// be serialized never reaches the backend.
    fn set(&self, entry: &CachedResponse) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let data = self.value_format().serialize(entry)?;
            let key = self.key_format().format(&entry.hash);
            tracing::trace!(backend = self.name(), bytes = data.len(), "durable write");
            self.insert(SerializedEntry { key, data }).await
        }
    }
}

impl<T> CacheBackend for T where T: Backend + ?Sized {}
