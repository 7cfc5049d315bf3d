use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use feoxdb::{FeoxError, FeoxStore};
use fluently_backend::{
    Backend, BackendError, BackendResult, KeyFormat, SerializedEntry,
    format::{Format, JsonFormat},
};
use smol_str::SmolStr;
use tracing::trace;

use crate::FeOxDbError;

const DEFAULT_LABEL: &str = "feoxdb";
const DB_FILE: &str = "cache.db";

/// Disk-based durable tier using FeOxDB.
///
/// Use this when cached responses must survive restarts or don't fit in
/// memory. Keys default to [`KeyFormat::Sha256`], so fingerprints (which may
/// contain header values) never land on disk in clear text.
///
/// ```no_run
/// use std::time::Duration;
/// use fluently_feoxdb::FeOxDbBackend;
///
/// // Persistent cache with defaults
/// let backend = FeOxDbBackend::builder()
///     .path("/var/cache/heroes")
///     .build()?;
///
/// // With resource limits and an entry lifetime
/// let backend = FeOxDbBackend::builder()
///     .path("/var/cache/heroes")
///     .max_file_size(10 * 1024 * 1024 * 1024)  // 10 GB
///     .max_memory(256 * 1024 * 1024)           // 256 MB
///     .ttl(Duration::from_secs(3600))
///     .build()?;
/// # Ok::<(), fluently_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap; clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbBackend<S = JsonFormat>
where
    S: Format,
{
    store: Arc<FeoxStore>,
    key_format: KeyFormat,
    serializer: S,
    ttl: Option<Duration>,
    label: SmolStr,
}

impl<S> FeOxDbBackend<S>
where
    S: Format,
{
    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes in memory and flushes them periodically (~100ms).
    /// No-op in memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// Lifetime applied to every inserted entry.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl<S> fmt::Debug for FeOxDbBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeOxDbBackend")
            .field("label", &self.label)
            .field("key_format", &self.key_format)
            .field("serializer", &self.serializer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl FeOxDbBackend<JsonFormat> {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder<JsonFormat> {
        FeOxDbBackendBuilder::default()
    }

    /// In-memory backend for tests.
    ///
    /// Data is lost when dropped. Equivalent to `builder().build()`.
    ///
    /// ```
    /// use fluently_feoxdb::FeOxDbBackend;
    ///
    /// let backend = FeOxDbBackend::in_memory()
    ///     .expect("Failed to create in-memory backend");
    /// ```
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }
}

/// Builder for [`FeOxDbBackend`].
///
/// ```no_run
/// use fluently_feoxdb::FeOxDbBackend;
/// use fluently_backend::BincodeFormat;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/cache/heroes")
///     .max_memory(256 * 1024 * 1024)
///     .value_format(BincodeFormat)
///     .build()?;
/// # Ok::<(), fluently_feoxdb::FeOxDbError>(())
/// ```
pub struct FeOxDbBackendBuilder<S = JsonFormat>
where
    S: Format,
{
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    ttl: Option<Duration>,
    key_format: KeyFormat,
    serializer: S,
    label: SmolStr,
}

impl Default for FeOxDbBackendBuilder<JsonFormat> {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            ttl: None,
            key_format: KeyFormat::Sha256,
            serializer: JsonFormat,
            label: SmolStr::new_static(DEFAULT_LABEL),
        }
    }
}

impl<S> FeOxDbBackendBuilder<S>
where
    S: Format,
{
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory and is lost on restart.
    /// If path is a directory, creates `cache.db` inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Writes fail with `OutOfSpace` when full. Ignored in memory-only mode.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    ///
    /// FeOxDB has no automatic eviction: writes fail with `OutOfMemory` when
    /// the limit is reached.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Expires every entry this long after it was written.
    ///
    /// FeOxDB tracks TTLs in whole seconds; shorter lifetimes round up to one
    /// second.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Storage key format.
    pub fn key_format(mut self, format: KeyFormat) -> Self {
        self.key_format = format;
        self
    }

    /// Identifies this backend in logs.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Value serialization format.
    ///
    /// `BincodeFormat` is compact; `JsonFormat` (default) keeps values readable.
    pub fn value_format<NewS>(self, serializer: NewS) -> FeOxDbBackendBuilder<NewS>
    where
        NewS: Format,
    {
        FeOxDbBackendBuilder {
            path: self.path,
            max_file_size: self.max_file_size,
            max_memory: self.max_memory,
            ttl: self.ttl,
            key_format: self.key_format,
            serializer,
            label: self.label,
        }
    }

    /// Creates the backend.
    ///
    /// Fails if the database file can't be opened or created.
    pub fn build(self) -> Result<FeOxDbBackend<S>, FeOxDbError> {
        if self.ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(FeOxDbError::InvalidConfig(
                "ttl must be greater than zero".to_owned(),
            ));
        }

        let mut builder = FeoxStore::builder().enable_ttl(true);

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push(DB_FILE);
            } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;

        Ok(FeOxDbBackend {
            store: Arc::new(store),
            key_format: self.key_format,
            serializer: self.serializer,
            ttl: self.ttl,
            label: self.label,
        })
    }
}

#[async_trait]
impl<S> Backend for FeOxDbBackend<S>
where
    S: Format,
{
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>> {
        let store = self.store.clone();
        let key = key.to_owned();
        let label = self.label.clone();

        tokio::task::spawn_blocking(move || -> BackendResult<Option<Bytes>> {
            match store.get(key.as_bytes()) {
                Ok(value) => {
                    trace!(backend = %label, %key, bytes = value.len(), "feoxdb hit");
                    Ok(Some(Bytes::from(value)))
                }
                Err(FeoxError::KeyNotFound) => {
                    trace!(backend = %label, %key, "feoxdb miss");
                    Ok(None)
                }
                Err(e) => Err(FeOxDbError::from(e).into()),
            }
        })
        .await
        .map_err(BackendError::internal)?
    }

    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()> {
        let store = self.store.clone();
        let ttl_secs = self.ttl.map(|ttl| ttl.as_secs().max(1));
        trace!(
            backend = %self.label,
            key = %entry.key,
            bytes = entry.data.len(),
            ttl_secs,
            "feoxdb insert"
        );

        tokio::task::spawn_blocking(move || -> BackendResult<()> {
            let key = entry.key.as_bytes();
            ttl_secs
                .map(|secs| store.insert_with_ttl(key, &entry.data, secs))
                .unwrap_or_else(|| store.insert(key, &entry.data))
                .map_err(FeOxDbError::from)?;
            Ok(())
        })
        .await
        .map_err(BackendError::internal)?
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }

    fn key_format(&self) -> &KeyFormat {
        &self.key_format
    }
}
