//! Simple in-memory test tiers using DashMap.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use fluently_backend::{
    Backend, BackendError, BackendResult, FastTier, Format, KeyFormat, Populate, SerializedEntry,
};
use fluently_core::CachedResponse;

/// In-memory durable backend counting its calls.
#[derive(Clone, Default)]
pub struct TestBackend {
    store: Arc<DashMap<String, Bytes>>,
    finds: Arc<AtomicUsize>,
    inserts: Arc<AtomicUsize>,
    key_format: KeyFormat,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    pub fn put_raw(&self, key: &str, data: impl Into<Bytes>) {
        self.store.insert(key.to_owned(), data.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn find(&self, key: &str) -> BackendResult<Option<Bytes>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get(key).map(|value| value.clone()))
    }

    async fn insert(&self, entry: SerializedEntry) -> BackendResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.store.insert(entry.key, entry.data);
        Ok(())
    }

    fn key_format(&self) -> &KeyFormat {
        &self.key_format
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Backend that always returns errors (for error testing).
#[derive(Clone, Default)]
pub struct ErrorBackend;

#[async_trait]
impl Backend for ErrorBackend {
    async fn find(&self, _key: &str) -> BackendResult<Option<Bytes>> {
        Err(BackendError::connection(std::io::Error::other(
            "simulated error",
        )))
    }

    async fn insert(&self, _entry: SerializedEntry) -> BackendResult<()> {
        Err(BackendError::connection(std::io::Error::other(
            "simulated error",
        )))
    }

    fn name(&self) -> &str {
        "error"
    }
}

/// Fast tier over a DashMap, without populate coalescing.
#[derive(Clone, Default)]
pub struct TestFastTier {
    store: Arc<DashMap<String, CachedResponse>>,
}

impl TestFastTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self, key: &str) -> Option<CachedResponse> {
        self.store.get(key).map(|value| value.clone())
    }
}

#[async_trait]
impl FastTier for TestFastTier {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.peek(key)
    }

    async fn get_or_populate(
        &self,
        key: &str,
        populate: Populate<'_>,
    ) -> BackendResult<Option<CachedResponse>> {
        if let Some(value) = self.peek(key) {
            return Ok(Some(value));
        }
        let value = populate.await?;
        if let Some(value) = &value {
            self.store.insert(key.to_owned(), value.clone());
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: CachedResponse) {
        self.store.insert(key.to_owned(), value);
    }

    fn name(&self) -> &str {
        "test-fast"
    }
}

/// Encodes an entry the way [`TestBackend`] stores it by default.
pub fn encode(entry: &CachedResponse) -> Bytes {
    fluently_backend::JsonFormat.serialize(entry).unwrap()
}
