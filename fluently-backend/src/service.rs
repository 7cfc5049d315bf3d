//! Response cache services consulted by the caching middleware.
//!
//! [`MemoryCacheService`] keeps entries in a fast tier only.
//! [`TieredCacheService`] puts a fast tier in front of a durable [`Backend`]:
//!
//! - `get` asks the fast tier first; on a miss the durable tier is read and a
//!   hit populates the fast tier before a copy is returned.
//! - `set` serializes and commits to the durable tier first, then populates
//!   the fast tier with the unserialized snapshot.
//!
//! Both hand out owned copies only.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::CachedResponse;
use tracing::{trace, warn};

use crate::{BackendResult, CacheBackend, FastTier, backend::Backend};

/// What to do with a durable entry that can not be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptEntryPolicy {
    /// Propagate the decoding error to the caller.
    #[default]
    Fail,
    /// Log a warning and report a miss, so the entry is refetched and rewritten.
    TreatAsMiss,
}

/// Response cache keyed by request fingerprint.
#[async_trait]
pub trait ResponseCacheService: Send + Sync {
    /// Returns an owned copy of the entry stored under `hash`.
    async fn get(&self, hash: &str) -> BackendResult<Option<CachedResponse>>;

    /// Stores `response` under `hash`.
    async fn set(&self, hash: &str, response: CachedResponse) -> BackendResult<()>;
}

#[async_trait]
impl<T> ResponseCacheService for Arc<T>
where
    T: ResponseCacheService + ?Sized,
{
    async fn get(&self, hash: &str) -> BackendResult<Option<CachedResponse>> {
        (**self).get(hash).await
    }

    async fn set(&self, hash: &str, response: CachedResponse) -> BackendResult<()> {
        (**self).set(hash, response).await
    }
}

/// Cache service backed by a fast tier alone.
#[derive(Debug, Clone)]
pub struct MemoryCacheService<F> {
    fast: F,
}

impl<F> MemoryCacheService<F>
where
    F: FastTier,
{
    /// Service over `fast` alone.
    pub fn new(fast: F) -> Self {
        Self { fast }
    }
}

#[async_trait]
impl<F> ResponseCacheService for MemoryCacheService<F>
where
    F: FastTier,
{
    async fn get(&self, hash: &str) -> BackendResult<Option<CachedResponse>> {
        let entry = self.fast.get(hash).await;
        trace!(tier = self.fast.name(), hit = entry.is_some(), "fast tier lookup");
        Ok(entry)
    }

    async fn set(&self, hash: &str, mut response: CachedResponse) -> BackendResult<()> {
        response.hash = hash.to_owned();
        self.fast.set(hash, response).await;
        Ok(())
    }
}

/// Fast tier in front of a durable backend.
pub struct TieredCacheService<F, B> {
    fast: F,
    durable: B,
    corrupt_entries: CorruptEntryPolicy,
}

impl<F, B> TieredCacheService<F, B>
where
    F: FastTier,
    B: Backend,
{
    /// Service with `fast` in front of `durable`.
    pub fn new(fast: F, durable: B) -> Self {
        Self {
            fast,
            durable,
            corrupt_entries: CorruptEntryPolicy::default(),
        }
    }

    /// Sets how undecodable durable entries are handled.
    pub fn with_corrupt_entry_policy(mut self, policy: CorruptEntryPolicy) -> Self {
        self.corrupt_entries = policy;
        self
    }

    /// The fast tier.
    pub fn fast(&self) -> &F {
        &self.fast
    }

    /// The durable tier.
    pub fn durable(&self) -> &B {
        &self.durable
    }

    async fn read_durable(&self, hash: &str) -> BackendResult<Option<CachedResponse>> {
        match self.durable.get(hash).await {
            Err(err)
                if err.is_corrupt_entry()
                    && self.corrupt_entries == CorruptEntryPolicy::TreatAsMiss =>
            {
                warn!(
                    backend = self.durable.name(),
                    error = %err,
                    "corrupt cache entry treated as miss"
                );
                Ok(None)
            }
            result => result,
        }
    }
}

impl<F, B> fmt::Debug for TieredCacheService<F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCacheService")
            .field("corrupt_entries", &self.corrupt_entries)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, B> ResponseCacheService for TieredCacheService<F, B>
where
    F: FastTier,
    B: Backend,
{
    #[tracing::instrument(level = "trace", skip(self))]
    async fn get(&self, hash: &str) -> BackendResult<Option<CachedResponse>> {
        self.fast
            .get_or_populate(hash, Box::pin(self.read_durable(hash)))
            .await
    }

    #[tracing::instrument(level = "trace", skip(self, response))]
    async fn set(&self, hash: &str, mut response: CachedResponse) -> BackendResult<()> {
        response.hash = hash.to_owned();
        self.durable.set(&response).await?;
        self.fast.set(hash, response).await;
        Ok(())
    }
}
