//! Fast, process-local cache tier.

use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::CachedResponse;
use futures::future::BoxFuture;

use crate::BackendResult;

/// Lookup run by [`FastTier::get_or_populate`] when the key is absent.
///
/// `Ok(None)` means the slower tier has no entry either; nothing is stored.
pub type Populate<'a> = BoxFuture<'a, BackendResult<Option<CachedResponse>>>;

/// Low-latency cache in front of a durable store.
///
/// Values are owned snapshots; every read hands out a clone, so callers can
/// never alter what the tier holds.
#[async_trait]
pub trait FastTier: Send + Sync {
    /// Returns the entry under `key`, if present.
    async fn get(&self, key: &str) -> Option<CachedResponse>;

    /// Returns the entry under `key`, running `populate` on absence and
    /// storing its result.
    ///
    /// Implementations must be race-safe per key: concurrent callers for the
    /// same absent key observe a single `populate` run and share its outcome.
    async fn get_or_populate(
        &self,
        key: &str,
        populate: Populate<'_>,
    ) -> BackendResult<Option<CachedResponse>>;

    /// Stores `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: CachedResponse);

    /// Returns the name of this tier, used in logs.
    fn name(&self) -> &str {
        "fast"
    }
}

#[async_trait]
impl<T> FastTier for Arc<T>
where
    T: FastTier + ?Sized,
{
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        (**self).get(key).await
    }

    async fn get_or_populate(
        &self,
        key: &str,
        populate: Populate<'_>,
    ) -> BackendResult<Option<CachedResponse>> {
        (**self).get_or_populate(key, populate).await
    }

    async fn set(&self, key: &str, value: CachedResponse) {
        (**self).set(key, value).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
