//! Moka fast tier implementation.

use async_trait::async_trait;
use fluently_backend::{BackendError, BackendResult, FastTier, Populate};
use fluently_core::CachedResponse;
use moka::future::Cache;
use smol_str::SmolStr;
use tracing::trace;

/// In-memory fast tier powered by Moka.
///
/// `MokaFastTier` keeps unserialized [`CachedResponse`] snapshots in Moka's
/// async cache. Reads clone the stored snapshot, so callers always receive an
/// independent copy.
///
/// [`get_or_populate`](FastTier::get_or_populate) is backed by Moka's
/// `try_get_with`: concurrent callers for the same absent key wait on a
/// single initializer and share its outcome, so a cold key reaches the slower
/// tier once.
///
/// # Examples
///
/// ```
/// use fluently_moka::MokaFastTier;
///
/// let fast = MokaFastTier::builder().max_entries(10_000).build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted**; pair it with a durable backend through
///   `TieredCacheService` when entries must survive a restart
/// - Expiration is **best-effort**: expired entries may briefly remain
///   readable until Moka's maintenance runs
#[derive(Clone)]
pub struct MokaFastTier {
    pub(crate) cache: Cache<String, CachedResponse>,
    pub(crate) label: SmolStr,
}

/// Outcome of an initializer that did not produce a value.
#[derive(Debug)]
enum PopulateError {
    Miss,
    Failed(BackendError),
}

impl MokaFastTier {
    /// Creates a new builder for `MokaFastTier`.
    pub fn builder() -> crate::builder::MokaFastTierBuilder {
        crate::builder::MokaFastTierBuilder::default()
    }

    /// The underlying Moka cache.
    pub fn cache(&self) -> &Cache<String, CachedResponse> {
        &self.cache
    }
}

impl std::fmt::Debug for MokaFastTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaFastTier")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl FastTier for MokaFastTier {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.cache.get(key).await
    }

    async fn get_or_populate(
        &self,
        key: &str,
        populate: Populate<'_>,
    ) -> BackendResult<Option<CachedResponse>> {
        let result = self
            .cache
            .try_get_with(key.to_owned(), async move {
                trace!("fast tier miss, populating");
                match populate.await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(PopulateError::Miss),
                    Err(err) => Err(PopulateError::Failed(err)),
                }
            })
            .await;

        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => match err.as_ref() {
                PopulateError::Miss => Ok(None),
                PopulateError::Failed(err) => Err(err.clone()),
            },
        }
    }

    async fn set(&self, key: &str, value: CachedResponse) {
        self.cache.insert(key.to_owned(), value).await;
    }

    fn name(&self) -> &str {
        &self.label
    }
}
