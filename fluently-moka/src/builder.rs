//! Builder for configuring [`MokaFastTier`].

use std::time::Duration;

use fluently_core::CachedResponse;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;

use crate::backend::MokaFastTier;

const DEFAULT_LABEL: &str = "moka";

/// Marker type: capacity has not been configured yet.
///
/// Call [`max_entries()`](MokaFastTierBuilder::max_entries) or
/// [`max_bytes()`](MokaFastTierBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaFastTier`].
///
/// Capacity is required and uses the typestate pattern: `build()` only exists
/// once exactly one of [`max_entries`](Self::max_entries) or
/// [`max_bytes`](Self::max_bytes) has been called.
///
/// ```
/// use std::time::Duration;
/// use fluently_moka::MokaFastTier;
///
/// let fast = MokaFastTier::builder()
///     .label("heroes")
///     .max_bytes(64 * 1024 * 1024)
///     .time_to_live(Duration::from_secs(300))
///     .build();
/// ```
pub struct MokaFastTierBuilder<Cap = NoCapacity> {
    capacity: Cap,
    label: SmolStr,
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
    eviction_policy: Option<EvictionPolicy>,
}

impl Default for MokaFastTierBuilder<NoCapacity> {
    fn default() -> Self {
        Self {
            capacity: NoCapacity,
            label: SmolStr::new_static(DEFAULT_LABEL),
            time_to_live: None,
            time_to_idle: None,
            eviction_policy: None,
        }
    }
}

impl MokaFastTierBuilder<NoCapacity> {
    /// Limits the cache to `n` entries.
    pub fn max_entries(self, n: u64) -> MokaFastTierBuilder<EntryCapacity> {
        self.with_capacity(EntryCapacity(n))
    }

    /// Limits the cache to roughly `n` bytes of snapshot data.
    pub fn max_bytes(self, n: u64) -> MokaFastTierBuilder<ByteCapacity> {
        self.with_capacity(ByteCapacity(n))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> MokaFastTierBuilder<Cap> {
        MokaFastTierBuilder {
            capacity,
            label: self.label,
            time_to_live: self.time_to_live,
            time_to_idle: self.time_to_idle,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap> MokaFastTierBuilder<Cap> {
    /// Sets the label reported in logs.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Evicts entries this long after insertion.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Evicts entries this long after their last read.
    pub fn time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    /// Overrides the eviction policy.
    ///
    /// Defaults to TinyLFU for entry capacity and LRU for byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    fn finish(
        self,
        mut builder: CacheBuilder<String, CachedResponse, Cache<String, CachedResponse>>,
        default_policy: fn() -> EvictionPolicy,
    ) -> MokaFastTier {
        builder = builder.eviction_policy(self.eviction_policy.unwrap_or_else(default_policy));
        if let Some(ttl) = self.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        if let Some(tti) = self.time_to_idle {
            builder = builder.time_to_idle(tti);
        }
        MokaFastTier {
            cache: builder.name(&self.label).build(),
            label: self.label,
        }
    }
}

impl MokaFastTierBuilder<EntryCapacity> {
    /// Builds the [`MokaFastTier`] with entry-count based capacity.
    pub fn build(self) -> MokaFastTier {
        let builder = CacheBuilder::new(self.capacity.0);
        self.finish(builder, EvictionPolicy::tiny_lfu)
    }
}

impl MokaFastTierBuilder<ByteCapacity> {
    /// Builds the [`MokaFastTier`] with byte-based capacity.
    ///
    /// Defaults to LRU: TinyLFU's admission policy can reject new entries
    /// even when eviction could make room.
    pub fn build(self) -> MokaFastTier {
        let builder = CacheBuilder::new(self.capacity.0).weigher(byte_weigher);
        self.finish(builder, EvictionPolicy::lru)
    }
}

/// Approximate byte cost of an entry.
fn byte_weigher(key: &String, value: &CachedResponse) -> u32 {
    let headers: usize = value
        .headers
        .iter()
        .map(|(name, values)| name.len() + values.iter().map(String::len).sum::<usize>())
        .sum();
    let size = key.len()
        + value.hash.len()
        + value.reason_phrase.len()
        + value.content.len()
        + value.content_type.as_ref().map_or(0, String::len)
        + headers;
    u32::try_from(size).unwrap_or(u32::MAX)
}
