#![warn(missing_docs)]
//! Moka-backed fast tier for the fluently response cache.
//!
//! [`MokaFastTier`] implements [`FastTier`](fluently_backend::FastTier) and is
//! meant to sit in front of a durable backend inside a
//! [`TieredCacheService`](fluently_backend::TieredCacheService), or alone in a
//! [`MemoryCacheService`](fluently_backend::MemoryCacheService).

mod backend;
mod builder;

pub use backend::MokaFastTier;
pub use builder::{ByteCapacity, EntryCapacity, MokaFastTierBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
