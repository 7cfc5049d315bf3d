//! Cache tiers and response cache services for fluently.
//!
//! Implement [`Backend`] for a new durable store or [`FastTier`] for a new
//! in-process cache; [`TieredCacheService`] composes the two.
mod backend;
mod error;
pub mod fast;
pub mod format;
mod key;
pub mod service;

pub use backend::{Backend, CacheBackend, SerializedEntry};
pub use error::{BackendError, BackendResult, ErrorSource};
pub use fast::{FastTier, Populate};
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
pub use key::KeyFormat;
pub use service::{
    CorruptEntryPolicy, MemoryCacheService, ResponseCacheService, TieredCacheService,
};
