#![warn(missing_docs)]
//! FeOxDB durable tier for the fluently response cache.
//!
//! [`FeOxDbBackend`] implements [`Backend`](fluently_backend::Backend): it
//! stores encoded response snapshots on disk (or in memory) with an optional
//! per-entry TTL, and is meant to sit behind a fast tier in a
//! [`TieredCacheService`](fluently_backend::TieredCacheService).

mod backend;
mod error;

pub use backend::{FeOxDbBackend, FeOxDbBackendBuilder};
pub use error::FeOxDbError;
