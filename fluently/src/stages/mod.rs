//! Built-in stages.
//!
//! Each stage comes with its options type and an extension trait for
//! per-request overrides stored on the items bag.

pub mod logger;
pub mod response_cache;
pub mod timer;

pub use logger::{LoggerMiddleware, LoggerOptions, RequestLoggerExt};
pub use response_cache::{
    CacheStatus, RequestCacheExt, RequestMatcher, ResponseCacheExt, ResponseCacheMiddleware,
    ResponseCacheOptions,
};
pub use timer::{ResponseTimeExt, TimerMiddleware, TimerOptions};
