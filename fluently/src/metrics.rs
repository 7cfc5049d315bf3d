//! Metrics declaration and recording.
//!
//! With the `metrics` feature enabled, the built-in stages report through the
//! [`metrics`](https://docs.rs/metrics) facade; without it every recorder
//! below is an empty inline function.

use std::time::Duration;

use crate::stages::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "fluently_cache_hit_total",
            "Total number of response cache hits."
        );
        "fluently_cache_hit_total"
    };
    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "fluently_cache_miss_total",
            "Total number of response cache misses."
        );
        "fluently_cache_miss_total"
    };
    /// Track number of requests the response cache skipped.
    pub static ref CACHE_IGNORED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "fluently_cache_ignored_total",
            "Total number of requests that bypassed the response cache."
        );
        "fluently_cache_ignored_total"
    };
    /// Histogram of exchange duration measured by the timer stage.
    pub static ref REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "fluently_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of HTTP exchanges in seconds."
        );
        "fluently_request_duration_seconds"
    };
}

/// Counts one response cache decision.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_status(client: &str, status: CacheStatus) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Ignored => *CACHE_IGNORED_COUNTER,
    };
    metrics::counter!(counter, "client" => client.to_owned()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_status(_client: &str, _status: CacheStatus) {}

/// Records the duration of one exchange.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_request_duration(client: &str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "error" };
    metrics::histogram!(
        *REQUEST_DURATION,
        "client" => client.to_owned(),
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_request_duration(_client: &str, _success: bool, _duration: Duration) {}
