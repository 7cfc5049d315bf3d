//! Exchange timing stage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fluently_core::{ClientContext, Response, keys::TIME_TAKEN};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::metrics;
use crate::middleware::{Exchange, Middleware, Next};

const DEFAULT_WARN_THRESHOLD: Duration = Duration::from_millis(400);

/// Timer stage options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerOptions {
    /// Exchanges slower than this are logged at `warn`.
    #[serde(with = "humantime_serde")]
    pub warn_threshold: Duration,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            warn_threshold: DEFAULT_WARN_THRESHOLD,
        }
    }
}

/// Typed access to the measured exchange duration.
pub trait ResponseTimeExt {
    /// Time spent inside the timer stage, if it ran.
    fn time_taken(&self) -> Option<Duration>;
}

impl ResponseTimeExt for Response {
    fn time_taken(&self) -> Option<Duration> {
        self.items().get::<Duration>(TIME_TAKEN).copied()
    }
}

/// Measures everything nested inside it.
pub struct TimerMiddleware {
    next: Next,
    client: Arc<ClientContext>,
    options: TimerOptions,
}

impl TimerMiddleware {
    /// Wraps `next`.
    pub fn new(next: Next, client: Arc<ClientContext>, options: TimerOptions) -> Self {
        Self {
            next,
            client,
            options,
        }
    }
}

#[async_trait]
impl Middleware for TimerMiddleware {
    async fn invoke(&self, exchange: Exchange<'_>) -> Result<Response> {
        let client = self.client.identifier();
        let request_id = exchange.request().id();
        let start = Instant::now();

        let result = self.next.invoke(exchange).await;
        let elapsed = start.elapsed();
        metrics::record_request_duration(client, result.is_ok(), elapsed);

        if elapsed > self.options.warn_threshold {
            warn!(
                client,
                %request_id,
                elapsed = ?elapsed,
                threshold = ?self.options.warn_threshold,
                "slow request"
            );
        } else {
            debug!(client, %request_id, elapsed = ?elapsed, "request timed");
        }

        let mut response = result?;
        response.items_mut().insert(TIME_TAKEN, elapsed);
        Ok(response)
    }
}
