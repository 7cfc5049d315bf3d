//! Request/response logging stage.

use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::{ClientContext, Request, Response, keys::LOGGER_OPTIONS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::middleware::{Exchange, Middleware, Next};

/// Logger stage options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Also log request headers and body size at `debug`.
    pub detailed_request: bool,
    /// Also log response headers and body at `debug`.
    pub detailed_response: bool,
}

/// Per-request logger overrides.
pub trait RequestLoggerExt {
    /// Replaces the stage defaults for this request.
    fn with_logger_options(self, options: LoggerOptions) -> Self;
    /// Logger options set on this request.
    fn logger_options(&self) -> Option<&LoggerOptions>;
}

impl RequestLoggerExt for Request {
    fn with_logger_options(mut self, options: LoggerOptions) -> Self {
        self.items_mut().insert(LOGGER_OPTIONS, options);
        self
    }

    fn logger_options(&self) -> Option<&LoggerOptions> {
        self.items().get::<LoggerOptions>(LOGGER_OPTIONS)
    }
}

/// Logs each exchange with its request id.
pub struct LoggerMiddleware {
    next: Next,
    client: Arc<ClientContext>,
    defaults: LoggerOptions,
}

impl LoggerMiddleware {
    /// Wraps `next`; `defaults` apply to requests without their own options.
    pub fn new(next: Next, client: Arc<ClientContext>, defaults: LoggerOptions) -> Self {
        Self {
            next,
            client,
            defaults,
        }
    }
}

#[async_trait]
impl Middleware for LoggerMiddleware {
    async fn invoke(&self, exchange: Exchange<'_>) -> Result<Response> {
        let request = exchange.request();
        let options = request.logger_options().copied().unwrap_or(self.defaults);
        let client = self.client.identifier();
        let request_id = request.id();
        let method = request.method().clone();
        let url = request.uri().to_owned();

        info!(client, %request_id, %method, %url, "sending request");
        if options.detailed_request {
            debug!(
                client,
                %request_id,
                headers = ?request.headers(),
                body = request.body().is_some(),
                "request details"
            );
        }

        match self.next.invoke(exchange).await {
            Ok(response) => {
                info!(
                    client,
                    %request_id,
                    %method,
                    %url,
                    status = response.status().as_u16(),
                    "received response"
                );
                if options.detailed_response {
                    debug!(
                        client,
                        %request_id,
                        headers = ?response.headers(),
                        body = %String::from_utf8_lossy(response.body()),
                        "response details"
                    );
                }
                Ok(response)
            }
            Err(err) => {
                warn!(client, %request_id, %method, %url, error = %err, "request failed");
                Err(err)
            }
        }
    }
}
