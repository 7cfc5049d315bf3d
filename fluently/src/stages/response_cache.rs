//! Response caching stage.
//!
//! For every exchange the stage resolves its effective options, then:
//!
//! - **ignored** (flagged, or rejected by the matcher): delegates without
//!   touching the cache;
//! - **read** (unless write-only): fingerprints the request and returns the
//!   cached response on a hit, without invoking the rest of the pipeline;
//! - **miss or write-only**: delegates, stores the live response under the
//!   same fingerprint, and returns it.
//!
//! The outcome is recorded on the response items bag as a [`CacheStatus`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fluently_backend::{BackendError, FormatError, ResponseCacheService};
use fluently_core::{
    CachedResponse, ClientContext, Request, RequestHasher, Response,
    keys::{CACHE_OPTIONS, CACHE_STATUS},
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics;
use crate::middleware::{Exchange, Middleware, Next};

/// Predicate deciding whether a request takes part in caching.
pub type RequestMatcher = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Outcome of the response cache stage for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Served from the cache; the rest of the pipeline did not run.
    Hit,
    /// Fetched downstream and stored.
    Miss,
    /// The cache was not consulted.
    Ignored,
}

impl CacheStatus {
    /// Lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Ignored => "ignored",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response cache options, used as stage defaults or per request.
///
/// When set on a request, every option the request sets takes precedence
/// over the stage defaults; options left unset fall back to the defaults.
#[derive(Clone, Default)]
pub struct ResponseCacheOptions {
    ignored: Option<bool>,
    write_only: Option<bool>,
    matcher: Option<RequestMatcher>,
}

impl ResponseCacheOptions {
    /// Options with caching on, reads enabled and no matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the cache entirely.
    pub fn ignored(mut self, ignored: bool) -> Self {
        self.ignored = Some(ignored);
        self
    }

    /// Never reads from the cache but still stores fresh responses.
    pub fn write_only(mut self, write_only: bool) -> Self {
        self.write_only = Some(write_only);
        self
    }

    /// Only requests accepted by `matcher` are cached.
    pub fn matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Returns `true` if the cache is skipped.
    pub fn is_ignored(&self) -> bool {
        self.ignored.unwrap_or(false)
    }

    /// Returns `true` if cache reads are skipped.
    pub fn is_write_only(&self) -> bool {
        self.write_only.unwrap_or(false)
    }

    fn resolve(request: Option<&Self>, defaults: &Self) -> Self {
        match request {
            Some(request) => Self {
                ignored: request.ignored.or(defaults.ignored),
                write_only: request.write_only.or(defaults.write_only),
                matcher: request.matcher.clone().or_else(|| defaults.matcher.clone()),
            },
            None => defaults.clone(),
        }
    }

    fn matches(&self, request: &Request) -> bool {
        self.matcher.as_ref().is_none_or(|matcher| matcher(request))
    }
}

impl fmt::Debug for ResponseCacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCacheOptions")
            .field("ignored", &self.ignored)
            .field("write_only", &self.write_only)
            .field("matcher", &self.matcher.is_some())
            .finish()
    }
}

/// Per-request cache overrides.
pub trait RequestCacheExt {
    /// Sets the cache options of this request.
    fn with_response_cache_options(self, options: ResponseCacheOptions) -> Self;
    /// Cache options set on this request.
    fn response_cache_options(&self) -> Option<&ResponseCacheOptions>;
}

impl RequestCacheExt for Request {
    fn with_response_cache_options(mut self, options: ResponseCacheOptions) -> Self {
        self.items_mut().insert(CACHE_OPTIONS, options);
        self
    }

    fn response_cache_options(&self) -> Option<&ResponseCacheOptions> {
        self.items().get::<ResponseCacheOptions>(CACHE_OPTIONS)
    }
}

/// Typed access to the cache outcome of a response.
pub trait ResponseCacheExt {
    /// How the response cache stage handled this exchange, if it ran.
    fn cache_status(&self) -> Option<CacheStatus>;
}

impl ResponseCacheExt for Response {
    fn cache_status(&self) -> Option<CacheStatus> {
        self.items().get::<CacheStatus>(CACHE_STATUS).copied()
    }
}

/// Serves repeated requests from a [`ResponseCacheService`].
pub struct ResponseCacheMiddleware {
    next: Next,
    client: Arc<ClientContext>,
    service: Arc<dyn ResponseCacheService>,
    defaults: ResponseCacheOptions,
}

impl ResponseCacheMiddleware {
    /// Wraps `next`, caching through `service` with `defaults` as options.
    pub fn new(
        next: Next,
        client: Arc<ClientContext>,
        service: Arc<dyn ResponseCacheService>,
        defaults: ResponseCacheOptions,
    ) -> Self {
        Self {
            next,
            client,
            service,
            defaults,
        }
    }

    fn finish(&self, mut response: Response, status: CacheStatus) -> Response {
        metrics::record_cache_status(self.client.identifier(), status);
        response.items_mut().insert(CACHE_STATUS, status);
        response
    }
}

#[async_trait]
impl Middleware for ResponseCacheMiddleware {
    async fn invoke(&self, mut exchange: Exchange<'_>) -> Result<Response> {
        let request = exchange.request();
        let options =
            ResponseCacheOptions::resolve(request.response_cache_options(), &self.defaults);
        let request_id = request.id();

        if options.is_ignored() || !options.matches(request) {
            debug!(%request_id, "response cache ignored");
            let response = self.next.invoke(exchange).await?;
            return Ok(self.finish(response, CacheStatus::Ignored));
        }

        let hash = RequestHasher::new(&self.client).generate(exchange.request_mut());
        let cancellation = exchange.request().cancellation().clone();

        if !options.is_write_only() {
            let cached = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(Error::Cancelled),
                cached = self.service.get(&hash) => cached?,
            };
            if let Some(entry) = cached {
                debug!(%request_id, %hash, "response cache hit");
                let items = exchange.request_mut().take_items();
                let response = entry
                    .into_response(items)
                    .map_err(|err| BackendError::from(FormatError::Deserialize(Arc::new(err))))?;
                return Ok(self.finish(response, CacheStatus::Hit));
            }
        }

        debug!(
            %request_id,
            %hash,
            write_only = options.is_write_only(),
            "response cache miss"
        );
        let response = self.next.invoke(exchange).await?;

        if cancellation.is_cancelled() {
            debug!(%request_id, "exchange cancelled, cache write skipped");
            return Err(Error::Cancelled);
        }
        self.service
            .set(&hash, CachedResponse::capture(&hash, &response))
            .await?;

        Ok(self.finish(response, CacheStatus::Miss))
    }
}
