//! HTTP client entry point.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use fluently_backend::ResponseCacheService;
use fluently_core::{
    Body, ClientContext, Headers, Method, Request, RequestHashExt, RequestHashingOptions, Response,
    uri,
};
use serde::Serialize;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{BoxError, Error, Result};
use crate::middleware::{MiddlewareDescriptor, Next};
use crate::pipeline::{MiddlewareRunner, PipelineBuilder};
use crate::stages::{
    LoggerMiddleware, LoggerOptions, RequestCacheExt, RequestLoggerExt, ResponseCacheMiddleware,
    ResponseCacheOptions, TimerMiddleware, TimerOptions,
};
use crate::transport::{Dispatch, Transport};

const DEFAULT_IDENTIFIER: &str = "default";

/// HTTP client sending every request through its middleware pipeline.
///
/// The pipeline is built once, in [`FluentClientBuilder::build`]; sending is
/// `&self` and safe from many tasks at once.
///
/// ```no_run
/// # async fn run(transport: impl fluently::Transport + 'static) -> fluently::Result<()> {
/// use fluently::{FluentClient, LoggerOptions, TimerOptions};
///
/// let client = FluentClient::builder()
///     .identifier("heroes")
///     .base_url("https://sketch7.com/api")
///     .header("User-Agent", "fluently")
///     .use_logging(LoggerOptions::default())
///     .use_timer(TimerOptions::default())
///     .transport(transport)
///     .build()?;
///
/// let hero = client.get("/heroes/azmodan").send().await?;
/// # Ok(())
/// # }
/// ```
pub struct FluentClient {
    context: Arc<ClientContext>,
    runner: MiddlewareRunner,
    transport: Arc<dyn Transport>,
}

impl FluentClient {
    /// Starts a new client builder.
    pub fn builder() -> FluentClientBuilder {
        FluentClientBuilder::default()
    }

    /// Read-only context the pipeline was built with.
    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// The pipeline runner.
    pub fn runner(&self) -> &MiddlewareRunner {
        &self.runner
    }

    /// Starts a request.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Request::new(method, uri))
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a `PUT` request.
    pub fn put(&self, uri: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a `DELETE` request.
    pub fn delete(&self, uri: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Sends a request through the pipeline.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let dispatch = Dispatch {
            client: &self.context,
            transport: self.transport.as_ref(),
        };
        self.runner.run(request, &dispatch).await
    }
}

impl fmt::Debug for FluentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluentClient")
            .field("context", &self.context)
            .field("pipeline", self.runner.pipeline())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FluentClient`].
///
/// Middleware runs in registration order on the way in and in reverse order
/// on the way out.
pub struct FluentClientBuilder {
    identifier: SmolStr,
    base_url: Option<String>,
    headers: Headers,
    hashing: RequestHashingOptions,
    cache_defaults: ResponseCacheOptions,
    pipeline: PipelineBuilder,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for FluentClientBuilder {
    fn default() -> Self {
        Self {
            identifier: SmolStr::new_static(DEFAULT_IDENTIFIER),
            base_url: None,
            headers: Headers::new(),
            hashing: RequestHashingOptions::default(),
            cache_defaults: ResponseCacheOptions::default(),
            pipeline: PipelineBuilder::new(),
            transport: None,
        }
    }
}

impl FluentClientBuilder {
    /// Builder preloaded from `config`.
    ///
    /// Registers the logger and timer stages when their sections are present
    /// and keeps the response cache section as defaults for a later
    /// [`use_response_caching`](Self::use_response_caching).
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::default()
            .identifier(config.identifier.as_str())
            .headers(config.default_headers());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.as_str());
        }
        if let Some(logger) = config.logger {
            builder = builder.use_logging(logger);
        }
        if let Some(timer) = config.timer {
            builder = builder.use_timer(timer);
        }
        if let Some(cache) = config.response_cache {
            builder.cache_defaults = cache.into();
        }
        Ok(builder)
    }

    /// Sets the client identifier.
    pub fn identifier(mut self, identifier: impl Into<SmolStr>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Sets the base URL relative request URLs resolve against.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a default header, replacing previous values.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, [value.into()]);
        self
    }

    /// Adds default headers; fails on names already registered.
    pub fn add_headers(mut self, headers: &Headers) -> Result<Self> {
        for (name, values) in headers.iter() {
            self.headers.add(name, values.iter().cloned())?;
        }
        Ok(self)
    }

    /// Replaces the default headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets client-wide hashing options.
    pub fn hashing(mut self, options: RequestHashingOptions) -> Self {
        self.hashing = options;
        self
    }

    /// Sets the transport performing the terminal send.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Registers a custom stage.
    pub fn use_middleware<F>(mut self, name: impl Into<SmolStr>, factory: F) -> Self
    where
        F: Fn(Next, &Arc<ClientContext>) -> Result<Next, BoxError> + Send + Sync + 'static,
    {
        self.pipeline.add(name, factory);
        self
    }

    /// Registers a prepared descriptor.
    pub fn use_descriptor(mut self, descriptor: MiddlewareDescriptor) -> Self {
        self.pipeline.add_descriptor(descriptor);
        self
    }

    /// Registers the logger stage.
    pub fn use_logging(self, options: LoggerOptions) -> Self {
        self.use_middleware("logger", move |next, client| {
            Ok(Arc::new(LoggerMiddleware::new(next, client.clone(), options)))
        })
    }

    /// Registers the timer stage.
    pub fn use_timer(self, options: TimerOptions) -> Self {
        self.use_middleware("timer", move |next, client| {
            Ok(Arc::new(TimerMiddleware::new(next, client.clone(), options)))
        })
    }

    /// Registers the response cache stage with the builder's cache defaults.
    pub fn use_response_caching<S>(self, service: S) -> Self
    where
        S: ResponseCacheService + 'static,
    {
        let defaults = self.cache_defaults.clone();
        self.use_response_caching_with(service, defaults)
    }

    /// Registers the response cache stage with explicit defaults.
    pub fn use_response_caching_with<S>(self, service: S, defaults: ResponseCacheOptions) -> Self
    where
        S: ResponseCacheService + 'static,
    {
        let service: Arc<dyn ResponseCacheService> = Arc::new(service);
        self.use_middleware("response-cache", move |next, client| {
            Ok(Arc::new(ResponseCacheMiddleware::new(
                next,
                client.clone(),
                service.clone(),
                defaults.clone(),
            )))
        })
    }

    /// Validates the configuration and builds the pipeline.
    pub fn build(self) -> Result<FluentClient> {
        let transport = self
            .transport
            .ok_or_else(|| Error::InvalidConfig("a transport is required".into()))?;
        if let Some(base_url) = &self.base_url
            && !uri::is_absolute(base_url)
        {
            return Err(Error::InvalidConfig(format!(
                "base url `{base_url}` must be absolute"
            )));
        }

        let mut context = ClientContext::new(self.identifier)
            .with_default_headers(self.headers)
            .with_hashing(self.hashing);
        if let Some(base_url) = self.base_url {
            context = context.with_base_url(base_url);
        }
        let context = Arc::new(context);
        let pipeline = self.pipeline.build(context.clone())?;

        Ok(FluentClient {
            context,
            runner: MiddlewareRunner::new(pipeline),
            transport,
        })
    }
}

impl fmt::Debug for FluentClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FluentClientBuilder")
            .field("identifier", &self.identifier)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("pipeline", &self.pipeline)
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds one request for a [`FluentClient`].
///
/// Errors raised while building (a body that fails to serialize) are kept
/// and reported by [`build`](Self::build) or [`send`](Self::send).
pub struct RequestBuilder<'c> {
    client: &'c FluentClient,
    request: Request,
    error: Option<Error>,
}

impl<'c> RequestBuilder<'c> {
    fn new(client: &'c FluentClient, request: Request) -> Self {
        Self {
            client,
            request,
            error: None,
        }
    }

    /// Sets a header, replacing previous values.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers_mut().set(name, [value.into()]);
        self
    }

    /// Sets a multi-value header, replacing previous values.
    pub fn header_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.request.headers_mut().set(name, values);
        self
    }

    /// Serializes `value` as a structured JSON body.
    pub fn json<T>(mut self, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match Body::json(value) {
            Ok(body) => {
                self.request = self.request.with_body(body);
                if !self.request.headers().contains("Content-Type") {
                    self.request
                        .headers_mut()
                        .set("Content-Type", ["application/json"]);
                }
            }
            Err(err) => self.error = Some(err.into()),
        }
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.request = self.request.with_body(body);
        self
    }

    /// Stores a custom item for stages to read.
    pub fn item<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.request.items_mut().insert(key, value);
        self
    }

    /// Overrides hashing options for this request.
    pub fn hashing(mut self, options: RequestHashingOptions) -> Self {
        self.request = self.request.with_hashing_options(options);
        self
    }

    /// Overrides response cache options for this request.
    pub fn cache(mut self, options: ResponseCacheOptions) -> Self {
        self.request = self.request.with_response_cache_options(options);
        self
    }

    /// Overrides logger options for this request.
    pub fn logging(mut self, options: LoggerOptions) -> Self {
        self.request = self.request.with_logger_options(options);
        self
    }

    /// Attaches a cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.request = self.request.with_cancellation(token);
        self
    }

    /// Validates and returns the request.
    pub fn build(self) -> Result<Request> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let target = self.request.uri();
        if target.trim().is_empty() {
            return Err(Error::InvalidRequest("url must not be empty".into()));
        }
        if !uri::is_absolute(target) && self.client.context.base_url().is_none() {
            return Err(Error::InvalidRequest(format!(
                "relative url `{target}` requires a base url"
            )));
        }
        Ok(self.request)
    }

    /// Validates and sends the request.
    pub async fn send(self) -> Result<Response> {
        let client = self.client;
        let request = self.build()?;
        client.send(request).await
    }
}

impl fmt::Debug for RequestBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("request", &self.request)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
