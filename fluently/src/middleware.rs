//! Middleware contract.
//!
//! A stage receives an [`Exchange`] (the request plus the terminal action of
//! this call) and either short-circuits with its own response or delegates to
//! the stage it wraps:
//!
//! ```
//! use async_trait::async_trait;
//! use fluently::{Exchange, Middleware, Next, Response, Result};
//!
//! struct Tag {
//!     next: Next,
//! }
//!
//! #[async_trait]
//! impl Middleware for Tag {
//!     async fn invoke(&self, mut exchange: Exchange<'_>) -> Result<Response> {
//!         exchange.request_mut().headers_mut().set("X-Tag", ["fluently"]);
//!         let mut response = self.next.invoke(exchange).await?;
//!         response.headers_mut().set("X-Tagged", ["true"]);
//!         Ok(response)
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::{ClientContext, Request, Response};
use smol_str::SmolStr;

use crate::error::{BoxError, Result};

/// Handle to the stage a middleware wraps.
pub type Next = Arc<dyn Middleware>;

/// One link of the pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles one exchange.
    async fn invoke(&self, exchange: Exchange<'_>) -> Result<Response>;
}

/// The network send performed by the innermost stage, at most once per exchange.
///
/// Implemented for closures returning a `'static` future:
///
/// ```
/// use fluently::{Request, Response, StatusCode, TerminalAction};
///
/// fn assert_action(_: &dyn TerminalAction) {}
///
/// assert_action(&|_request: Request| async {
///     Ok::<_, fluently::Error>(Response::new(StatusCode::NO_CONTENT))
/// });
/// ```
#[async_trait]
pub trait TerminalAction: Send + Sync {
    /// Sends the request.
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<F, Fut> TerminalAction for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn send(&self, request: Request) -> Result<Response> {
        (self)(request).await
    }
}

/// Per-call context travelling through the pipeline.
pub struct Exchange<'a> {
    request: Request,
    action: &'a dyn TerminalAction,
}

impl<'a> Exchange<'a> {
    /// Pairs `request` with the terminal action of this call.
    pub fn new(request: Request, action: &'a dyn TerminalAction) -> Self {
        Self { request, action }
    }

    /// The request being sent.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the request being sent.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Splits the exchange; used by the terminal stage.
    pub fn into_parts(self) -> (Request, &'a dyn TerminalAction) {
        (self.request, self.action)
    }
}

impl fmt::Debug for Exchange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Builds a stage around the stage it wraps.
///
/// Factories receive `next`, the read-only [`ClientContext`] and whatever
/// arguments they captured at registration. Implemented for closures:
///
/// ```
/// use std::sync::Arc;
/// use fluently::{BoxError, ClientContext, MiddlewareFactory, Next};
///
/// fn assert_factory(_: &dyn MiddlewareFactory) {}
///
/// assert_factory(&|next: Next, _client: &Arc<ClientContext>| Ok::<_, BoxError>(next));
/// ```
pub trait MiddlewareFactory: Send + Sync {
    /// Creates the stage.
    fn create(&self, next: Next, client: &Arc<ClientContext>) -> Result<Next, BoxError>;
}

impl<F> MiddlewareFactory for F
where
    F: Fn(Next, &Arc<ClientContext>) -> Result<Next, BoxError> + Send + Sync,
{
    fn create(&self, next: Next, client: &Arc<ClientContext>) -> Result<Next, BoxError> {
        (self)(next, client)
    }
}

/// Named stage registration; index 0 in a pipeline is outermost.
#[derive(Clone)]
pub struct MiddlewareDescriptor {
    name: SmolStr,
    factory: Arc<dyn MiddlewareFactory>,
}

impl MiddlewareDescriptor {
    /// Descriptor called `name` built by `factory`.
    pub fn new<F>(name: impl Into<SmolStr>, factory: F) -> Self
    where
        F: MiddlewareFactory + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// Descriptor built by a closure.
    pub fn from_fn<F>(name: impl Into<SmolStr>, factory: F) -> Self
    where
        F: Fn(Next, &Arc<ClientContext>) -> Result<Next, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, factory)
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn create(&self, next: Next, client: &Arc<ClientContext>) -> Result<Next, BoxError> {
        self.factory.create(next, client)
    }
}

impl fmt::Debug for MiddlewareDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MiddlewareDescriptor").field(&self.name).finish()
    }
}
