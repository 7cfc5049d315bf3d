//! Pipeline construction and execution.
//!
//! Descriptors are registered outermost first. [`PipelineBuilder::build`]
//! walks them last to first, handing each factory the stage built before it,
//! so the resulting chain runs as an onion: every stage enters in
//! registration order and exits in reverse, with the implicit terminal stage
//! in the middle.

use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::{ClientContext, Request, Response};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::error::{BoxError, Error, Result};
use crate::middleware::{Exchange, Middleware, MiddlewareDescriptor, Next, TerminalAction};

/// Innermost stage: performs the terminal action and never delegates.
///
/// The request's items bag is moved onto the response, so state recorded on
/// the way in is visible on the way out.
struct TerminalStage;

#[async_trait]
impl Middleware for TerminalStage {
    async fn invoke(&self, exchange: Exchange<'_>) -> Result<Response> {
        let (mut request, action) = exchange.into_parts();
        let cancellation = request.cancellation().clone();
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let items = request.take_items();
        trace!(request_id = %request.id(), "terminal send");
        let mut response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(Error::Cancelled),
            response = action.send(request) => response?,
        };
        response.set_items(items);
        Ok(response)
    }
}

/// Ordered stage registrations for one client.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    descriptors: Vec<MiddlewareDescriptor>,
}

impl PipelineBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage built by `factory`; earlier stages wrap later ones.
    pub fn add<F>(&mut self, name: impl Into<SmolStr>, factory: F) -> &mut Self
    where
        F: Fn(Next, &Arc<ClientContext>) -> Result<Next, BoxError> + Send + Sync + 'static,
    {
        self.descriptors
            .push(MiddlewareDescriptor::from_fn(name, factory));
        self
    }

    /// Appends a prepared descriptor.
    pub fn add_descriptor(&mut self, descriptor: MiddlewareDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registered descriptors, outermost first.
    pub fn descriptors(&self) -> &[MiddlewareDescriptor] {
        &self.descriptors
    }

    /// Builds the chain.
    ///
    /// Any failing factory fails the whole build with
    /// [`Error::InvalidMiddleware`]; no partial pipeline is returned.
    pub fn build(&self, client: Arc<ClientContext>) -> Result<Pipeline> {
        let mut next: Next = Arc::new(TerminalStage);
        for (index, descriptor) in self.descriptors.iter().enumerate().rev() {
            next = descriptor
                .create(next, &client)
                .map_err(|reason| Error::InvalidMiddleware {
                    index,
                    name: descriptor.name().to_owned(),
                    reason: reason.to_string(),
                })?;
        }

        let stages: Vec<SmolStr> = self
            .descriptors
            .iter()
            .map(|descriptor| SmolStr::new(descriptor.name()))
            .collect();
        debug!(client = client.identifier(), ?stages, "pipeline built");

        Ok(Pipeline {
            entry: next,
            stages,
            client,
        })
    }
}

/// A built, immutable chain of stages.
pub struct Pipeline {
    entry: Next,
    stages: Vec<SmolStr>,
    client: Arc<ClientContext>,
}

impl Pipeline {
    /// Stage names, outermost first (the terminal stage is implicit).
    pub fn stages(&self) -> &[SmolStr] {
        &self.stages
    }

    /// Client context the stages were built with.
    pub fn client(&self) -> &Arc<ClientContext> {
        &self.client
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("client", &self.client.identifier())
            .field("stages", &self.stages)
            .finish()
    }
}

/// Executes a [`Pipeline`] for individual exchanges.
///
/// Cheap to clone and safe to share between concurrent calls.
#[derive(Debug, Clone)]
pub struct MiddlewareRunner {
    pipeline: Arc<Pipeline>,
}

impl MiddlewareRunner {
    /// Wraps a built pipeline.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// The pipeline being run.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs `request` through the chain, with `action` as the terminal send.
    pub async fn run(&self, request: Request, action: &dyn TerminalAction) -> Result<Response> {
        self.pipeline
            .entry
            .invoke(Exchange::new(request, action))
            .await
    }
}

impl From<Pipeline> for MiddlewareRunner {
    fn from(pipeline: Pipeline) -> Self {
        Self::new(pipeline)
    }
}
