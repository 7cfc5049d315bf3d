#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Client, client builder and request builder.
pub mod client;

/// Declarative client configuration loaded from YAML.
pub mod config;

/// Error types shared by the pipeline, stages and transports.
pub mod error;

/// Metrics emitted by the built-in stages.
///
/// With the `metrics` feature disabled every recorder is a no-op.
pub mod metrics;

/// The middleware contract and stage descriptors.
pub mod middleware;

/// Pipeline assembly and execution.
pub mod pipeline;

/// Built-in stages: logger, timer and response cache.
pub mod stages;

/// The transport seam performing the actual HTTP exchange.
pub mod transport;

/// Cache tiers and response cache services.
pub use fluently_backend as backend;

pub use client::{FluentClient, FluentClientBuilder, RequestBuilder};
pub use config::ClientConfig;
pub use error::{BoxError, Error, Result};
pub use middleware::{
    Exchange, Middleware, MiddlewareDescriptor, MiddlewareFactory, Next, TerminalAction,
};
pub use pipeline::{MiddlewareRunner, Pipeline, PipelineBuilder};
pub use stages::{
    CacheStatus, LoggerOptions, RequestCacheExt, RequestLoggerExt, ResponseCacheExt,
    ResponseCacheOptions, ResponseTimeExt, TimerOptions,
};
pub use transport::Transport;

pub use fluently_core::{
    Body, CachedResponse, CancellationToken, ClientContext, HeaderError, Headers, Items, Method,
    Request, RequestEcho, RequestHashExt, RequestHasher, RequestHashingOptions, Response,
    StatusCode, keys,
};
