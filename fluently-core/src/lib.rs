#![warn(missing_docs)]
//! # fluently-core
//!
//! Protocol-level building blocks of the fluently HTTP client.
//!
//! This crate has no I/O of its own. It defines the data that flows through
//! the middleware pipeline and the request fingerprint that addresses cached
//! responses:
//!
//! - [`Headers`] - ordered multi-value header collection with hash-string output
//! - [`Items`] - per-exchange heterogeneous bag shared by request and response
//! - [`Request`] / [`Response`] - the exchange itself
//! - [`CachedResponse`] - owned, serializable response snapshot stored by caches
//! - [`RequestHasher`] - fingerprint generation
//! - [`ClientContext`] - read-only per-client configuration handed to stages

pub mod client;
pub mod fingerprint;
pub mod headers;
pub mod items;
pub mod request;
pub mod response;
pub mod uri;

pub use client::ClientContext;
pub use fingerprint::{
    HeaderPredicate, RequestHashExt, RequestHasher, RequestHashingOptions, UriManipulation,
};
pub use headers::{HeaderError, Headers};
pub use items::{Items, keys};
pub use request::{Body, Request};
pub use response::{CachedResponse, InvalidSnapshot, RequestEcho, Response};

#[doc(hidden)]
pub use http::{Method, StatusCode};
#[doc(hidden)]
pub use tokio_util::sync::CancellationToken;
