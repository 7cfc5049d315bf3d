//! Read-only per-client context shared by every pipeline stage.

use smol_str::SmolStr;

use crate::{Headers, RequestHashingOptions};

/// Immutable client configuration produced when a client is built.
///
/// Stages receive it at construction time; it never changes afterwards, so it
/// can be shared freely between concurrent exchanges.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    identifier: SmolStr,
    base_url: Option<String>,
    default_headers: Headers,
    hashing: RequestHashingOptions,
}

impl ClientContext {
    /// Context for the client named `identifier`.
    pub fn new(identifier: impl Into<SmolStr>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// Sets the base URL relative request URLs resolve against.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the headers sent with every request.
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// Sets the client-wide hashing options.
    pub fn with_hashing(mut self, hashing: RequestHashingOptions) -> Self {
        self.hashing = hashing;
        self
    }

    /// Client identifier, used for log and metric naming.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Base URL, if configured.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Client-wide hashing options.
    pub fn hashing(&self) -> &RequestHashingOptions {
        &self.hashing
    }
}
