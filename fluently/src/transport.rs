//! Terminal send seam.

use std::sync::Arc;

use async_trait::async_trait;
use fluently_core::{ClientContext, Request, RequestEcho, Response, uri};

use crate::error::Result;
use crate::middleware::TerminalAction;

/// Performs the actual HTTP exchange.
///
/// Receives requests with an absolute URL and client default headers already
/// merged in.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and buffers the response body.
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}

/// Terminal action of a client: resolves the URL, merges default headers and
/// hands the request to the transport.
pub(crate) struct Dispatch<'a> {
    pub(crate) client: &'a ClientContext,
    pub(crate) transport: &'a dyn Transport,
}

#[async_trait]
impl TerminalAction for Dispatch<'_> {
    async fn send(&self, mut request: Request) -> Result<Response> {
        let url = uri::resolve(self.client.base_url(), request.uri());
        let headers = self.client.default_headers().merged(request.headers());
        request.set_uri(url.clone());
        *request.headers_mut() = headers.clone();

        let echo = RequestEcho {
            method: request.method().to_string(),
            url,
            headers,
        };
        let response = self.transport.send(request).await?;
        Ok(match response.request() {
            Some(_) => response,
            None => response.with_request(echo),
        })
    }
}
