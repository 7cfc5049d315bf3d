//! Terminal send over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use fluently::{Error, Result, Transport};
use fluently_core::{Headers, Request, Response};
use tracing::{debug, trace};

/// [`Transport`] sending requests with a [`reqwest::Client`].
///
/// The response body is buffered in full, so it can be logged and cached by
/// the stages it flows back through.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Transport over `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Fails requests that do not complete within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn to_reqwest(&self, request: &Request) -> Result<reqwest::Request> {
        let mut headers = request.headers().to_header_map()?;
        let mut builder = self.client.request(request.method().clone(), request.uri());

        if let Some(body) = request.body() {
            if let Some(content_type) = body.content_type()
                && !headers.contains_key(http::header::CONTENT_TYPE)
            {
                headers.insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static(content_type),
                );
            }
            builder = builder.body(body.to_bytes()?);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.headers(headers).build().map_err(Error::transport)
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let outgoing = self.to_reqwest(&request)?;
        trace!(request_id = %request.id(), url = %outgoing.url(), "reqwest send");

        let response = self
            .client
            .execute(outgoing)
            .await
            .map_err(Error::transport)?;

        let status = response.status();
        let headers = Headers::from_header_map(response.headers());
        let body = response.bytes().await.map_err(Error::transport)?;
        debug!(
            request_id = %request.id(),
            status = status.as_u16(),
            bytes = body.len(),
            "reqwest response"
        );

        Ok(Response::new(status).with_headers(headers).with_body(body))
    }
}
