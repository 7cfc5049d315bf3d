//! Response type and its cacheable snapshot.

use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{Headers, Items};

/// Echo of the request that produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEcho {
    /// HTTP method name.
    pub method: String,
    /// Resolved absolute URL.
    pub url: String,
    /// Headers as sent (client defaults merged in).
    pub headers: Headers,
}

/// A response travelling back out through the middleware pipeline.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    reason: String,
    headers: Headers,
    body: Bytes,
    request: Option<RequestEcho>,
    items: Items,
}

impl Response {
    /// Creates an empty response with the canonical reason phrase.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            headers: Headers::new(),
            body: Bytes::new(),
            request: None,
            items: Items::new(),
        }
    }

    /// Overrides the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets a single header value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, [value.into()]);
        self
    }

    /// Replaces the header collection.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Records the originating request.
    pub fn with_request(mut self, request: RequestEcho) -> Self {
        self.request = Some(request);
        self
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Value of the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get_first("Content-Type")
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body)
    }

    /// Originating request, when known.
    pub fn request(&self) -> Option<&RequestEcho> {
        self.request.as_ref()
    }

    /// Items bag handed over from the request.
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Mutable items bag.
    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.items
    }

    /// Replaces the items bag.
    pub fn set_items(&mut self, items: Items) {
        self.items = items;
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Snapshot could not be turned back into a [`Response`].
#[derive(Debug, Error)]
#[error("cached status code {0} is not a valid HTTP status")]
pub struct InvalidSnapshot(pub u16);

/// Serializable snapshot of a [`Response`], stored by cache tiers.
///
/// The snapshot owns all of its data, so every clone is independent: mutating
/// a response rebuilt from one copy never affects another copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Fingerprint the snapshot is stored under.
    pub hash: String,
    /// Numeric status code, rejected on deserialization unless it is a
    /// valid HTTP status.
    #[serde(deserialize_with = "valid_status")]
    pub status: u16,
    /// Reason phrase.
    pub reason_phrase: String,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub content: Bytes,
    /// `Content-Type` at capture time.
    pub content_type: Option<String>,
    /// Originating request.
    pub request: Option<RequestEcho>,
}

impl CachedResponse {
    /// Captures a snapshot of `response` under `hash`.
    pub fn capture(hash: impl Into<String>, response: &Response) -> Self {
        Self {
            hash: hash.into(),
            status: response.status.as_u16(),
            reason_phrase: response.reason.clone(),
            headers: response.headers.clone(),
            content: response.body.clone(),
            content_type: response.content_type().map(str::to_owned),
            request: response.request.clone(),
        }
    }

    /// Rebuilds a response carrying `items`.
    pub fn into_response(self, items: Items) -> Result<Response, InvalidSnapshot> {
        let status = StatusCode::from_u16(self.status).map_err(|_| InvalidSnapshot(self.status))?;
        Ok(Response {
            status,
            reason: self.reason_phrase,
            headers: self.headers,
            body: self.content,
            request: self.request,
            items,
        })
    }
}

fn valid_status<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let status = u16::deserialize(deserializer)?;
    StatusCode::from_u16(status)
        .map(|_| status)
        .map_err(|_| serde::de::Error::custom(InvalidSnapshot(status)))
}

impl TryFrom<CachedResponse> for Response {
    type Error = InvalidSnapshot;

    fn try_from(snapshot: CachedResponse) -> Result<Self, Self::Error> {
        snapshot.into_response(Items::new())
    }
}
