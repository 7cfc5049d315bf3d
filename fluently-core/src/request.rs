//! Outgoing request type.

use bytes::Bytes;
use http::Method;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{Headers, Items};

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Opaque bytes, sent as-is and never part of a fingerprint.
    Raw(Bytes),
    /// Structured value, serialized as JSON on the wire.
    Json(Value),
}

impl Body {
    /// Builds a structured body from any serializable value.
    pub fn json<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_value(value).map(Body::Json)
    }

    /// Returns `true` for [`Body::Json`].
    pub fn is_structured(&self) -> bool {
        matches!(self, Body::Json(_))
    }

    /// Default `Content-Type` for the body, if it implies one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Raw(_) => None,
            Body::Json(_) => Some("application/json"),
        }
    }

    /// Wire representation of the body.
    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        match self {
            Body::Raw(bytes) => Ok(bytes.clone()),
            Body::Json(value) => serde_json::to_vec(value).map(Bytes::from),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Raw(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// A request travelling through the middleware pipeline.
///
/// The URL may be relative; it is resolved against the client base URL by the
/// fingerprint generator and by the terminal send. The [`Items`] bag and the
/// cancellation token are scoped to this one exchange.
#[derive(Debug)]
pub struct Request {
    id: Uuid,
    method: Method,
    uri: String,
    headers: Headers,
    body: Option<Body>,
    items: Items,
    cancellation: CancellationToken,
}

impl Request {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            uri: uri.into(),
            headers: Headers::new(),
            body: None,
            items: Items::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Replaces the header collection.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a single header value, overwriting any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, [value.into()]);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attaches a cancellation token observed by the terminal send and cache I/O.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Unique id of this request, used for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL as given, possibly relative.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Replaces the URL.
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
    }

    /// Request-specific headers (client defaults are not merged in).
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Request body.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Per-exchange items bag.
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Mutable items bag.
    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.items
    }

    /// Moves the items bag out, leaving an empty one behind.
    pub fn take_items(&mut self) -> Items {
        std::mem::take(&mut self.items)
    }

    /// Cancellation signal of this exchange.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the exchange has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_is_structured() {
        let body = Body::json(&json!({ "name": "azmodan" })).unwrap();
        assert!(body.is_structured());
        assert_eq!(body.content_type(), Some("application/json"));
        assert_eq!(body.to_bytes().unwrap(), Bytes::from_static(br#"{"name":"azmodan"}"#));
    }

    #[test]
    fn take_items_leaves_empty_bag() {
        let mut request = Request::new(Method::GET, "/heroes");
        request.items_mut().insert("key", 1_u8);

        let items = request.take_items();
        assert_eq!(items.get::<u8>("key"), Some(&1));
        assert!(request.items().is_empty());
    }

    #[test]
    fn requests_get_distinct_ids() {
        let a = Request::new(Method::GET, "/a");
        let b = Request::new(Method::GET, "/a");
        assert_ne!(a.id(), b.id());
    }
}
