//! Request fingerprints used as response cache keys.
//!
//! A fingerprint is a plain string with a fixed layout:
//!
//! ```text
//! method={M};url={U};headers={H};content={C}
//! ```
//!
//! - `M` is the HTTP method.
//! - `U` is the URL resolved against the client base URL, optionally rewritten
//!   by a [URI manipulation](RequestHashingOptions::with_uri_manipulation).
//! - `H` is [`Headers::to_hash_string`](crate::Headers::to_hash_string) over client defaults merged with the
//!   request headers, minus [excluded](RequestHashingOptions::with_headers_exclude)
//!   pairs.
//! - `C` is the canonical JSON of a structured body, or empty.
//!
//! Two requests that are equivalent for caching purposes produce the same
//! string; that equality is what the response cache relies on.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::items::keys::{HASH_OPTIONS, REQUEST_HASH};
use crate::{Body, ClientContext, Request, uri};

/// Header exclusion predicate, evaluated per `(name, values)` pair.
pub type HeaderPredicate = Arc<dyn Fn(&str, &[String]) -> bool + Send + Sync>;

/// Rewrites the resolved URL before it enters the fingerprint.
pub type UriManipulation = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Options controlling how a request is fingerprinted.
///
/// Client-wide defaults live on [`ClientContext`]; a request may carry its own
/// options in its items bag under [`HASH_OPTIONS`], which then replace the
/// defaults for that request.
#[derive(Clone, Default)]
pub struct RequestHashingOptions {
    header_exclusion: Option<HeaderPredicate>,
    uri_manipulation: Option<UriManipulation>,
    invariant_body: bool,
}

impl RequestHashingOptions {
    /// Options with no exclusions, no URI manipulation and body hashing on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header exclusion, OR-ed with any already registered.
    pub fn with_headers_exclude<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        let combined: HeaderPredicate = match self.header_exclusion.take() {
            Some(existing) => Arc::new(move |name: &str, values: &[String]| {
                existing(name, values) || predicate(name, values)
            }),
            None => Arc::new(predicate),
        };
        self.header_exclusion = Some(combined);
        self
    }

    /// Replaces every registered header exclusion with `predicate`.
    pub fn replace_headers_exclude<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        self.header_exclusion = Some(Arc::new(predicate));
        self
    }

    /// Excludes a header by name (ASCII case-insensitive).
    pub fn exclude_header(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_headers_exclude(move |header, _| header.eq_ignore_ascii_case(&name))
    }

    /// Sets the URL rewrite applied after resolution.
    pub fn with_uri_manipulation<F>(mut self, manipulation: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.uri_manipulation = Some(Arc::new(manipulation));
        self
    }

    /// When `true`, the body never contributes to the fingerprint.
    pub fn with_invariant_body(mut self, invariant: bool) -> Self {
        self.invariant_body = invariant;
        self
    }

    /// Returns `true` if the header pair is excluded from hashing.
    pub fn is_header_excluded(&self, name: &str, values: &[String]) -> bool {
        self.header_exclusion
            .as_ref()
            .is_some_and(|exclude| exclude(name, values))
    }

    /// Returns `true` if bodies are ignored.
    pub fn is_body_invariant(&self) -> bool {
        self.invariant_body
    }
}

impl fmt::Debug for RequestHashingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHashingOptions")
            .field("header_exclusion", &self.header_exclusion.is_some())
            .field("uri_manipulation", &self.uri_manipulation.is_some())
            .field("invariant_body", &self.invariant_body)
            .finish()
    }
}

/// Typed access to hashing state stored on a request's items bag.
pub trait RequestHashExt {
    /// Attaches per-request hashing options.
    fn with_hashing_options(self, options: RequestHashingOptions) -> Self;
    /// Per-request hashing options, if any.
    fn hashing_options(&self) -> Option<&RequestHashingOptions>;
    /// Fingerprint already computed for this exchange, if any.
    fn computed_hash(&self) -> Option<&str>;
}

impl RequestHashExt for Request {
    fn with_hashing_options(mut self, options: RequestHashingOptions) -> Self {
        self.items_mut().insert(HASH_OPTIONS, options);
        self
    }

    fn hashing_options(&self) -> Option<&RequestHashingOptions> {
        self.items().get::<RequestHashingOptions>(HASH_OPTIONS)
    }

    fn computed_hash(&self) -> Option<&str> {
        self.items().get::<String>(REQUEST_HASH).map(String::as_str)
    }
}

/// Computes request fingerprints for one client.
#[derive(Debug, Clone, Copy)]
pub struct RequestHasher<'a> {
    client: &'a ClientContext,
}

impl<'a> RequestHasher<'a> {
    /// Hasher bound to the client's base URL, default headers and options.
    pub fn new(client: &'a ClientContext) -> Self {
        Self { client }
    }

    /// Returns the request fingerprint, computing it at most once per exchange.
    ///
    /// The value is stored on the items bag under [`REQUEST_HASH`] and reused
    /// by later calls for the same request.
    pub fn generate(&self, request: &mut Request) -> String {
        if let Some(hash) = request.computed_hash() {
            return hash.to_owned();
        }
        let hash = self.compute(request);
        request.items_mut().insert(REQUEST_HASH, hash.clone());
        hash
    }

    /// Computes the fingerprint without consulting or updating the items bag.
    pub fn compute(&self, request: &Request) -> String {
        let options = request
            .hashing_options()
            .unwrap_or_else(|| self.client.hashing());

        let headers = self.client.default_headers().merged(request.headers());
        let excluded = |name: &str, values: &[String]| options.is_header_excluded(name, values);
        let headers = headers.to_hash_string(Some(&excluded));

        let url = uri::resolve(self.client.base_url(), request.uri());
        let url = match &options.uri_manipulation {
            Some(manipulate) => manipulate(&url),
            None => url,
        };

        let content = match request.body() {
            Some(Body::Json(value)) if !options.invariant_body => canonical_json(value),
            _ => String::new(),
        };

        format!(
            "method={};url={};headers={};content={}",
            request.method(),
            url,
            headers,
            content
        )
    }
}

/// JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (index, (key, value)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(values) => {
            out.push('[');
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(value, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let a = json!({ "b": 1, "a": { "d": [1, { "z": true, "y": null }], "c": "x" } });
        assert_eq!(
            canonical_json(&a),
            r#"{"a":{"c":"x","d":[1,{"y":null,"z":true}]},"b":1}"#
        );
    }

    #[test]
    fn exclusions_compose_with_or() {
        let options = RequestHashingOptions::new()
            .exclude_header("Authorization")
            .exclude_header("Accept");
        assert!(options.is_header_excluded("authorization", &[]));
        assert!(options.is_header_excluded("Accept", &[]));
        assert!(!options.is_header_excluded("User-Agent", &[]));
    }

    #[test]
    fn replace_drops_previous_exclusions() {
        let options = RequestHashingOptions::new()
            .exclude_header("Authorization")
            .replace_headers_exclude(|name, _| name == "Accept");
        assert!(!options.is_header_excluded("Authorization", &[]));
        assert!(options.is_header_excluded("Accept", &[]));
    }
}
