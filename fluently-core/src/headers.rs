//! Ordered multi-value header collection.
//!
//! [`Headers`] keeps header names exactly as they were given and preserves
//! insertion order, which makes its [`to_hash_string`](Headers::to_hash_string)
//! output stable enough to be used as part of a cache key.
//!
//! Name lookups are ASCII case-insensitive, matching HTTP semantics, so
//! `get("accept")` finds a header registered as `Accept`.
//!
//! ```
//! use fluently_core::Headers;
//!
//! let mut headers = Headers::new();
//! headers.add("Accept", ["application/json", "text/json"]).unwrap();
//! headers.set("User-Agent", ["fluently"]);
//!
//! assert_eq!(
//!     headers.to_hash_string(None),
//!     "Accept=application/json,text/json&User-Agent=fluently"
//! );
//! assert!(headers.add("accept", ["text/plain"]).is_err());
//! ```

use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by [`Headers`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// [`Headers::add`] was called for a name that is already present.
    ///
    /// Use [`Headers::set`] to overwrite an existing header.
    #[error("header `{0}` already exists")]
    DuplicateKey(String),

    /// Name or value can not be represented as an HTTP header.
    #[error("invalid header `{name}`: {reason}")]
    Invalid {
        /// Offending header name.
        name: String,
        /// Why the conversion failed.
        reason: String,
    },
}

/// Ordered, multi-value header collection.
///
/// Each entry maps a header name to the ordered list of its values. Entries
/// keep their insertion position for the lifetime of the collection, even
/// when [`set`](Self::set) replaces their values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, Vec<String>>",
    into = "IndexMap<String, Vec<String>>"
)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Adds a new header.
    ///
    /// Fails with [`HeaderError::DuplicateKey`] when the name already exists;
    /// the collection is left untouched in that case.
    pub fn add<K, I, V>(&mut self, name: K, values: I) -> Result<(), HeaderError>
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(HeaderError::DuplicateKey(name));
        }
        self.entries
            .push((name, values.into_iter().map(Into::into).collect()));
        Ok(())
    }

    /// Inserts or replaces a header, keeping the original position on replace.
    pub fn set<K, I, V>(&mut self, name: K, values: I) -> &mut Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = values,
            None => self.entries.push((name, values)),
        }
        self
    }

    /// Returns all values of a header, or `None` when absent.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|index| self.entries[index].1.as_slice())
    }

    /// Returns the first value of a header.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Removes a header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Returns `true` if a header with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Returns a new collection with `other` layered on top of `self`.
    ///
    /// Headers present in both take `other`'s values but keep `self`'s
    /// position; headers only present in `other` are appended in its order.
    pub fn merged(&self, other: &Headers) -> Headers {
        let mut merged = self.clone();
        for (name, values) in other.iter() {
            merged.set(name, values.iter().cloned());
        }
        merged
    }

    /// Builds the canonical header segment used by request fingerprints.
    ///
    /// Produces `Key1=v1,v2&Key2=v3` in insertion order. Pairs for which
    /// `exclude` returns `true` are left out of the string; the collection
    /// itself is never modified.
    pub fn to_hash_string(&self, exclude: Option<&dyn Fn(&str, &[String]) -> bool>) -> String {
        let mut hash = String::new();
        for (name, values) in self.iter() {
            if exclude.is_some_and(|exclude| exclude(name, values)) {
                continue;
            }
            hash.push_str(name);
            hash.push('=');
            hash.push_str(&values.join(","));
            hash.push('&');
        }
        if hash.ends_with('&') {
            hash.pop();
        }
        hash
    }

    /// Converts into an [`http::HeaderMap`], one map entry per value.
    pub fn to_header_map(&self) -> Result<HeaderMap, HeaderError> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (name, values) in self.iter() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| HeaderError::Invalid {
                    name: name.to_owned(),
                    reason: err.to_string(),
                })?;
            for value in values {
                let header_value =
                    HeaderValue::from_str(value).map_err(|err| HeaderError::Invalid {
                        name: name.to_owned(),
                        reason: err.to_string(),
                    })?;
                map.append(header_name.clone(), header_value);
            }
        }
        Ok(map)
    }

    /// Collects an [`http::HeaderMap`], grouping repeated names.
    ///
    /// Values that are not visible ASCII are converted lossily.
    pub fn from_header_map(map: &HeaderMap) -> Headers {
        let mut headers = Headers::new();
        for name in map.keys() {
            let values = map
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
            headers.set(name.as_str(), values);
        }
        headers
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl From<IndexMap<String, Vec<String>>> for Headers {
    fn from(map: IndexMap<String, Vec<String>>) -> Self {
        let mut headers = Headers::new();
        for (name, values) in map {
            headers.set(name, values);
        }
        headers
    }
}

impl From<Headers> for IndexMap<String, Vec<String>> {
    fn from(headers: Headers) -> Self {
        headers.entries.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            let name = name.into();
            match headers.position(&name) {
                Some(index) => headers.entries[index].1.push(value.into()),
                None => headers.entries.push((name, vec![value.into()])),
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Headers {
        let mut headers = Headers::new();
        headers.add("Accept", ["application/json"]).unwrap();
        headers.add("User-Agent", ["fluently"]).unwrap();
        headers
    }

    #[test]
    fn add_rejects_duplicates_without_overwriting() {
        let mut headers = sample();
        let err = headers.add("accept", ["text/plain"]).unwrap_err();
        assert_eq!(err, HeaderError::DuplicateKey("accept".to_string()));
        assert_eq!(headers.get_first("Accept"), Some("application/json"));
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut headers = sample();
        headers.set("ACCEPT", ["text/xml"]);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.to_hash_string(None), "Accept=text/xml&User-Agent=fluently");
    }

    #[test]
    fn get_missing_is_none() {
        assert!(sample().get("Authorization").is_none());
    }

    #[test]
    fn hash_string_joins_multi_values() {
        let mut headers = Headers::new();
        headers.add("Accept", ["a", "b"]).unwrap();
        headers.add("X-Id", ["1"]).unwrap();
        assert_eq!(headers.to_hash_string(None), "Accept=a,b&X-Id=1");
    }

    #[test]
    fn hash_string_exclusion_keeps_collection() {
        let mut headers = sample();
        headers.add("Authorization", ["Bearer token"]).unwrap();
        let exclude = |name: &str, _: &[String]| name.eq_ignore_ascii_case("authorization");

        assert_eq!(
            headers.to_hash_string(Some(&exclude)),
            "Accept=application/json&User-Agent=fluently"
        );
        assert!(headers.contains("Authorization"));
    }

    #[test]
    fn hash_string_of_fully_excluded_is_empty() {
        let exclude = |_: &str, _: &[String]| true;
        assert_eq!(sample().to_hash_string(Some(&exclude)), "");
        assert_eq!(Headers::new().to_hash_string(None), "");
    }

    #[test]
    fn merged_prefers_right_side() {
        let mut request = Headers::new();
        request.add("user-agent", ["custom"]).unwrap();
        request.add("locale", ["en-GB"]).unwrap();

        let merged = sample().merged(&request);
        assert_eq!(
            merged.to_hash_string(None),
            "Accept=application/json&User-Agent=custom&locale=en-GB"
        );
    }

    #[test]
    fn header_map_conversion_groups_values() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));

        let headers = Headers::from_header_map(&map);
        assert_eq!(headers.get("Set-Cookie").unwrap(), ["a=1", "b=2"]);

        let back = headers.to_header_map().unwrap();
        assert_eq!(back.get_all("set-cookie").iter().count(), 2);
    }

    #[test]
    fn invalid_header_name_is_reported() {
        let mut headers = Headers::new();
        headers.set("bad header", ["x"]);
        assert!(matches!(
            headers.to_header_map(),
            Err(HeaderError::Invalid { .. })
        ));
    }
}
