//! Per-exchange items bag.
//!
//! [`Items`] is a string-keyed heterogeneous map that travels with a request
//! through the middleware pipeline and is handed over to the response by the
//! terminal stage. Stages use it to pass options and computed state to each
//! other without a shared type; third-party stages can add their own keys.
//!
//! Well-known keys used by the built-in stages live in [`keys`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Well-known item keys.
pub mod keys {
    /// Request fingerprint computed for this exchange (`String`).
    pub const REQUEST_HASH: &str = "REQUEST_HASH";
    /// Per-request hashing options (`RequestHashingOptions`).
    pub const HASH_OPTIONS: &str = "HASH_OPTIONS";
    /// Per-request response cache options.
    pub const CACHE_OPTIONS: &str = "RESPONSE_CACHE_OPTIONS";
    /// Outcome of the response cache stage.
    pub const CACHE_STATUS: &str = "RESPONSE_CACHE_STATUS";
    /// Per-request logger options.
    pub const LOGGER_OPTIONS: &str = "LOGGER_OPTIONS";
    /// Elapsed time measured by the timer stage (`Duration`).
    pub const TIME_TAKEN: &str = "TIME_TAKEN";
}

/// Heterogeneous, string-keyed bag scoped to one request/response exchange.
#[derive(Default)]
pub struct Items {
    map: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Items {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.map.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    pub fn get<T>(&self, key: &str) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.map.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<T>(&mut self, key: &str) -> Option<&mut T>
    where
        T: Any + Send + Sync,
    {
        self.map
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Removes and returns the value under `key` if it has type `T`.
    ///
    /// A value of another type is left in place.
    pub fn remove<T>(&mut self, key: &str) -> Option<T>
    where
        T: Any + Send + Sync,
    {
        if !self.map.get(key).is_some_and(|value| value.is::<T>()) {
            return None;
        }
        self.map
            .remove(key)
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    /// Returns `true` if any value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over stored keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

impl fmt::Debug for Items {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn typed_roundtrip() {
        let mut items = Items::new();
        items.insert(keys::REQUEST_HASH, "method=GET".to_string());
        items.insert(keys::TIME_TAKEN, Duration::from_millis(5));

        assert_eq!(
            items.get::<String>(keys::REQUEST_HASH).map(String::as_str),
            Some("method=GET")
        );
        assert_eq!(
            items.get::<Duration>(keys::TIME_TAKEN),
            Some(&Duration::from_millis(5))
        );
    }

    #[test]
    fn wrong_type_is_none_and_not_removed() {
        let mut items = Items::new();
        items.insert("count", 1_u32);

        assert!(items.get::<String>("count").is_none());
        assert!(items.remove::<String>("count").is_none());
        assert_eq!(items.remove::<u32>("count"), Some(1));
        assert!(items.is_empty());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut items = Items::new();
        items.insert("visits", vec!["a"]);
        items.get_mut::<Vec<&str>>("visits").unwrap().push("b");
        assert_eq!(items.get::<Vec<&str>>("visits").unwrap(), &["a", "b"]);
    }
}
