//! Ordered multi-value request parameters.
//!
//! A [`Params`] is what MAAS calls "form parameters": the same map is sent
//! as the query string of a GET, the url-encoded body of a POST/PUT, or the
//! fields of a multipart form, and it also feeds the OAuth signature.

use url::form_urlencoded;

/// Ordered multimap of string keys to one or more string values.
///
/// Keys keep the position of their first insertion; [`Params::set`] replaces
/// the values of a key in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<String>)>,
}

impl Params {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned variant of [`Params::set`], for building filters inline.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Append a value without removing existing values for `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
        self
    }

    /// Replace all values for `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
        self
    }

    /// Remove every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Merge another parameter set into this one. For keys present in
    /// `other`, its values replace ours.
    pub fn copy(&mut self, other: &Params) {
        for (key, values) in &other.entries {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => existing.clone_from(values),
                None => self.entries.push((key.clone(), values.clone())),
            }
        }
    }

    /// Ordered view of all keys with their values.
    pub fn values(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Flattened `(key, value)` pairs, one per value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// First value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values stored for `key`.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Encode as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn to_form(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}
