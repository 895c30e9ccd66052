//! The header bag handed to handlers in the header-bag role.

use http::HeaderMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-request mapping of canonical header name to a single value.
///
/// Built fresh for every request from the inbound [`HeaderMap`]. Names are
/// stored in canonical form (`x-request-id` becomes `X-Request-Id`) and a
/// header that appears more than once collapses to its first value.
///
/// # Example
///
/// ```
/// use fnbind_core::HeaderBag;
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.append("accept", "text/html".parse().unwrap());
/// headers.append("accept", "application/json".parse().unwrap());
///
/// let bag = HeaderBag::from_headers(&headers);
/// assert_eq!(bag.get("Accept"), Some("text/html"));
/// assert_eq!(bag.get("accept"), Some("text/html"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderBag(BTreeMap<String, String>);

impl HeaderBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from request headers, keeping the first value of each name.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut bag = BTreeMap::new();
        for name in headers.keys() {
            if let Some(value) = headers.get(name) {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                bag.insert(canonical_name(name.as_str()), value);
            }
        }
        Self(bag)
    }

    /// Looks up a header by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&canonical_name(name)).map(String::as_str)
    }

    /// Inserts a value, replacing any previous value for the name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(canonical_name(name), value.into());
    }

    /// Returns `true` if the bag holds a value for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&canonical_name(name))
    }

    /// Iterates over `(canonical name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Canonicalizes a header name: the first letter and every letter following
/// a hyphen are upper-cased, the rest lower-cased.
///
/// Names containing a byte that is not an HTTP token character are
/// returned unchanged.
///
/// ```
/// use fnbind_core::header::canonical_name;
///
/// assert_eq!(canonical_name("content-type"), "Content-Type");
/// assert_eq!(canonical_name("X-REQUEST-ID"), "X-Request-Id");
/// assert_eq!(canonical_name("x_custom-id"), "X_custom-Id");
/// ```
#[must_use]
pub fn canonical_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// `tchar` from RFC 9110.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("accept"), "Accept");
        assert_eq!(canonical_name("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_name("ETAG"), "Etag");
        assert_eq!(canonical_name("weird_name"), "Weird_name");
    }

    #[test]
    fn test_canonical_name_with_underscore() {
        assert_eq!(canonical_name("x_custom-id"), "X_custom-Id");
        assert_eq!(canonical_name("X_CUSTOM-ID"), "X_custom-Id");
    }

    #[test]
    fn test_canonical_name_leaves_non_tokens() {
        assert_eq!(canonical_name("bad header"), "bad header");
        assert_eq!(canonical_name("x-caf\u{e9}"), "x-caf\u{e9}");
    }

    #[test]
    fn test_from_headers_keeps_first_value() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", "one".parse().unwrap());
        headers.append("x-tag", "two".parse().unwrap());
        headers.insert("content-type", "application/json".parse().unwrap());

        let bag = HeaderBag::from_headers(&headers);

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("X-Tag"), Some("one"));
        assert_eq!(bag.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_iter_uses_canonical_names() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());

        let bag = HeaderBag::from_headers(&headers);
        let pairs: Vec<_> = bag.iter().collect();

        assert_eq!(pairs, vec![("X-Request-Id", "abc")]);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut bag = HeaderBag::new();
        assert!(bag.is_empty());

        bag.insert("authorization", "Bearer t");
        assert!(bag.contains("Authorization"));
        assert_eq!(bag.get("AUTHORIZATION"), Some("Bearer t"));
    }

    #[test]
    fn test_serializes_as_map() {
        let mut bag = HeaderBag::new();
        bag.insert("accept", "*/*");
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"Accept":"*/*"}"#);
    }
}
