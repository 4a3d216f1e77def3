//! URL construction helpers
//!
//! Segments and query values are inserted as-is. Nothing is percent-encoded,
//! so callers must sanitize identifiers or filter text containing reserved
//! characters before passing them in.

use std::fmt;

/// A single `key=value` query pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(key: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

/// Join path segments and append an optional query string.
///
/// The first segment is kept verbatim so an absolute base such as
/// `http://localhost:8080` stays absolute. Every following non-empty segment
/// is appended after a `/`; empty ones are skipped.
pub fn create_absolute_url<S: AsRef<str>>(segments: &[S], queries: Option<&[QueryParam]>) -> String {
    let mut url = String::new();
    let mut iter = segments.iter();
    if let Some(first) = iter.next() {
        url.push_str(first.as_ref());
    }
    for segment in iter {
        let segment = segment.as_ref();
        if !segment.is_empty() {
            url.push('/');
            url.push_str(segment);
        }
    }

    if let Some(queries) = queries.filter(|q| !q.is_empty()) {
        let query = queries
            .iter()
            .map(|q| format!("{}={}", q.key, q.value))
            .collect::<Vec<_>>()
            .join("&");
        url.push('?');
        url.push_str(&query);
    }

    url
}

/// Same as [`create_absolute_url`] but always returns a path starting with `/`.
pub fn create_url<S: AsRef<str>>(segments: &[S], queries: Option<&[QueryParam]>) -> String {
    let url = create_absolute_url(segments, queries);
    if url.starts_with('/') {
        url
    } else {
        format!("/{}", url)
    }
}
