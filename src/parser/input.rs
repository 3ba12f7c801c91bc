//! Types representing normalized URL-list input.

use std::fmt;

/// Ordered list of candidate URLs extracted from raw input.
///
/// Order and multiplicity are preserved exactly: a URL's position determines
/// its processing order and its slot in the batch result, and duplicates are
/// processed once per occurrence. No URL-syntax validation is performed at
/// this stage; unreachable or malformed entries surface as per-item failures
/// during the run instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlList {
    urls: Vec<String>,
}

impl UrlList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL, preserving insertion order.
    pub fn push(&mut self, url: impl Into<String>) {
        self.urls.push(url.into());
    }

    /// Returns true if the list holds no URLs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns the number of URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns the URL at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.urls.get(index).map(String::as_str)
    }

    /// Iterates over the URLs in input order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Consumes the list, returning the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

impl From<Vec<String>> for UrlList {
    fn from(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

impl<'a> IntoIterator for &'a UrlList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}

impl fmt::Display for UrlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} URL(s)", self.urls.len())
    }
}
