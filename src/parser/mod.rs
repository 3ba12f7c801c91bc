//! Input normalization for batch citation runs.
//!
//! Raw user input is a free-text block with one URL per line. Normalization
//! splits on line breaks, trims surrounding whitespace, and discards empty
//! lines. Nothing else: no deduplication, no URL-syntax validation, and no
//! scheme defaulting, so the batch result maps one-to-one onto what the user
//! typed.
//!
//! # Example
//!
//! ```
//! use citegen_core::parser::normalize_input;
//!
//! let urls = normalize_input("  https://example.com  \n\nhttps://example.org\n");
//! assert_eq!(urls.len(), 2);
//! assert_eq!(urls.get(0), Some("https://example.com"));
//! ```

mod input;

pub use input::UrlList;

use tracing::debug;

/// Normalizes a raw text block into an ordered URL list.
///
/// Returns an empty list for blank input; callers decide whether that is an
/// error (the batch entry point rejects it before starting a run).
#[tracing::instrument(skip(raw), fields(input_len = raw.len()))]
#[must_use]
pub fn normalize_input(raw: &str) -> UrlList {
    let mut urls = UrlList::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        urls.push(trimmed);
    }

    debug!(urls = urls.len(), "Normalized input");
    urls
}
