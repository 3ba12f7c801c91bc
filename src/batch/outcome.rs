//! Per-item outcomes and the aggregated batch result.
//!
//! Every URL in the input yields exactly one [`ItemOutcome`], in input
//! order. The [`BatchResult`] is shaped for two consumers: the full tagged
//! outcome list for display/export, and a successes-only projection for the
//! history store.

use chrono::Utc;
use serde::Serialize;

use crate::citation::MetadataRecord;
use crate::history::HistoryEntry;

/// Outcome of resolving one URL end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    /// Both collaborator calls succeeded.
    Success {
        /// The input URL, exactly as entered.
        url: String,
        /// The formatted citation.
        citation: String,
        /// Metadata the citation was built from.
        metadata: MetadataRecord,
    },
    /// One of the collaborator calls reported an error or faulted.
    Failure {
        /// The input URL, exactly as entered.
        url: String,
        /// User-facing error text, preserved from the collaborator.
        error: String,
    },
}

impl ItemOutcome {
    /// Creates a success outcome.
    #[must_use]
    pub fn success(
        url: impl Into<String>,
        citation: impl Into<String>,
        metadata: MetadataRecord,
    ) -> Self {
        Self::Success {
            url: url.into(),
            citation: citation.into(),
            metadata,
        }
    }

    /// Creates a failure outcome.
    #[must_use]
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure {
            url: url.into(),
            error: error.into(),
        }
    }

    /// The input URL this outcome belongs to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    /// True for [`ItemOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Title policy for history entries derived from a batch run.
///
/// Observed variants of the original pipeline disagreed on this; the policy
/// is an explicit configuration knob instead of an implicit behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitlePolicy {
    /// Use the extracted metadata title, falling back to the URL when the
    /// title is empty.
    #[default]
    MetadataTitle,
    /// Always use the raw URL.
    Url,
}

/// Aggregated result of a batch run: one outcome per input URL, in input
/// order, plus a flag for runs cut short by cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    outcomes: Vec<ItemOutcome>,
    partial: bool,
}

impl BatchResult {
    /// Assembles a result from per-item outcomes. Engine runs produce
    /// these; the constructor is public so report consumers can build
    /// fixtures.
    #[must_use]
    pub fn new(outcomes: Vec<ItemOutcome>, partial: bool) -> Self {
        Self { outcomes, partial }
    }

    /// The ordered outcome list (successes and failures, each tagged).
    #[must_use]
    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    /// Number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when the run produced no outcomes (only possible for cancelled
    /// runs; empty input is rejected before a run starts).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when the run was cancelled before processing every URL; the
    /// outcome list then covers only the items completed before the cut.
    #[must_use]
    pub fn partial(&self) -> bool {
        self.partial
    }

    /// Iterates over success outcomes only, in input order.
    pub fn successes(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Number of successful items.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Renders the whole result as a downloadable text blob.
    ///
    /// Each outcome becomes either `"<url>\n<citation>\n"` or
    /// `"<url>\nError: <message>\n"`, joined with blank-line separators.
    /// Pure and total: identical input yields identical output.
    #[must_use]
    pub fn export_text(&self) -> String {
        let entries: Vec<String> = self
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                ItemOutcome::Success { url, citation, .. } => format!("{url}\n{citation}\n"),
                ItemOutcome::Failure { url, error } => format!("{url}\nError: {error}\n"),
            })
            .collect();
        entries.join("\n")
    }

    /// Maps the successes to history entries, timestamped at call time.
    #[must_use]
    pub fn to_history_entries(&self, policy: TitlePolicy) -> Vec<HistoryEntry> {
        let now = Utc::now();
        self.successes()
            .filter_map(|outcome| match outcome {
                ItemOutcome::Success {
                    url,
                    citation,
                    metadata,
                } => {
                    let title = match policy {
                        TitlePolicy::MetadataTitle => metadata.title_or(url),
                        TitlePolicy::Url => url,
                    };
                    Some(HistoryEntry {
                        text: citation.clone(),
                        title: title.to_string(),
                        timestamp: now,
                    })
                }
                ItemOutcome::Failure { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_result() -> BatchResult {
        let metadata = MetadataRecord {
            title: "Example Domain".to_string(),
            ..MetadataRecord::default()
        };
        BatchResult::new(
            vec![
                ItemOutcome::success("example.com", "Example Domain. (2024). APA.", metadata),
                ItemOutcome::failure("bad-url", "unreachable"),
                ItemOutcome::success(
                    "example.org",
                    "Example Org. (2024). APA.",
                    MetadataRecord::default(),
                ),
            ],
            false,
        )
    }

    #[test]
    fn test_outcome_url_accessor_covers_both_variants() {
        assert_eq!(
            ItemOutcome::success("a", "c", MetadataRecord::default()).url(),
            "a"
        );
        assert_eq!(ItemOutcome::failure("b", "e").url(), "b");
    }

    #[test]
    fn test_result_counts() {
        let result = sample_result();
        assert_eq!(result.len(), 3);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert!(!result.partial());
    }

    #[test]
    fn test_successes_preserve_input_order() {
        let result = sample_result();
        let urls: Vec<_> = result.successes().map(ItemOutcome::url).collect();
        assert_eq!(urls, vec!["example.com", "example.org"]);
    }

    #[test]
    fn test_export_text_layout() {
        let result = sample_result();
        let text = result.export_text();

        assert!(text.starts_with("example.com\nExample Domain. (2024). APA.\n"));
        assert!(text.contains("bad-url\nError: unreachable\n"));
        // Entries are separated by a blank line.
        assert!(text.contains(".\n\nbad-url\n"));
    }

    #[test]
    fn test_export_text_is_idempotent() {
        let result = sample_result();
        assert_eq!(result.export_text(), result.export_text());
    }

    #[test]
    fn test_history_entries_are_successes_only() {
        let entries = sample_result().to_history_entries(TitlePolicy::default());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Example Domain. (2024). APA.");
    }

    #[test]
    fn test_history_title_metadata_policy_falls_back_to_url() {
        let entries = sample_result().to_history_entries(TitlePolicy::MetadataTitle);
        assert_eq!(entries[0].title, "Example Domain");
        // Second success has no metadata title.
        assert_eq!(entries[1].title, "example.org");
    }

    #[test]
    fn test_history_title_url_policy() {
        let entries = sample_result().to_history_entries(TitlePolicy::Url);
        assert_eq!(entries[0].title, "example.com");
        assert_eq!(entries[1].title, "example.org");
    }

    #[test]
    fn test_empty_partial_result() {
        let result = BatchResult::new(Vec::new(), true);
        assert!(result.is_empty());
        assert!(result.partial());
        assert_eq!(result.export_text(), "");
        assert!(result.to_history_entries(TitlePolicy::default()).is_empty());
    }
}
