//! Batch engine driving per-URL citation resolution.
//!
//! A run walks the normalized URL list and, for each URL, performs two
//! dependent collaborator calls: metadata extraction first, then citation
//! formatting with the extracted fields. A failure on either call is
//! recorded as that item's outcome and never touches sibling items; the
//! formatter is not called for a URL whose metadata extraction failed.
//!
//! # Execution model
//!
//! With `concurrency == 1` (the default) items resolve strictly in input
//! order, one fully settled before the next begins. Higher values opt into a
//! semaphore-bounded worker pool; results are index-tagged and reassembled
//! into input order, so the ordering guarantee holds regardless of relative
//! latency.
//!
//! # Lifecycle
//!
//! `Idle → Running → Completed` (or `Aborted` on a run-level fault). One run
//! at a time per engine: overlapping runs are rejected. Progress and result
//! state are created fresh at run start and owned exclusively by the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Semaphore, watch};
use tracing::{debug, info, instrument, warn};

use crate::citation::{SourceType, Style};
use crate::parser::{UrlList, normalize_input};
use crate::services::{CitationFormatter, MetadataExtractor};

use super::error::BatchError;
use super::outcome::{BatchResult, ItemOutcome, TitlePolicy};
use super::progress::{ProgressPublisher, ProgressState};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency: strict sequential processing.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Cooperative cancellation flag for a batch run.
///
/// Checked before each item is launched; items already in flight finish
/// normally and their outcomes are kept. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the associated run.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Configuration for a batch engine.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum in-flight items (1 = strict sequential contract).
    pub concurrency: usize,
    /// Title policy for history entries derived from results.
    pub title_policy: TitlePolicy,
    /// Source type submitted to the formatting collaborator.
    pub source_type: SourceType,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            title_policy: TitlePolicy::default(),
            source_type: SourceType::Website,
        }
    }
}

/// Engine running batches of URL citations against two collaborators.
pub struct BatchEngine {
    metadata: Arc<dyn MetadataExtractor>,
    formatter: Arc<dyn CitationFormatter>,
    config: BatchConfig,
    progress: Arc<watch::Sender<ProgressState>>,
    cancel: CancelToken,
    run_active: AtomicBool,
}

impl BatchEngine {
    /// Creates an engine over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConcurrency`] when the configured
    /// concurrency is outside 1..=100.
    pub fn new(
        metadata: Arc<dyn MetadataExtractor>,
        formatter: Arc<dyn CitationFormatter>,
        config: BatchConfig,
    ) -> Result<Self, BatchError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(BatchError::InvalidConcurrency {
                value: config.concurrency,
            });
        }

        debug!(
            concurrency = config.concurrency,
            source_type = %config.source_type,
            "creating batch engine"
        );

        let (progress, _) = watch::channel(ProgressState::idle());
        Ok(Self {
            metadata,
            formatter,
            config,
            progress: Arc::new(progress),
            cancel: CancelToken::new(),
            run_active: AtomicBool::new(false),
        })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Subscribes to progress snapshots for this engine's runs.
    ///
    /// Each run replaces the channel state wholesale at start; a snapshot is
    /// published after every fully-resolved item.
    #[must_use]
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    /// Returns a handle for cancelling the active run. The flag is reset at
    /// the start of each run.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Primary entry point: normalizes raw input and runs the batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::EmptyInput`] when normalization yields no URLs
    /// (the run never starts), [`BatchError::RunInProgress`] when another run
    /// is active, or [`BatchError::Runtime`] on a run-level fault.
    pub async fn run_batch(&self, raw_input: &str, style: Style) -> Result<BatchResult, BatchError> {
        let urls = normalize_input(raw_input);
        self.run(urls, style).await
    }

    /// Runs a batch over an already-normalized URL list.
    ///
    /// Every URL yields exactly one outcome, in input order; a failure on
    /// one URL never blocks or drops siblings.
    ///
    /// # Errors
    ///
    /// Same contract as [`BatchEngine::run_batch`].
    #[instrument(skip(self, urls), fields(total = urls.len(), %style))]
    pub async fn run(&self, urls: UrlList, style: Style) -> Result<BatchResult, BatchError> {
        if urls.is_empty() {
            return Err(BatchError::EmptyInput);
        }
        if self.run_active.swap(true, Ordering::SeqCst) {
            return Err(BatchError::RunInProgress);
        }
        let _guard = RunGuard(&self.run_active);

        self.cancel.reset();
        let total = urls.len();
        let publisher = Arc::new(ProgressPublisher::begin(Arc::clone(&self.progress), total));

        info!(total, "starting batch run");

        let result = if self.config.concurrency <= 1 {
            self.run_sequential(&urls, style, &publisher).await?
        } else {
            self.run_pooled(&urls, style, &publisher).await?
        };

        info!(
            completed = result.len(),
            succeeded = result.success_count(),
            failed = result.failure_count(),
            partial = result.partial(),
            "batch run finished"
        );
        Ok(result)
    }

    /// Strict sequential path: one item fully resolves before the next
    /// begins, so item N's outcome can never depend on item N+1.
    async fn run_sequential(
        &self,
        urls: &UrlList,
        style: Style,
        publisher: &Arc<ProgressPublisher>,
    ) -> Result<BatchResult, BatchError> {
        let mut outcomes = Vec::with_capacity(urls.len());
        let mut cancelled = false;

        for url in urls.iter() {
            if self.cancel.is_cancelled() {
                warn!(
                    completed = outcomes.len(),
                    total = urls.len(),
                    "cancellation requested; stopping batch"
                );
                cancelled = true;
                break;
            }

            let outcome = resolve_item(
                self.metadata.as_ref(),
                self.formatter.as_ref(),
                self.config.source_type,
                style,
                url,
            )
            .await;
            outcomes.push(outcome);
            publisher.item_done();
        }

        Ok(BatchResult::new(outcomes, cancelled))
    }

    /// Bounded worker pool path: up to `concurrency` items in flight,
    /// results reassembled into input order via their input index.
    async fn run_pooled(
        &self,
        urls: &UrlList,
        style: Style,
        publisher: &Arc<ProgressPublisher>,
    ) -> Result<BatchResult, BatchError> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut handles = Vec::with_capacity(urls.len());
        let mut cancelled = false;

        for (index, url) in urls.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    launched = handles.len(),
                    total = urls.len(),
                    "cancellation requested; not launching further items"
                );
                cancelled = true;
                break;
            }

            // Blocks while `concurrency` items are in flight.
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BatchError::runtime("semaphore closed unexpectedly"))?;

            let metadata = Arc::clone(&self.metadata);
            let formatter = Arc::clone(&self.formatter);
            let publisher = Arc::clone(publisher);
            let source_type = self.config.source_type;
            let url = url.to_string();

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII).
                let _permit = permit;
                let outcome =
                    resolve_item(metadata.as_ref(), formatter.as_ref(), source_type, style, &url)
                        .await;
                publisher.item_done();
                (index, outcome)
            }));
        }

        // Bookkeeping slots indexed by input position, not a queue: this is
        // what preserves the ordering guarantee under concurrency.
        let launched = handles.len();
        let mut slots: Vec<Option<ItemOutcome>> = (0..launched).map(|_| None).collect();
        for handle in handles {
            let (index, outcome) = handle
                .await
                .map_err(|e| BatchError::runtime(format!("batch worker failed: {e}")))?;
            slots[index] = Some(outcome);
        }

        let outcomes: Vec<ItemOutcome> = slots.into_iter().flatten().collect();
        if outcomes.len() != launched {
            return Err(BatchError::runtime("batch bookkeeping lost an outcome"));
        }
        Ok(BatchResult::new(outcomes, cancelled))
    }
}

impl std::fmt::Debug for BatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resets the run-active flag when a run exits, on any path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Resolves one URL end to end: metadata first, then formatting.
///
/// Collaborator errors become this item's failure outcome with the message
/// preserved; they never propagate past the item boundary. No retries.
#[instrument(skip(metadata, formatter), fields(%style))]
async fn resolve_item(
    metadata: &dyn MetadataExtractor,
    formatter: &dyn CitationFormatter,
    source_type: SourceType,
    style: Style,
    url: &str,
) -> ItemOutcome {
    let record = match metadata.extract_metadata(url).await {
        Ok(record) => record,
        Err(e) => {
            warn!(url = %url, error = %e, "metadata extraction failed");
            return ItemOutcome::failure(url, e.to_string());
        }
    };

    match formatter
        .generate_citation(source_type, style, url, &record)
        .await
    {
        Ok(citation) => {
            debug!(url = %url, "citation generated");
            ItemOutcome::success(url, citation, record)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "citation formatting failed");
            ItemOutcome::failure(url, e.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::citation::MetadataRecord;
    use crate::services::ServiceError;

    use super::*;

    /// Scripted metadata collaborator: fails configured URLs, optionally
    /// sleeps per URL, optionally cancels a token when a URL is reached.
    #[derive(Default)]
    struct FakeExtractor {
        fail: HashMap<String, String>,
        delay_ms: HashMap<String, u64>,
        cancel_on: Mutex<Option<(String, CancelToken)>>,
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn failing(url: &str, message: &str) -> Self {
            let mut fake = Self::default();
            fake.fail.insert(url.to_string(), message.to_string());
            fake
        }

        fn cancel_when_reaching(&self, url: &str, token: CancelToken) {
            *self.cancel_on.lock().unwrap() = Some((url.to_string(), token));
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataExtractor for FakeExtractor {
        async fn extract_metadata(&self, url: &str) -> Result<MetadataRecord, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ms) = self.delay_ms.get(url) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if let Some((target, token)) = self.cancel_on.lock().unwrap().as_ref() {
                if url == target {
                    token.cancel();
                }
            }
            if let Some(message) = self.fail.get(url) {
                return Err(ServiceError::service(message.clone()));
            }
            Ok(MetadataRecord {
                title: format!("Title of {url}"),
                ..MetadataRecord::default()
            })
        }
    }

    /// Scripted formatter that records which URLs it was asked to format.
    #[derive(Default)]
    struct FakeFormatter {
        fail: HashMap<String, String>,
        formatted_urls: Mutex<Vec<String>>,
    }

    impl FakeFormatter {
        fn formatted_urls(&self) -> Vec<String> {
            self.formatted_urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CitationFormatter for FakeFormatter {
        async fn generate_citation(
            &self,
            _source_type: SourceType,
            style: Style,
            url: &str,
            metadata: &MetadataRecord,
        ) -> Result<String, ServiceError> {
            self.formatted_urls.lock().unwrap().push(url.to_string());
            if let Some(message) = self.fail.get(url) {
                return Err(ServiceError::service(message.clone()));
            }
            Ok(format!("{} ({style})", metadata.title_or(url)))
        }
    }

    fn engine_with(
        extractor: FakeExtractor,
        formatter: FakeFormatter,
        config: BatchConfig,
    ) -> (BatchEngine, Arc<FakeExtractor>, Arc<FakeFormatter>) {
        let extractor = Arc::new(extractor);
        let formatter = Arc::new(formatter);
        let engine = BatchEngine::new(
            Arc::clone(&extractor) as Arc<dyn MetadataExtractor>,
            Arc::clone(&formatter) as Arc<dyn CitationFormatter>,
            config,
        )
        .unwrap();
        (engine, extractor, formatter)
    }

    #[tokio::test]
    async fn test_run_preserves_order_and_length() {
        let (engine, _, _) = engine_with(
            FakeExtractor::default(),
            FakeFormatter::default(),
            BatchConfig::default(),
        );

        let result = engine
            .run_batch("https://a.example\nhttps://b.example\nhttps://c.example", Style::Apa)
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        let urls: Vec<_> = result.outcomes().iter().map(ItemOutcome::url).collect();
        assert_eq!(urls, vec!["https://a.example", "https://b.example", "https://c.example"]);
        assert!(!result.partial());
    }

    #[tokio::test]
    async fn test_metadata_failure_skips_formatter_for_that_url() {
        let (engine, extractor, formatter) = engine_with(
            FakeExtractor::failing("bad-url", "unreachable"),
            FakeFormatter::default(),
            BatchConfig::default(),
        );

        let result = engine
            .run_batch("good-url\nbad-url\nother-url", Style::Mla)
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(extractor.call_count(), 3);
        // The formatter never sees the URL whose metadata call failed.
        assert_eq!(formatter.formatted_urls(), vec!["good-url", "other-url"]);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let (engine, _, _) = engine_with(
            FakeExtractor::failing("b", "unreachable"),
            FakeFormatter::default(),
            BatchConfig::default(),
        );

        let result = engine.run_batch("a\nb\nc", Style::Apa).await.unwrap();

        assert!(result.outcomes()[0].is_success());
        assert!(!result.outcomes()[1].is_success());
        assert!(result.outcomes()[2].is_success());
        match &result.outcomes()[1] {
            ItemOutcome::Failure { url, error } => {
                assert_eq!(url, "b");
                assert_eq!(error, "unreachable");
            }
            ItemOutcome::Success { .. } => panic!("expected failure for b"),
        }
    }

    #[tokio::test]
    async fn test_formatter_failure_is_item_failure() {
        let mut formatter = FakeFormatter::default();
        formatter
            .fail
            .insert("a".to_string(), "Unsupported source type".to_string());
        let (engine, _, _) =
            engine_with(FakeExtractor::default(), formatter, BatchConfig::default());

        let result = engine.run_batch("a\nb", Style::Chicago).await.unwrap();

        assert!(!result.outcomes()[0].is_success());
        assert!(result.outcomes()[1].is_success());
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_running() {
        let (engine, extractor, _) = engine_with(
            FakeExtractor::default(),
            FakeFormatter::default(),
            BatchConfig::default(),
        );

        for raw in ["", "   \n  \n"] {
            let err = engine.run_batch(raw, Style::Apa).await.unwrap_err();
            assert!(matches!(err, BatchError::EmptyInput), "input {raw:?}");
        }
        // The run never started: no collaborator calls, progress still idle.
        assert_eq!(extractor.call_count(), 0);
        let state = *engine.subscribe_progress().borrow();
        assert_eq!(state.total(), 0);
    }

    #[tokio::test]
    async fn test_progress_reaches_exactly_100() {
        let (engine, _, _) = engine_with(
            FakeExtractor::failing("b", "unreachable"),
            FakeFormatter::default(),
            BatchConfig::default(),
        );
        let progress = engine.subscribe_progress();

        engine.run_batch("a\nb\nc\nd", Style::Apa).await.unwrap();

        let state = *progress.borrow();
        assert_eq!(state.completed(), 4);
        assert_eq!(state.percent(), 100);
        assert!(state.is_finished());
    }

    #[tokio::test]
    async fn test_duplicates_processed_once_per_occurrence() {
        let (engine, extractor, _) = engine_with(
            FakeExtractor::default(),
            FakeFormatter::default(),
            BatchConfig::default(),
        );

        let result = engine.run_batch("same\nsame", Style::Apa).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(extractor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_prefix_and_tags_partial() {
        let (engine, extractor, _) = engine_with(
            FakeExtractor::default(),
            FakeFormatter::default(),
            BatchConfig::default(),
        );
        // Cancel the engine's own run token while item b is resolving.
        extractor.cancel_when_reaching("b", engine.cancel_token());

        let result = engine.run_batch("a\nb\nc", Style::Apa).await.unwrap();

        // a and b completed; c was never launched.
        assert!(result.partial());
        assert_eq!(result.len(), 2);
        assert_eq!(result.outcomes()[0].url(), "a");
        assert_eq!(result.outcomes()[1].url(), "b");
        assert_eq!(extractor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_pooled_run_preserves_order_despite_latency() {
        let mut extractor = FakeExtractor::default();
        // First URL is the slowest; its outcome must still come first.
        extractor.delay_ms.insert("slow".to_string(), 50);
        extractor.delay_ms.insert("medium".to_string(), 20);
        let (engine, _, _) = engine_with(
            extractor,
            FakeFormatter::default(),
            BatchConfig {
                concurrency: 3,
                ..BatchConfig::default()
            },
        );

        let result = engine
            .run_batch("slow\nmedium\nfast", Style::Apa)
            .await
            .unwrap();

        let urls: Vec<_> = result.outcomes().iter().map(ItemOutcome::url).collect();
        assert_eq!(urls, vec!["slow", "medium", "fast"]);
    }

    #[tokio::test]
    async fn test_pooled_run_progress_completes() {
        let (engine, _, _) = engine_with(
            FakeExtractor::default(),
            FakeFormatter::default(),
            BatchConfig {
                concurrency: 4,
                ..BatchConfig::default()
            },
        );
        let progress = engine.subscribe_progress();

        engine
            .run_batch("a\nb\nc\nd\ne\nf", Style::Harvard)
            .await
            .unwrap();

        assert_eq!(progress.borrow().percent(), 100);
    }

    #[tokio::test]
    async fn test_invalid_concurrency_rejected() {
        for value in [0, 101] {
            let result = BatchEngine::new(
                Arc::new(FakeExtractor::default()) as Arc<dyn MetadataExtractor>,
                Arc::new(FakeFormatter::default()) as Arc<dyn CitationFormatter>,
                BatchConfig {
                    concurrency: value,
                    ..BatchConfig::default()
                },
            );
            assert!(matches!(
                result,
                Err(BatchError::InvalidConcurrency { value: v }) if v == value
            ));
        }
    }

    #[tokio::test]
    async fn test_overlapping_run_rejected() {
        let mut extractor = FakeExtractor::default();
        extractor.delay_ms.insert("a".to_string(), 100);
        let extractor = Arc::new(extractor);
        let formatter = Arc::new(FakeFormatter::default());
        let engine = Arc::new(
            BatchEngine::new(
                Arc::clone(&extractor) as Arc<dyn MetadataExtractor>,
                Arc::clone(&formatter) as Arc<dyn CitationFormatter>,
                BatchConfig::default(),
            )
            .unwrap(),
        );

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.run_batch("a", Style::Apa).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = engine.run_batch("b", Style::Apa).await;
        assert!(matches!(second, Err(BatchError::RunInProgress)));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        // After the first run finishes, a new run is accepted again.
        let third = engine.run_batch("c", Style::Apa).await.unwrap();
        assert_eq!(third.len(), 1);
    }
}
