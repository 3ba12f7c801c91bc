//! Progress accounting for batch runs.
//!
//! A run publishes a fresh [`ProgressState`] snapshot over a watch channel
//! after each item fully resolves (success or failure). Readers only observe
//! snapshots; they never mutate run state. The percentage is monotonically
//! non-decreasing within a run and reaches exactly 100 when every item has
//! resolved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// A snapshot of batch progress: completed items out of total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    completed: usize,
    total: usize,
}

impl ProgressState {
    /// State before any run has started (0 of 0).
    #[must_use]
    pub fn idle() -> Self {
        Self {
            completed: 0,
            total: 0,
        }
    }

    /// Fresh state at the start of a run over `total` items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    pub(crate) fn advanced(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Number of items fully resolved so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Total items in the run (0 while idle).
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Progress as a rounded percentage in [0, 100].
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// True once every item in a started run has resolved.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Per-run progress publisher shared by the item workers.
///
/// Counting is atomic so the pooled execution path can report completions
/// from concurrent tasks; the published snapshot always reflects the latest
/// count.
#[derive(Debug)]
pub(crate) struct ProgressPublisher {
    sender: Arc<watch::Sender<ProgressState>>,
    completed: AtomicUsize,
    total: usize,
}

impl ProgressPublisher {
    /// Starts a new run: resets the channel to a fresh zero-progress state.
    pub(crate) fn begin(sender: Arc<watch::Sender<ProgressState>>, total: usize) -> Self {
        sender.send_replace(ProgressState::new(total));
        Self {
            sender,
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Records one fully-resolved item and publishes the updated snapshot.
    pub(crate) fn item_done(&self) {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender
            .send_replace(ProgressState::advanced(done, self.total));
    }
}
