//! Error types for batch runs.
//!
//! Per-item failures are not errors here: they are data, carried inside the
//! batch result. This module only covers faults that prevent a run from
//! starting or completing as a whole.

use thiserror::Error;

use super::engine::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Run-level errors for the batch engine.
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    /// Input normalized to an empty URL list; the run never started.
    #[error(
        "no URLs found in input\n  Suggestion: Enter at least one URL, one per line"
    )]
    EmptyInput,

    /// Invalid concurrency value provided at engine construction.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A run was requested while another run on the same engine was active.
    #[error(
        "a batch run is already in progress\n  Suggestion: Wait for the current run to finish or cancel it first"
    )]
    RunInProgress,

    /// A fault outside the per-item loop; the run was aborted and no batch
    /// result was produced.
    #[error("batch run aborted: {message}")]
    Runtime {
        /// Description of the fault.
        message: String,
    },
}

impl BatchError {
    /// Creates a `Runtime` abort error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}
