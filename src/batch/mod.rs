//! Batch citation pipeline: engine, outcomes, progress, and errors.
//!
//! Data flows one direction: raw text → ordered URL list → per-URL outcome
//! stream → aggregated [`BatchResult`] → sinks (display, export blob,
//! history entries). The engine is a leaf over the two collaborator
//! services; nothing here depends on how metadata is scraped or how a
//! citation style is rendered.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use citegen_core::batch::{BatchConfig, BatchEngine};
//! use citegen_core::citation::Style;
//! use citegen_core::services::CitationApiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(CitationApiClient::new("http://localhost:5000")?);
//! let engine = BatchEngine::new(api.clone(), api, BatchConfig::default())?;
//!
//! let result = engine
//!     .run_batch("https://example.com\nhttps://example.org", Style::Apa)
//!     .await?;
//! println!("{}", result.export_text());
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod outcome;
mod progress;

pub use engine::{
    BatchConfig, BatchEngine, CancelToken, DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use error::BatchError;
pub use outcome::{BatchResult, ItemOutcome, TitlePolicy};
pub use progress::ProgressState;
