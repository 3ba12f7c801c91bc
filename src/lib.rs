//! Citegen Core Library
//!
//! This library provides the core functionality for the citegen tool, which
//! turns lists of source URLs into formatted bibliographic citations
//! (APA/MLA/Chicago/Harvard) via two remote collaborators: a metadata
//! extraction service and a citation formatting service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - URL-list normalization from raw text input
//! - [`citation`] - Citation styles, source types, and metadata records
//! - [`services`] - Collaborator contracts and their HTTP implementation
//! - [`batch`] - Batch engine driving per-URL resolution with progress
//! - [`history`] - Injected citation-history store (in-memory and SQLite)

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod citation;
pub mod history;
pub mod parser;
pub mod services;

// Re-export commonly used types
pub use batch::{
    BatchConfig, BatchEngine, BatchError, BatchResult, CancelToken, DEFAULT_CONCURRENCY,
    ItemOutcome, ProgressState, TitlePolicy,
};
pub use citation::{MetadataRecord, SourceType, Style};
pub use history::{HistoryEntry, HistoryError, HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
pub use parser::{UrlList, normalize_input};
pub use services::{
    ApiConfig, CitationApiClient, CitationFormatter, MetadataExtractor, ServiceError,
};
