//! Collaborator contracts for metadata extraction and citation formatting.
//!
//! The batch engine is a pure orchestrator: it never scrapes pages or knows
//! citation grammar. Both concerns live behind the two traits in this
//! module, implemented over HTTP by [`CitationApiClient`] and by in-process
//! fakes in tests.
//!
//! # Object Safety
//!
//! Both traits use `async_trait` so the engine can hold
//! `Arc<dyn MetadataExtractor>` / `Arc<dyn CitationFormatter>`. Rust 2024
//! native async traits are not object-safe, so `async_trait` is required for
//! dynamic dispatch.

mod http;

pub use http::{ApiConfig, CitationApiClient};

use async_trait::async_trait;
use thiserror::Error;

use crate::citation::{MetadataRecord, SourceType, Style};

/// Errors reported by a collaborator call.
///
/// The distinction matters for display, not for control flow: both kinds are
/// recovered locally into a per-item failure and never abort the batch.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The collaborator answered with a structured error for this input
    /// (e.g. an unreachable page or unsupported content). The message is the
    /// service's own text, shown to the user verbatim.
    #[error("{message}")]
    Service {
        /// Error text reported by the collaborator.
        message: String,
    },

    /// The call itself failed before a structured answer arrived
    /// (connect/DNS/TLS failure, timeout, malformed body).
    #[error("network error calling {endpoint}: {message}")]
    Transport {
        /// The endpoint path that was being called.
        endpoint: String,
        /// Underlying transport error text.
        message: String,
    },

    /// The collaborator returned a non-success status without a parseable
    /// error body.
    #[error("unexpected response from {endpoint} (HTTP {status})")]
    UnexpectedResponse {
        /// The endpoint path that was being called.
        endpoint: String,
        /// HTTP status code received.
        status: u16,
    },
}

impl ServiceError {
    /// Creates a `Service` error from collaborator-reported text.
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Creates a `Transport` error for a failed call.
    #[must_use]
    pub fn transport(endpoint: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// Creates an `UnexpectedResponse` error.
    #[must_use]
    pub fn unexpected(endpoint: &str, status: u16) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            status,
        }
    }
}

/// Resolves a URL into a metadata record.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extracts metadata for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Service`] when the service reports a
    /// structured error for this URL, or [`ServiceError::Transport`] /
    /// [`ServiceError::UnexpectedResponse`] when the call itself fails.
    async fn extract_metadata(&self, url: &str) -> Result<MetadataRecord, ServiceError>;
}

/// Formats a citation from source metadata.
#[async_trait]
pub trait CitationFormatter: Send + Sync {
    /// Generates a formatted citation string.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] with the same taxonomy as
    /// [`MetadataExtractor::extract_metadata`].
    async fn generate_citation(
        &self,
        source_type: SourceType,
        style: Style,
        url: &str,
        metadata: &MetadataRecord,
    ) -> Result<String, ServiceError>;
}
