//! HTTP implementation of the collaborator contracts.
//!
//! [`CitationApiClient`] talks to the citation backend over JSON:
//! `POST /api/extract-metadata` with `{"url"}` and
//! `POST /api/generate-citation` with the source type, style, URL, and
//! flattened metadata fields. Error bodies are `{"error": "..."}` and may
//! arrive with either a non-success status or, defensively, a 200.
//!
//! The base URL is injectable so tests can point the client at a wiremock
//! server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::citation::{MetadataRecord, SourceType, Style};

use super::{CitationFormatter, MetadataExtractor, ServiceError};

const EXTRACT_METADATA_PATH: &str = "/api/extract-metadata";
const GENERATE_CITATION_PATH: &str = "/api/generate-citation";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`CitationApiClient`] construction.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout. The batch applies no additional per-item
    /// timeout on top of this.
    pub read_timeout: Duration,
}

impl ApiConfig {
    /// Creates a config for `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

// ==================== Wire Types ====================

#[derive(Debug, Serialize)]
struct ExtractMetadataRequest<'a> {
    url: &'a str,
}

/// Metadata response body. A structured error can replace the fields even on
/// a 200, so both shapes are accepted here and disambiguated after parsing.
#[derive(Debug, Deserialize)]
struct ExtractMetadataResponse {
    error: Option<String>,
    #[serde(flatten)]
    fields: MetadataRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCitationRequest<'a> {
    source_type: SourceType,
    style: Style,
    url: &'a str,
    title: &'a str,
    author: &'a str,
    date: &'a str,
    publisher: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateCitationResponse {
    error: Option<String>,
    citation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ==================== CitationApiClient ====================

/// HTTP client for the citation backend, implementing both collaborator
/// contracts over one connection pool.
pub struct CitationApiClient {
    client: Client,
    base_url: String,
}

impl CitationApiClient {
    /// Creates a client for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if HTTP client construction fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Self::with_config(&ApiConfig::new(base_url))
    }

    /// Creates a client from an explicit [`ApiConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Transport`] if HTTP client construction fails.
    pub fn with_config(config: &ApiConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(concat!("citegen/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| {
                ServiceError::transport(
                    &config.base_url,
                    format!("HTTP client construction failed: {e}"),
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts `body` to `path` and hands back the response, mapping transport
    /// faults and error-status bodies to [`ServiceError`].
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(endpoint = path, "Calling citation backend");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::transport(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // The backend reports domain errors as {"error": ...} with a 4xx.
            return match response.json::<ErrorBody>().await {
                Ok(body) => {
                    debug!(endpoint = path, status = status.as_u16(), error = %body.error, "Backend reported error");
                    Err(ServiceError::service(body.error))
                }
                Err(_) => {
                    warn!(endpoint = path, status = status.as_u16(), "Unparseable error response");
                    Err(ServiceError::unexpected(path, status.as_u16()))
                }
            };
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::transport(path, format!("invalid response body: {e}")))
    }
}

impl std::fmt::Debug for CitationApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataExtractor for CitationApiClient {
    #[tracing::instrument(skip(self), fields(endpoint = EXTRACT_METADATA_PATH))]
    async fn extract_metadata(&self, url: &str) -> Result<MetadataRecord, ServiceError> {
        let body: ExtractMetadataResponse = self
            .post_json(EXTRACT_METADATA_PATH, &ExtractMetadataRequest { url })
            .await?;

        if let Some(error) = body.error {
            return Err(ServiceError::service(error));
        }

        Ok(body.fields)
    }
}

#[async_trait]
impl CitationFormatter for CitationApiClient {
    #[tracing::instrument(skip(self, metadata), fields(endpoint = GENERATE_CITATION_PATH, %style))]
    async fn generate_citation(
        &self,
        source_type: SourceType,
        style: Style,
        url: &str,
        metadata: &MetadataRecord,
    ) -> Result<String, ServiceError> {
        let request = GenerateCitationRequest {
            source_type,
            style,
            url,
            title: &metadata.title,
            author: &metadata.author,
            date: &metadata.date,
            publisher: &metadata.publisher,
        };

        let body: GenerateCitationResponse =
            self.post_json(GENERATE_CITATION_PATH, &request).await?;

        if let Some(error) = body.error {
            return Err(ServiceError::service(error));
        }

        body.citation.ok_or_else(|| {
            ServiceError::transport(
                GENERATE_CITATION_PATH,
                "response contained neither citation nor error",
            )
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::new("http://localhost:5000");
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = CitationApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_generate_citation_request_wire_shape() {
        let metadata = MetadataRecord {
            title: "Example Domain".to_string(),
            author: "Jane Doe".to_string(),
            date: "2024".to_string(),
            publisher: "IANA".to_string(),
        };
        let request = GenerateCitationRequest {
            source_type: SourceType::Website,
            style: Style::Apa,
            url: "https://example.com",
            title: &metadata.title,
            author: &metadata.author,
            date: &metadata.date,
            publisher: &metadata.publisher,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["sourceType"], "website");
        assert_eq!(value["style"], "APA");
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["publisher"], "IANA");
    }

    #[test]
    fn test_metadata_response_accepts_error_with_200_shape() {
        let body: ExtractMetadataResponse =
            serde_json::from_str("{\"error\": \"Failed to extract metadata\"}").unwrap();
        assert_eq!(body.error.as_deref(), Some("Failed to extract metadata"));
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_metadata_response_parses_fields() {
        let body: ExtractMetadataResponse = serde_json::from_str(
            "{\"title\": \"Example\", \"author\": \"\", \"date\": \"2024\", \"publisher\": \"IANA\"}",
        )
        .unwrap();
        assert!(body.error.is_none());
        assert_eq!(body.fields.title, "Example");
        assert_eq!(body.fields.date, "2024");
    }
}
