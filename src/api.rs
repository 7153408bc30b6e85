//! Client for the search and document endpoints.
//!
//! # Architecture
//!
//! - [`ApiClient`]: holds the shared HTTP client, the endpoint configuration and
//!   the bearer credential; issues search and document requests
//! - [`DocumentSource`]: the per-document fetch used by the enricher, implemented
//!   by [`ApiClient`] and by in-memory stubs in tests
//!
//! Every call is a single attempt. Non-success statuses are returned as
//! [`ApiError::Status`] carrying the response body; the caller decides whether
//! that is fatal.

use crate::auth::Credential;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    DateRange, DocumentBase, DocumentContent, DocumentResponse, LinkProtocol, SearchResultSet,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Fetch of one full document by id.
pub trait DocumentSource {
    /// Fetch the `documentContent` of the document with the given id.
    async fn fetch_document(&self, document_id: &str) -> Result<DocumentContent, ApiError>;
}

/// Authenticated client for the document API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
    credential: Credential,
}

impl ApiClient {
    pub fn new(http: Client, config: Config, credential: Credential) -> Self {
        Self {
            http,
            config,
            credential,
        }
    }

    /// Advanced search bounded by an explicit date range.
    #[instrument(level = "info", skip(self, range), fields(range = %range))]
    pub async fn search(
        &self,
        query: &str,
        range: DateRange,
        max_count: u32,
        document_base: DocumentBase,
        link_protocol: LinkProtocol,
    ) -> Result<SearchResultSet, ApiError> {
        let url = self
            .config
            .endpoint_url(&self.config.endpoints.search_advanced);
        let start_date = range.start().format("%Y-%m-%d").to_string();
        let end_date = range.end().format("%Y-%m-%d").to_string();
        let max_count = max_count.to_string();
        let params = [
            ("query", query),
            ("documentBase", document_base.as_str()),
            ("docUrl", link_protocol.as_str()),
            ("startDate", start_date.as_str()),
            ("endDate", end_date.as_str()),
            ("maxCount", max_count.as_str()),
        ];
        self.get_json(self.http.get(url).query(&params)).await
    }

    /// Simple search over the trailing `days` days (0 means today only).
    #[instrument(level = "info", skip(self))]
    pub async fn simple_search(
        &self,
        query: &str,
        days: u32,
        max_count: u32,
    ) -> Result<SearchResultSet, ApiError> {
        let url = self.config.endpoint_url(&self.config.endpoints.search_simple);
        let days = days.to_string();
        let max_count = max_count.to_string();
        let params = [
            ("searchText", query),
            ("numberOfDays", days.as_str()),
            ("maxCount", max_count.as_str()),
        ];
        self.get_json(self.http.get(url).query(&params)).await
    }

    fn document_url(&self, document_id: &str) -> String {
        format!(
            "{}{}",
            self.config.endpoint_url(&self.config.endpoints.document),
            urlencoding::encode(document_id)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let t0 = Instant::now();
        let response = request
            .bearer_auth(self.credential.token())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed_ms, "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), elapsed_ms, bytes = body.len(), "API request succeeded");
        Ok(serde_json::from_str(&body)?)
    }
}

impl DocumentSource for ApiClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_document(&self, document_id: &str) -> Result<DocumentContent, ApiError> {
        let url = self.document_url(document_id);
        let response: DocumentResponse = self.get_json(self.http.get(url)).await?;
        response.document_content.ok_or(ApiError::MissingContent)
    }
}
