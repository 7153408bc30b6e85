//! Enrichment of metadata records with their full documents.
//!
//! Each record's document is fetched through a [`DocumentSource`]. Fetches
//! may overlap up to a concurrency cap, but results are consumed in input
//! order by a single loop, which is also the only writer of the error log.
//!
//! A failed fetch never drops the record: it is logged, written to the
//! [`ErrorLog`], and the record continues with its base fields only.

use crate::api::DocumentSource;
use crate::error::{Error, Result};
use crate::models::{Enrichment, MetadataRecord};
use crate::outputs::error_log::ErrorLog;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument};

/// Records after enrichment, plus how many fetches failed.
#[derive(Debug)]
pub struct EnrichOutcome {
    /// Same length and order as the input.
    pub records: Vec<MetadataRecord>,
    pub failures: usize,
}

/// Fetch and merge the full document of every record.
///
/// `concurrency` bounds the number of in-flight fetches (values below 1 are
/// treated as 1). Only writing the error log can fail this call.
#[instrument(level = "info", skip_all, fields(records = records.len(), concurrency = concurrency))]
pub async fn enrich_records<S: DocumentSource>(
    source: &S,
    records: Vec<MetadataRecord>,
    concurrency: usize,
    error_log: &ErrorLog,
) -> Result<EnrichOutcome> {
    let total = records.len();
    let mut fetched = stream::iter(records)
        .map(|record| async move {
            let result = source.fetch_document(&record.document_id).await;
            (record, result)
        })
        .buffered(concurrency.max(1));

    let mut enriched = Vec::with_capacity(total);
    let mut failures = 0usize;
    while let Some((mut record, result)) = fetched.next().await {
        match result {
            Ok(content) => {
                debug!(document_id = %record.document_id, "Enriched document");
                record.enrich(Enrichment::from(&content));
            }
            Err(source) => {
                failures += 1;
                let failure = Error::DocumentFetch {
                    document_id: record.document_id.clone(),
                    source,
                };
                error!(document_id = %record.document_id, error = %failure, "Document fetch failed; keeping base metadata");
                error_log.record(&failure).await?;
            }
        }
        enriched.push(record);
    }

    info!(
        total,
        enriched = total - failures,
        failed = failures,
        "Completed document enrichment"
    );
    Ok(EnrichOutcome {
        records: enriched,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::DocumentContent;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Serves a document for every id except the ones listed as failing.
    struct StubSource {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
        /// Earlier ids sleep longer, so completions arrive out of order.
        stagger: bool,
    }

    impl StubSource {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                stagger: false,
            }
        }
    }

    impl DocumentSource for StubSource {
        async fn fetch_document(&self, document_id: &str) -> std::result::Result<DocumentContent, ApiError> {
            let position = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(document_id.to_string());
                calls.len()
            };
            if self.stagger {
                tokio::time::sleep(Duration::from_millis(50 / position as u64)).await;
            }
            if self.failing.contains(document_id) {
                return Err(ApiError::Status {
                    status: 404,
                    body: "document not found".to_string(),
                });
            }
            Ok(serde_json::from_value(json!({
                "author": format!("author of {document_id}"),
                "text": format!("text of {document_id}"),
                "subjects": ["Transport"]
            }))
            .unwrap())
        }
    }

    fn record(id: &str) -> MetadataRecord {
        MetadataRecord {
            document_id: id.to_string(),
            title: format!("Title {id}"),
            publication_name: "Le Devoir".to_string(),
            publication_date: "2023-08-10T00:00:00".to_string(),
            language: "fr".to_string(),
            word_count: "100".to_string(),
            external_link: format!("https://eureka.cc/{id}"),
            api_link: format!("/api/v2/Documents/{id}"),
            in_context: String::new(),
            enrichment: None,
        }
    }

    fn log_lines(log: &ErrorLog) -> Vec<String> {
        std::fs::read_to_string(log.path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_all_fetches_succeed() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        let source = StubSource::new(&[]);

        let outcome = enrich_records(&source, vec![record("a"), record("b"), record("c")], 1, &log)
            .await
            .unwrap();

        assert_eq!(outcome.failures, 0);
        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.records.iter().all(MetadataRecord::is_enriched));
        let first = outcome.records[0].enrichment.as_ref().unwrap();
        assert_eq!(first.author, "author of a");
        assert_eq!(first.subjects, "Transport");
        assert!(log_lines(&log).is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        let source = StubSource::new(&["b"]);

        let outcome = enrich_records(&source, vec![record("a"), record("b"), record("c")], 1, &log)
            .await
            .unwrap();

        assert_eq!(outcome.failures, 1);
        let ids: Vec<_> = outcome.records.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(outcome.records[0].is_enriched());
        assert!(!outcome.records[1].is_enriched());
        assert_eq!(outcome.records[1], record("b"));
        assert!(outcome.records[2].is_enriched());

        let lines = log_lines(&log);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "Error fetching document with ID b: HTTP 404: document not found"
        );
    }

    #[tokio::test]
    async fn test_every_fetch_failing_keeps_every_record() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        let ids = ["a", "b", "c", "d"];
        let source = StubSource::new(&ids);

        let records = ids.iter().map(|id| record(id)).collect();
        let outcome = enrich_records(&source, records, 2, &log).await.unwrap();

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.failures, 4);
        assert_eq!(log_lines(&log).len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_preserve_order() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        let mut source = StubSource::new(&["c"]);
        source.stagger = true;

        let ids = ["a", "b", "c", "d", "e"];
        let records = ids.iter().map(|id| record(id)).collect();
        let outcome = enrich_records(&source, records, 4, &log).await.unwrap();

        let out: Vec<_> = outcome.records.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(out, ids);
        assert_eq!(source.calls.lock().unwrap().len(), 5);
        assert!(!outcome.records[2].is_enriched());
        assert_eq!(
            outcome.records[4].enrichment.as_ref().unwrap().text,
            "text of e"
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::new(dir.path().join("errors.log"));
        let source = StubSource::new(&[]);

        let outcome = enrich_records(&source, Vec::new(), 0, &log).await.unwrap();
        assert!(outcome.records.is_empty());
        assert!(!log.path().exists());
    }
}
