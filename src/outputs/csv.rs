//! Append-only CSV sink for harvested records.
//!
//! Each batch is serialized in memory with the `csv` crate and then appended
//! to the target file in one write. The header row is emitted only when the
//! file is absent or empty, so repeated runs against the same path keep a
//! single header. Rows are never deduplicated.

use crate::error::Result;
use crate::models::MetadataRecord;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// One CSV row. Field order is column order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Document ID")]
    document_id: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Publication Name")]
    publication_name: &'a str,
    #[serde(rename = "Publication Date")]
    publication_date: &'a str,
    #[serde(rename = "Language")]
    language: &'a str,
    #[serde(rename = "Word Count")]
    word_count: &'a str,
    #[serde(rename = "External Link")]
    external_link: &'a str,
    #[serde(rename = "API Link")]
    api_link: &'a str,
    #[serde(rename = "In Context")]
    in_context: &'a str,
    #[serde(rename = "Author")]
    author: Option<&'a str>,
    #[serde(rename = "Section")]
    section: Option<&'a str>,
    #[serde(rename = "Full Text")]
    text: Option<&'a str>,
    #[serde(rename = "Kicker")]
    kicker: Option<&'a str>,
    #[serde(rename = "Coverage")]
    coverage: Option<&'a str>,
    #[serde(rename = "Subjects")]
    subjects: Option<&'a str>,
    #[serde(rename = "Persons")]
    persons: Option<&'a str>,
    #[serde(rename = "Organizations")]
    organizations: Option<&'a str>,
    #[serde(rename = "Locations")]
    locations: Option<&'a str>,
    #[serde(rename = "Lead")]
    lead: Option<&'a str>,
}

impl<'a> From<&'a MetadataRecord> for CsvRow<'a> {
    fn from(record: &'a MetadataRecord) -> Self {
        let e = record.enrichment.as_ref();
        CsvRow {
            document_id: &record.document_id,
            title: &record.title,
            publication_name: &record.publication_name,
            publication_date: &record.publication_date,
            language: &record.language,
            word_count: &record.word_count,
            external_link: &record.external_link,
            api_link: &record.api_link,
            in_context: &record.in_context,
            author: e.map(|e| e.author.as_str()),
            section: e.map(|e| e.section.as_str()),
            text: e.map(|e| e.text.as_str()),
            kicker: e.map(|e| e.kicker.as_str()),
            coverage: e.map(|e| e.coverage.as_str()),
            subjects: e.map(|e| e.subjects.as_str()),
            persons: e.map(|e| e.persons.as_str()),
            organizations: e.map(|e| e.organizations.as_str()),
            locations: e.map(|e| e.locations.as_str()),
            lead: e.map(|e| e.lead.as_str()),
        }
    }
}

/// Append a batch of records to the CSV file at `path`.
///
/// Creates missing parent directories. An empty batch leaves the filesystem
/// untouched. Returns the number of data rows written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), records = records.len()))]
pub async fn append_batch(path: &Path, records: &[MetadataRecord]) -> Result<usize> {
    if records.is_empty() {
        debug!("Empty batch; nothing to append");
        return Ok(0);
    }

    let write_header = match fs::metadata(path).await {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    info!(rows = records.len(), header = write_header, "Appended batch to CSV");
    Ok(records.len())
}
