//! Mapping of raw search results into flat [`MetadataRecord`]s.

use crate::error::{Error, Result};
use crate::models::{
    DocumentLink, MetadataRecord, SearchResultRecord, SearchResultSet, flatten_value,
};

/// Normalize every record of a search response, preserving order.
///
/// A record missing its id, title or either document link fails the whole
/// set; nothing is skipped at this stage.
pub fn normalize(results: SearchResultSet) -> Result<Vec<MetadataRecord>> {
    results
        .result
        .into_iter()
        .enumerate()
        .map(|(position, record)| normalize_record(position, record))
        .collect()
}

fn normalize_record(position: usize, record: SearchResultRecord) -> Result<MetadataRecord> {
    let missing = |field| Error::MalformedResult { position, field };

    Ok(MetadataRecord {
        document_id: record.document_id.ok_or_else(|| missing("documentId"))?,
        title: record.title.ok_or_else(|| missing("title"))?,
        external_link: link(record.external_links).ok_or_else(|| missing("externalLinks.document"))?,
        api_link: link(record.api_links).ok_or_else(|| missing("apiLinks.document"))?,
        publication_name: record.publication_name.unwrap_or_default(),
        publication_date: record.publication_date.unwrap_or_default(),
        language: record.language.unwrap_or_default(),
        word_count: flatten_value(record.word_count.as_ref()),
        in_context: record.in_context.unwrap_or_default(),
        enrichment: None,
    })
}

fn link(links: Option<DocumentLink>) -> Option<String> {
    links.and_then(|l| l.document)
}
