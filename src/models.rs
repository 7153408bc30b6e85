//! Data models for search results, documents and harvested records.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`SearchResultSet`] / [`SearchResultRecord`]: raw search responses as returned by the API
//! - [`DocumentResponse`] / [`DocumentContent`]: raw single-document responses
//! - [`MetadataRecord`]: the flat, normalized record written to CSV
//! - [`Enrichment`]: the extended fields merged into a record after its document fetch
//! - Request parameters: [`DocumentBase`], [`LinkProtocol`], [`DateRange`]
//!
//! Wire types use `#[serde(rename_all = "camelCase")]` to match the API's JSON.

use chrono::NaiveDate;
use clap::ValueEnum;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// A search response: the `result` array of document summaries.
#[derive(Debug, Deserialize)]
pub struct SearchResultSet {
    /// Document summaries in the order the API ranked them.
    pub result: Vec<SearchResultRecord>,
}

/// One document summary from a search response.
///
/// Every field is optional on the wire; [`crate::normalize`] decides which
/// ones a usable record must carry.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRecord {
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub publication_name: Option<String>,
    pub publication_code: Option<String>,
    pub publication_date: Option<String>,
    pub language: Option<String>,
    /// Usually an integer, but kept raw so an odd value never fails the set.
    pub word_count: Option<Value>,
    pub in_context: Option<String>,
    pub external_links: Option<DocumentLink>,
    pub api_links: Option<DocumentLink>,
}

/// A `{ "document": "..." }` link object.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentLink {
    pub document: Option<String>,
}

/// Response of the document endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub document_content: Option<DocumentContent>,
}

/// The `documentContent` object of a document response.
///
/// Values are kept as raw JSON because the API returns some of them as
/// strings and others (subjects, persons, ...) as arrays.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentContent {
    pub author: Option<Value>,
    pub section: Option<Value>,
    pub kicker: Option<Value>,
    pub coverage: Option<Value>,
    pub subjects: Option<Value>,
    pub persons: Option<Value>,
    pub organizations: Option<Value>,
    pub locations: Option<Value>,
    pub lead: Option<Value>,
    pub text: Option<Value>,
}

/// A normalized search result, optionally enriched with its full document.
///
/// Enrichment attaches to the record in place, so a record keeps its identity
/// and position whether or not its document fetch succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub document_id: String,
    pub title: String,
    pub publication_name: String,
    pub publication_date: String,
    pub language: String,
    pub word_count: String,
    pub external_link: String,
    pub api_link: String,
    pub in_context: String,
    /// `None` until the document fetch succeeds.
    pub enrichment: Option<Enrichment>,
}

impl MetadataRecord {
    pub fn enrich(&mut self, enrichment: Enrichment) {
        self.enrichment = Some(enrichment);
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }
}

/// Extended fields taken from a document's `documentContent`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub author: String,
    pub section: String,
    pub text: String,
    pub kicker: String,
    pub coverage: String,
    pub subjects: String,
    pub persons: String,
    pub organizations: String,
    pub locations: String,
    pub lead: String,
}

impl From<&DocumentContent> for Enrichment {
    fn from(content: &DocumentContent) -> Self {
        Enrichment {
            author: flatten_value(content.author.as_ref()),
            section: flatten_value(content.section.as_ref()),
            text: flatten_value(content.text.as_ref()),
            kicker: flatten_value(content.kicker.as_ref()),
            coverage: flatten_value(content.coverage.as_ref()),
            subjects: flatten_value(content.subjects.as_ref()),
            persons: flatten_value(content.persons.as_ref()),
            organizations: flatten_value(content.organizations.as_ref()),
            locations: flatten_value(content.locations.as_ref()),
            lead: flatten_value(content.lead.as_ref()),
        }
    }
}

/// Render a JSON value as a single CSV cell.
///
/// Absent and null values become empty strings; arrays are joined with `"; "`.
pub(crate) fn flatten_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| flatten_value(Some(item)))
            .filter(|s| !s.is_empty())
            .join("; "),
        Some(other) => other.to_string(),
    }
}

/// The document base a search runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DocumentBase {
    #[default]
    News,
    Companies,
    Biographies,
}

impl DocumentBase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentBase::News => "News",
            DocumentBase::Companies => "Companies",
            DocumentBase::Biographies => "Biographies",
        }
    }
}

/// Protocol of the external document links the API returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LinkProtocol {
    Http,
    #[default]
    Https,
}

impl LinkProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkProtocol::Http => "http",
            LinkProtocol::Https => "https",
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start` falls after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_SEARCH: &str = r#"{
        "result": [
            {
                "documentId": "news·20230810·LAA·fe18d5b08a53380bba2133259720102e",
                "publicationName": "La Presse+",
                "byLine": "Philippe Teisceira-Lessard",
                "title": "CDPQ Infra reporte son échéance à 2027",
                "publicationDate": "2023-08-10T00:00:00",
                "availableDate": "0001-01-01T00:00:00",
                "publicationTime": "",
                "publicationCode": "LAA",
                "inContext": "... La future station du Réseau express métropolitain ...",
                "language": "fr",
                "wordCount": 775,
                "externalLinks": { "document": "https://nouveau.eureka.cc/WebPages/Document/WsDocViewer.aspx?wsdoc=abc" },
                "apiLinks": { "document": "/api/v2/Documents/news·20230810·LAA·fe18d5b08a53380bba2133259720102e" },
                "attachmentInfos": []
            }
        ]
    }"#;

    #[test]
    fn test_search_result_deserialization() {
        let set: SearchResultSet = serde_json::from_str(SAMPLE_SEARCH).unwrap();
        assert_eq!(set.result.len(), 1);

        let record = &set.result[0];
        assert_eq!(record.publication_name.as_deref(), Some("La Presse+"));
        assert_eq!(record.publication_code.as_deref(), Some("LAA"));
        assert_eq!(record.word_count, Some(json!(775)));
        assert!(
            record
                .api_links
                .as_ref()
                .and_then(|l| l.document.as_deref())
                .unwrap()
                .starts_with("/api/v2/Documents/")
        );
    }

    #[test]
    fn test_search_result_requires_result_array() {
        let parsed = serde_json::from_str::<SearchResultSet>(r#"{"total": 0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_enrichment_defaults_missing_fields_to_empty() {
        let content: DocumentContent =
            serde_json::from_value(json!({ "author": "Jane Roe", "text": "Body" })).unwrap();
        let enrichment = Enrichment::from(&content);

        assert_eq!(enrichment.author, "Jane Roe");
        assert_eq!(enrichment.text, "Body");
        assert_eq!(enrichment.section, "");
        assert_eq!(enrichment.lead, "");
    }

    #[test]
    fn test_enrichment_flattens_arrays_and_nulls() {
        let content: DocumentContent = serde_json::from_value(json!({
            "subjects": ["Transport", "Infrastructure"],
            "persons": [],
            "kicker": null,
            "coverage": 3
        }))
        .unwrap();
        let enrichment = Enrichment::from(&content);

        assert_eq!(enrichment.subjects, "Transport; Infrastructure");
        assert_eq!(enrichment.persons, "");
        assert_eq!(enrichment.kicker, "");
        assert_eq!(enrichment.coverage, "3");
    }

    #[test]
    fn test_enrich_keeps_record_identity() {
        let mut record = MetadataRecord {
            document_id: "doc-1".to_string(),
            title: "Title".to_string(),
            publication_name: String::new(),
            publication_date: String::new(),
            language: String::new(),
            word_count: String::new(),
            external_link: "https://example.com/doc-1".to_string(),
            api_link: "/api/v2/Documents/doc-1".to_string(),
            in_context: String::new(),
            enrichment: None,
        };
        assert!(!record.is_enriched());

        record.enrich(Enrichment {
            author: "A".to_string(),
            ..Enrichment::default()
        });

        assert!(record.is_enriched());
        assert_eq!(record.document_id, "doc-1");
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();

        assert!(DateRange::new(b, a).is_none());
        let range = DateRange::new(a, b).unwrap();
        assert_eq!(range.to_string(), "2023-01-01_2023-03-31");
    }

    #[test]
    fn test_request_parameter_strings() {
        assert_eq!(DocumentBase::default().as_str(), "News");
        assert_eq!(DocumentBase::Biographies.as_str(), "Biographies");
        assert_eq!(LinkProtocol::default().as_str(), "https");
        assert_eq!(LinkProtocol::Http.as_str(), "http");
    }
}
