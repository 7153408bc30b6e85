//! Error types for the harvesting pipeline.
//!
//! Failures fall into two groups:
//! - Fatal conditions that abort the run (authentication, malformed search
//!   results, configuration, persistence). These propagate as [`Error`].
//! - Reported conditions that the pipeline recovers from locally (a failed
//!   search for one interval, a failed document fetch for one record). These
//!   are carried as [`ApiError`] values and logged where they happen.

use thiserror::Error;

/// Result type alias for harvesting operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for eureka_harvest.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file missing, unreadable or invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// The identity endpoint refused the credentials
    #[error("authentication failed: {0}")]
    Authentication(#[source] ApiError),

    /// A search request did not succeed
    #[error("search failed: {0}")]
    Search(#[source] ApiError),

    /// A search result record lacks a field the normalizer requires
    #[error("malformed search result at position {position}: missing `{field}`")]
    MalformedResult {
        /// Zero-based index of the record in the `result` array
        position: usize,
        /// Dotted path of the missing field
        field: &'static str,
    },

    /// A search response body could not be decoded as a result set
    #[error("malformed search response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Fetching or extracting one document failed
    #[error("Error fetching document with ID {document_id}: {source}")]
    DocumentFetch {
        /// Identifier of the document that failed
        document_id: String,
        /// Underlying API failure
        #[source]
        source: ApiError,
    },

    /// Filesystem failure while writing output or the error log
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

/// Failure of a single HTTP exchange with the document API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code returned by the server
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The request never produced a response (connect failure, timeout, ...)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The document response carried no `documentContent` object
    #[error("response has no documentContent")]
    MissingContent,
}
