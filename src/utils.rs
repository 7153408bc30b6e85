//! Utility functions for output naming, log formatting and file system checks.

use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Directory name for a search query.
///
/// Percent-encodes the query so that distinct queries (operators and
/// punctuation included) never share a directory, and the original text can
/// be recovered with a URL decoder. Dots are encoded too, so `.` and `..`
/// cannot escape the output directory.
///
/// ```ignore
/// assert_eq!(query_dir_name("REM & Griffintown"), "REM%20%26%20Griffintown");
/// ```
pub fn query_dir_name(query: &str) -> String {
    urlencoding::encode(query).replace('.', "%2E")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
