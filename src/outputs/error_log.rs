//! Plain-text, append-only log of document fetch failures.
//!
//! Lines are the `Display` of [`crate::error::Error::DocumentFetch`]:
//! `Error fetching document with ID {id}: {detail}`.

use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// One line per failed document, appended across runs.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one failure as a single line.
    pub async fn record(&self, failure: &impl Display) -> io::Result<()> {
        // Embedded newlines would break the one-line-per-failure layout.
        let line = format!("{}\n", failure.to_string().replace(['\r', '\n'], " "));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
