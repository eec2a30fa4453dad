//! Upload staging
//!
//! Uploaded files land in one configured directory that the graph engine's
//! import facility can also read. Client filenames are checked against a
//! strict allow-list before they touch the filesystem.

use crate::error::{IngestError, IngestResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_FILE_NAME_LEN: usize = 255;

/// A client-supplied filename that is safe to join onto the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFileName(String);

impl StagedFileName {
    /// Accepts ASCII letters, digits, `-`, `_`, `.` and space only.
    ///
    /// Rejects path separators, NUL, leading dots and any `..` sequence.
    pub fn parse(raw: &str) -> IngestResult<Self> {
        let reject = |reason: &str| -> IngestResult<Self> {
            Err(IngestError::Validation(format!("filename rejected: {}", reason)))
        };

        if raw.trim().is_empty() {
            return reject("empty filename");
        }
        if raw.len() > MAX_FILE_NAME_LEN {
            return reject("filename too long");
        }
        if raw.contains(['/', '\\']) {
            return reject("path separators are not allowed");
        }
        if raw.chars().any(|c| c.is_control()) {
            return reject("control characters are not allowed");
        }
        if raw.starts_with('.') || raw.contains("..") {
            return reject("leading dots and '..' are not allowed");
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        {
            return reject("only letters, digits, '-', '_', '.' and spaces are allowed");
        }

        Ok(StagedFileName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StagedFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Writes uploads into the staging directory
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
}

impl Stager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a staged file ends up at
    pub fn path_for(&self, name: &StagedFileName) -> PathBuf {
        self.dir.join(name.as_str())
    }

    /// Write `bytes` unmodified to `<dir>/<name>`, creating `<dir>` if needed.
    ///
    /// An existing file of the same name is replaced.
    pub async fn stage(&self, name: &StagedFileName, bytes: &[u8]) -> IngestResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| IngestError::io("creating staging directory", &e))?;

        let path = self.path_for(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| IngestError::io("writing staged file", &e))?;

        debug!(file = %name, bytes = bytes.len(), "staged upload");
        Ok(path)
    }

    /// Read a staged file back
    pub async fn read(&self, name: &StagedFileName) -> IngestResult<Vec<u8>> {
        tokio::fs::read(self.path_for(name))
            .await
            .map_err(|e| IngestError::io("reading staged file", &e))
    }
}
