//! Loading of the `pre` and `post` XML snapshots from disk.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Locations of the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub pre: PathBuf,
    pub post: PathBuf,
}

/// Contents of both snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPair {
    pub pre: String,
    pub post: String,
}

impl DocumentPaths {
    pub fn new(pre: impl Into<PathBuf>, post: impl Into<PathBuf>) -> Self {
        Self {
            pre: pre.into(),
            post: post.into(),
        }
    }

    /// Read both files. Invalid UTF-8 is replaced rather than rejected.
    pub async fn read(&self) -> Result<DocumentPair, DocumentError> {
        Ok(DocumentPair {
            pre: read_lossy(&self.pre).await?,
            post: read_lossy(&self.post).await?,
        })
    }

    /// Read both files, keeping at most `max_chars` characters of each.
    pub async fn read_truncated(&self, max_chars: usize) -> Result<DocumentPair, DocumentError> {
        let pair = self.read().await?;
        Ok(DocumentPair {
            pre: truncate_chars(&pair.pre, max_chars).to_string(),
            post: truncate_chars(&pair.post, max_chars).to_string(),
        })
    }
}

async fn read_lossy(path: &Path) -> Result<String, DocumentError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The first `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
