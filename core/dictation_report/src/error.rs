use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("dictation history not found at {} ({reason})", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("could not write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wrote {written} of {expected} daily notes")]
    NotesIncomplete { written: usize, expected: usize },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub fn store_unavailable<S: Into<String>>(path: impl Into<PathBuf>, reason: S) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }
}
