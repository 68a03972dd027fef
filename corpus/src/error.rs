use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the document and index stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document {0} already exists")]
    AlreadyExists(DocId),

    #[error("document {0} not found")]
    NotFound(DocId),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt index entry {line:?}: {reason}")]
    CorruptIndexEntry { line: String, reason: String },

    #[error("document {id} cannot be stored: {reason}")]
    InvalidDocument { id: DocId, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }

    pub(crate) fn corrupt(line: &str, reason: impl Into<String>) -> Self {
        StoreError::CorruptIndexEntry { line: line.to_string(), reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(StoreError::AlreadyExists(7).to_string(), "document 7 already exists");
        assert_eq!(StoreError::NotFound(3).to_string(), "document 3 not found");
        let err = StoreError::corrupt("abc", "missing url");
        assert_eq!(err.to_string(), "corrupt index entry \"abc\": missing url");
    }

    #[test]
    fn not_found_predicate() {
        assert!(StoreError::NotFound(1).is_not_found());
        assert!(!StoreError::AlreadyExists(1).is_not_found());
    }
}
