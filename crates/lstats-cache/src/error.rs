//! Error types for the entity cache

use std::path::PathBuf;

/// Errors during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Id cannot be used as a cache key
    #[error("invalid cache key: '{0}'")]
    InvalidKey(String),

    /// Entry exists but does not parse as a detail record
    #[error("corrupt cache entry for {id}: {reason}")]
    Corrupt {
        /// Entry key
        id: String,
        /// Parser message
        reason: String,
    },

    /// Record could not be serialized
    #[error("cannot serialize record {id}: {reason}")]
    Serialize {
        /// Record key
        id: String,
        /// Serializer message
        reason: String,
    },

    /// IO error on the cache directory
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt-entry error
    pub fn corrupt(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}
