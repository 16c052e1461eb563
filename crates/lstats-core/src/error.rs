//! Error types for lstats core
//!
//! Only failures that abort the run are errors here. Expected detail-fetch
//! failures (timeouts, bad statuses, stale payloads, ...) are classified
//! into `FetchDiagnostic`s by the fetcher and never surface as `Err`.

use lstats_cache::CacheError;
use std::path::PathBuf;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A listing page could not be retrieved; pagination is all-or-nothing
    #[error("listing page {page} failed: {reason}")]
    Pagination {
        /// 1-based page number
        page: u32,
        /// Transport, status or decode failure
        reason: String,
    },

    /// Cache storage failed or held an unreadable entry
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Worker pool failure (panicked or cancelled worker)
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP transport could not be constructed
    #[error("transport setup failed: {0}")]
    TransportSetup(String),
}

impl PipelineError {
    /// Create pagination error
    pub fn pagination(page: u32, reason: impl ToString) -> Self {
        Self::Pagination {
            page,
            reason: reason.to_string(),
        }
    }

    /// Check if error came from the listing stage
    #[inline]
    #[must_use]
    pub fn is_pagination(&self) -> bool {
        matches!(self, Self::Pagination { .. })
    }
}

/// Transport-level failures of a single request
///
/// A non-success HTTP status is not a transport failure; it is carried in
/// the response and judged by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request, socket or connection-acquire timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be read or decoded
    #[error("decode error: {0}")]
    Decode(String),
}

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Pool created with a limit of zero workers
    #[error("worker limit must be at least 1")]
    ZeroLimit,

    /// A worker panicked
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// A worker was cancelled before finishing
    #[error("worker cancelled")]
    WorkerCancelled,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying read failure
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `StatsConfig`
    #[error("cannot parse {path}: {reason}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending config key
        field: &'static str,
        /// Accepted range
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid-value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
