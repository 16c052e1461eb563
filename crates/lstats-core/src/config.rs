//! Pipeline configuration
//!
//! Every field has a default, so an empty TOML file is a valid config.

use crate::error::ConfigError;
use lstats_model::{AggregationKey, CohortSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a collection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Listing endpoint; pages are requested as `?page=N`
    pub listing_url: String,
    /// Detail endpoint base; records live at `<detail_url>/<id>/stats/<range>`
    pub detail_url: String,
    /// Stats range requested from the detail endpoint
    pub range: String,
    /// Directory holding one cached record per user id
    pub cache_dir: PathBuf,
    /// Listing pages fetched concurrently
    pub page_concurrency: usize,
    /// Detail records fetched concurrently
    pub detail_concurrency: usize,
    /// Simultaneous open connections across all stages
    pub max_connections: usize,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Longest wait for a free connection, in seconds
    pub connection_request_timeout_secs: u64,
    /// Delay before each uncached detail request, in milliseconds
    pub throttle_ms: u64,
    /// Rows kept per report table
    pub top_n: TopN,
    /// Named cohorts reported after the whole population
    pub cohorts: Vec<CohortSpec>,
}

impl StatsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not a valid config
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listing_url.trim().is_empty() {
            return Err(ConfigError::invalid("listing_url", "must not be empty"));
        }
        if self.detail_url.trim().is_empty() {
            return Err(ConfigError::invalid("detail_url", "must not be empty"));
        }
        if self.range.trim().is_empty() {
            return Err(ConfigError::invalid("range", "must not be empty"));
        }
        if self.page_concurrency == 0 {
            return Err(ConfigError::invalid("page_concurrency", "must be at least 1"));
        }
        if self.detail_concurrency == 0 {
            return Err(ConfigError::invalid("detail_concurrency", "must be at least 1"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections", "must be at least 1"));
        }
        Ok(())
    }

    /// With listing endpoint
    #[inline]
    #[must_use]
    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = url.into();
        self
    }

    /// With detail endpoint base
    #[inline]
    #[must_use]
    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = url.into();
        self
    }

    /// With cache directory
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// With page and detail concurrency limits
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, pages: usize, details: usize) -> Self {
        self.page_concurrency = pages;
        self.detail_concurrency = details;
        self
    }

    /// With connection cap
    #[inline]
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// With inter-request delay
    #[inline]
    #[must_use]
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle_ms = u64::try_from(throttle.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With cohort definitions, replacing the defaults
    #[inline]
    #[must_use]
    pub fn with_cohorts(mut self, cohorts: Vec<CohortSpec>) -> Self {
        self.cohorts = cohorts;
        self
    }

    /// Inter-request delay
    #[inline]
    #[must_use]
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// TCP connect timeout
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Longest wait for a free connection
    #[inline]
    #[must_use]
    pub fn connection_request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_request_timeout_secs)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://wakatime.com/api/v1/leaders".to_string(),
            detail_url: "https://wakatime.com/api/v1/users".to_string(),
            range: "last_7_days".to_string(),
            cache_dir: PathBuf::from("cache"),
            page_concurrency: 5,
            detail_concurrency: 10,
            max_connections: 5,
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
            connection_request_timeout_secs: 30,
            throttle_ms: 0,
            top_n: TopN::default(),
            cohorts: vec![
                CohortSpec::new("Kotlin", AggregationKey::Language, "Kotlin"),
                CohortSpec::new("IntelliJ", AggregationKey::Editor, "IntelliJ"),
                CohortSpec::new("VS Code", AggregationKey::Editor, "VS Code"),
            ],
        }
    }
}

/// Rows kept per report table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopN {
    /// Rows for the language dimension
    pub language: usize,
    /// Rows for every other dimension
    pub default: usize,
}

impl TopN {
    /// Row limit for a dimension
    #[inline]
    #[must_use]
    pub fn for_key(&self, key: AggregationKey) -> usize {
        match key {
            AggregationKey::Language => self.language,
            _ => self.default,
        }
    }
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            language: 20,
            default: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_run() {
        let config = StatsConfig::default();

        assert_eq!(config.page_concurrency, 5);
        assert_eq!(config.detail_concurrency, 10);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.throttle(), Duration::ZERO);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.top_n.for_key(AggregationKey::Language), 20);
        assert_eq!(config.top_n.for_key(AggregationKey::Editor), 10);
        assert_eq!(config.cohorts.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = StatsConfig::new()
            .with_concurrency(2, 3)
            .with_max_connections(1)
            .with_throttle(Duration::from_millis(250))
            .with_cohorts(Vec::new());

        assert_eq!(config.page_concurrency, 2);
        assert_eq!(config.detail_concurrency, 3);
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.throttle_ms, 250);
        assert!(config.cohorts.is_empty());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = StatsConfig::new().with_concurrency(0, 10).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "page_concurrency", .. }));

        let err = StatsConfig::new().with_max_connections(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_connections", .. }));
    }

    #[test]
    fn load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
cache_dir = "/tmp/lstats"
detail_concurrency = 4

[top_n]
language = 5

[[cohorts]]
label = "Rust"
dimension = "language"
name = "Rust"
"#
        )
        .unwrap();

        let config = StatsConfig::load(file.path()).unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/lstats"));
        assert_eq!(config.detail_concurrency, 4);
        assert_eq!(config.page_concurrency, 5);
        assert_eq!(config.top_n, TopN { language: 5, default: 10 });
        assert_eq!(
            config.cohorts,
            vec![CohortSpec::new("Rust", AggregationKey::Language, "Rust")]
        );
    }

    #[test]
    fn load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "detail_concurrency = \"many\"").unwrap();

        let err = StatsConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_missing_file() {
        let err = StatsConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
