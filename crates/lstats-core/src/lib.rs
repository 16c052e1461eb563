//! lstats core - leaderboard collection pipeline
//!
//! Drives one run end to end:
//! - Crawls every page of the listing endpoint with a bounded page pool
//! - Fetches each user's detail record through the entity cache
//! - Classifies failed fetches into structured diagnostics and moves on
//! - Aggregates the usable records per dimension and per cohort
//!
//! Two independent ceilings bound concurrency: each fan-out stage runs a
//! fixed number of workers, and [`LimitedTransport`] caps open connections
//! across all stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use lstats_cache::FsEntityCache;
//! use lstats_core::{LimitedTransport, StatsConfig, StatsPipeline};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StatsConfig::new();
//! let transport = Arc::new(LimitedTransport::from_config(&config)?);
//! let cache = Arc::new(FsEntityCache::open(&config.cache_dir).await?);
//!
//! let report = StatsPipeline::new(&config, transport, cache)?.run().await?;
//! println!("aggregated {} records", report.records_used);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod pool;
pub mod transport;

// Re-exports for convenience
pub use aggregate::{Aggregator, CohortReport, DimensionTable, GroupTotal};
pub use classify::{
    Classification, DiagnosticKind, FailureClassifier, FetchDiagnostic, FetchOutcome, FetchTally,
    RecordSource, TallySnapshot,
};
pub use config::{StatsConfig, TopN};
pub use crawler::PageCrawler;
pub use error::{ConfigError, PipelineError, PipelineResult, PoolError, TransportError};
pub use fetcher::DetailFetcher;
pub use pipeline::{StatsPipeline, StatsReport};
pub use pool::BoundedWorkerPool;
pub use transport::{HttpResponse, HttpTransport, LimitedTransport, Transport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the pipeline
    pub use crate::{
        CohortReport, PipelineError, StatsConfig, StatsPipeline, StatsReport, Transport,
    };
    pub use lstats_model::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
