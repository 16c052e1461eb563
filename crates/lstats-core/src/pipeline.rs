//! End-to-end collection run
//!
//! crawl → dedupe → fetch details → filter → aggregate per cohort

use crate::aggregate::{Aggregator, CohortReport};
use crate::classify::TallySnapshot;
use crate::config::StatsConfig;
use crate::crawler::PageCrawler;
use crate::error::PipelineError;
use crate::fetcher::DetailFetcher;
use crate::pool::BoundedWorkerPool;
use crate::transport::Transport;
use lstats_cache::EntityCache;
use lstats_model::{Cohort, DetailRecord, UserRef};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of a full run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Users returned by the listing crawl, duplicates included
    pub users_listed: usize,
    /// Up-to-date records that went into aggregation
    pub records_used: usize,
    /// Detail outcome counts
    pub tally: TallySnapshot,
    /// Whole population first, then each configured cohort
    pub cohorts: Vec<CohortReport>,
}

/// Wires crawler, fetcher, pool and aggregator for one run
pub struct StatsPipeline {
    crawler: PageCrawler,
    fetcher: Arc<DetailFetcher>,
    details: BoundedWorkerPool,
    aggregator: Aggregator,
    cohorts: Vec<Cohort>,
}

impl StatsPipeline {
    /// Label of the whole-population cohort
    pub const POPULATION: &'static str = "all";

    /// Create pipeline over `transport` and `cache`
    ///
    /// # Errors
    /// `PipelineError::Config` if `config` fails validation
    pub fn new(
        config: &StatsConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn EntityCache>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let crawler = PageCrawler::new(
            Arc::clone(&transport),
            config.listing_url.clone(),
            config.page_concurrency,
        );
        let fetcher = Arc::new(DetailFetcher::new(transport, cache, config));
        let cohorts = std::iter::once(Cohort::everyone(Self::POPULATION))
            .chain(config.cohorts.iter().map(Cohort::from))
            .collect();

        Ok(Self {
            crawler,
            fetcher,
            details: BoundedWorkerPool::new(config.detail_concurrency).named("details"),
            aggregator: Aggregator::new(config.top_n),
            cohorts,
        })
    }

    /// Replace the configured cohorts; the population cohort stays first
    #[must_use]
    pub fn with_cohorts(mut self, cohorts: impl IntoIterator<Item = Cohort>) -> Self {
        self.cohorts.truncate(1);
        self.cohorts.extend(cohorts);
        self
    }

    /// Cohorts swept by `aggregate`, in report order
    #[inline]
    #[must_use]
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    /// Crawl the listing and fetch every usable record
    ///
    /// # Returns
    /// `(users_listed, records)` with records in completion order
    ///
    /// # Errors
    /// - `PipelineError::Pagination` if the crawl fails
    /// - `PipelineError::Cache` if the cache fails
    /// - `PipelineError::Pool` if a worker dies
    pub async fn collect(&self) -> Result<(usize, Vec<DetailRecord>), PipelineError> {
        let users = self.crawler.crawl().await?;
        let listed = users.len();
        let unique = dedupe(users);
        if unique.len() < listed {
            tracing::info!(
                duplicates = listed - unique.len(),
                "collapsed duplicate user ids"
            );
        }

        tracing::info!(users = unique.len(), "fetching detail records");
        let fetcher = Arc::clone(&self.fetcher);
        let fetched = self
            .details
            .run(unique, move |user| {
                let fetcher = Arc::clone(&fetcher);
                async move { fetcher.fetch(&user).await }
            })
            .await?;

        let usable: Vec<DetailRecord> = fetched.into_iter().flatten().collect();
        let classified = usable.len();
        let records: Vec<DetailRecord> = usable
            .into_iter()
            .filter(DetailRecord::is_up_to_date)
            .collect();
        if records.len() < classified {
            tracing::warn!(
                removed = classified - records.len(),
                "records not up to date removed before aggregation"
            );
        }
        tracing::info!(records = records.len(), "usable detail records");
        Ok((listed, records))
    }

    /// Sweep every dimension for each cohort
    #[must_use]
    pub fn aggregate(&self, records: &[DetailRecord]) -> Vec<CohortReport> {
        self.cohorts
            .iter()
            .map(|cohort| self.aggregator.sweep(records, cohort))
            .collect()
    }

    /// Full run: collect then aggregate
    ///
    /// # Errors
    /// Any fatal error from [`collect`](Self::collect)
    pub async fn run(&self) -> Result<StatsReport, PipelineError> {
        let (users_listed, records) = self.collect().await?;
        let cohorts = self.aggregate(&records);
        let tally = self.fetcher.tally();
        tracing::info!(
            cache_hits = tally.cache_hits,
            fresh = tally.fresh,
            dropped = tally.dropped(),
            "run complete"
        );

        Ok(StatsReport {
            users_listed,
            records_used: records.len(),
            tally,
            cohorts,
        })
    }
}

/// Keep the first occurrence of each id
fn dedupe(users: Vec<UserRef>) -> Vec<UserRef> {
    let mut seen = HashSet::with_capacity(users.len());
    users
        .into_iter()
        .filter(|user| seen.insert(user.id.clone()))
        .collect()
}
