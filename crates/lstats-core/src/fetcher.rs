//! Per-user detail retrieval
//!
//! Cache first; on a miss, one request to the detail endpoint. Only fresh
//! records are written back. Expected failures become diagnostics; cache
//! I/O and corrupt entries propagate.
//!
//! Every outcome is logged as it happens: usable records at `info`, drops
//! at `warn`.

use crate::classify::{Classification, FailureClassifier, FetchOutcome, FetchTally, TallySnapshot};
use crate::config::StatsConfig;
use crate::error::PipelineError;
use crate::transport::Transport;
use lstats_cache::{CacheError, EntityCache};
use lstats_model::{DetailRecord, UserRef};
use std::sync::Arc;
use std::time::Duration;

/// Detail endpoint client backed by the entity cache
pub struct DetailFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn EntityCache>,
    detail_url: String,
    range: String,
    throttle: Duration,
    tally: FetchTally,
}

impl DetailFetcher {
    /// Create fetcher for the endpoint described by `config`
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn EntityCache>,
        config: &StatsConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            detail_url: config.detail_url.trim_end_matches('/').to_string(),
            range: config.range.clone(),
            throttle: config.throttle(),
            tally: FetchTally::default(),
        }
    }

    /// Detail URL for a user id
    #[inline]
    #[must_use]
    pub fn url_for(&self, id: &str) -> String {
        format!("{}/{}/stats/{}", self.detail_url, id, self.range)
    }

    /// Fetch the record for `user`, or nothing if the attempt was dropped
    ///
    /// # Errors
    /// `PipelineError::Cache` if the cache cannot be read or written
    pub async fn fetch(&self, user: &UserRef) -> Result<Option<DetailRecord>, PipelineError> {
        Ok(self.fetch_classified(user).await?.into_record())
    }

    /// Fetch the record for `user` with its classification
    ///
    /// # Errors
    /// `PipelineError::Cache` if the cache cannot be read or written
    pub async fn fetch_classified(&self, user: &UserRef) -> Result<Classification, PipelineError> {
        let url = self.url_for(&user.id);
        let outcome = self.attempt(user, &url).await?;
        self.tally.record(&outcome);

        if let FetchOutcome::FreshFetched(record) = &outcome {
            self.cache.write(&user.id, record).await?;
        }

        let label = outcome.label();
        let classification = FailureClassifier::classify(user, &url, outcome);
        match classification.diagnostic() {
            None => tracing::info!(id = %user.id, outcome = label, "detail record ready"),
            Some(diagnostic) => tracing::warn!(
                id = %user.id,
                user = user.display_name(),
                outcome = label,
                kind = %diagnostic.kind,
                cause = diagnostic.cause.as_deref().unwrap_or(""),
                url = %diagnostic.url,
                "detail record dropped"
            ),
        }
        Ok(classification)
    }

    async fn attempt(&self, user: &UserRef, url: &str) -> Result<FetchOutcome, PipelineError> {
        match self.cache.try_read(&user.id).await {
            Ok(Some(record)) => return Ok(FetchOutcome::from_cache(record)),
            Ok(None) => {}
            Err(CacheError::InvalidKey(id)) => return Ok(FetchOutcome::InvalidId(id)),
            Err(e) => return Err(e.into()),
        }

        if !self.throttle.is_zero() {
            tokio::time::sleep(self.throttle).await;
        }

        Ok(FetchOutcome::from_transport(self.transport.get(url).await))
    }

    /// Outcome counts so far
    #[inline]
    #[must_use]
    pub fn tally(&self) -> TallySnapshot {
        self.tally.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{DiagnosticKind, RecordSource};
    use crate::error::TransportError;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use lstats_cache::MemoryEntityCache;
    use lstats_model::{Breakdown, UserStats};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Cache {}

        #[async_trait]
        impl EntityCache for Cache {
            async fn try_read(&self, id: &str) -> Result<Option<DetailRecord>, CacheError>;
            async fn write(&self, id: &str, record: &DetailRecord) -> Result<(), CacheError>;
            fn entry_count(&self) -> u64;
        }
    }

    /// Always answers with the same response and counts calls
    struct FixedTransport {
        reply: Result<HttpResponse, TransportError>,
        calls: AtomicUsize,
    }

    impl FixedTransport {
        fn new(reply: Result<HttpResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn record(id: &str, up_to_date: bool) -> DetailRecord {
        DetailRecord::new(UserStats {
            id: id.to_string(),
            is_up_to_date: up_to_date,
            languages: vec![Breakdown::new("Rust", 600)],
            ..UserStats::default()
        })
    }

    fn ok_body(record: &DetailRecord) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(200, serde_json::to_vec(record).unwrap()))
    }

    fn fetcher(transport: Arc<FixedTransport>, cache: Arc<dyn EntityCache>) -> DetailFetcher {
        let config = StatsConfig::new().with_detail_url("http://api.test/users/");
        DetailFetcher::new(transport, cache, &config)
    }

    #[test]
    fn url_joins_base_id_and_range() {
        let f = fetcher(
            FixedTransport::new(Err(TransportError::Timeout)),
            Arc::new(MemoryEntityCache::new()),
        );
        assert_eq!(f.url_for("abc"), "http://api.test/users/abc/stats/last_7_days");
    }

    #[tokio::test]
    async fn fresh_fetch_is_cached_and_returned() {
        let transport = FixedTransport::new(ok_body(&record("abc", true)));
        let cache = Arc::new(MemoryEntityCache::new());
        let f = fetcher(Arc::clone(&transport), cache.clone());

        let classified = f.fetch_classified(&UserRef::new("abc")).await.unwrap();

        assert!(matches!(
            classified,
            Classification::Usable { source: RecordSource::Network, .. }
        ));
        assert_eq!(cache.try_read("abc").await.unwrap(), Some(record("abc", true)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() {
        let transport = FixedTransport::new(Err(TransportError::Timeout));
        let cache = Arc::new(MemoryEntityCache::with_records([record("xyz", true)]).await);
        let f = fetcher(Arc::clone(&transport), cache);

        let fetched = f.fetch(&UserRef::new("xyz")).await.unwrap();

        assert_eq!(fetched, Some(record("xyz", true)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.tally().cache_hits, 1);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let transport = FixedTransport::new(ok_body(&record("abc", true)));
        let f = fetcher(Arc::clone(&transport), Arc::new(MemoryEntityCache::new()));

        let first = f.fetch(&UserRef::new("abc")).await.unwrap();
        let second = f.fetch(&UserRef::new("abc")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_record_is_never_written() {
        let transport = FixedTransport::new(ok_body(&record("abc", false)));
        let mut cache = MockCache::new();
        cache.expect_try_read().times(1).returning(|_| Ok(None));
        cache.expect_write().never();
        let f = fetcher(transport, Arc::new(cache));

        let classified = f.fetch_classified(&UserRef::new("abc")).await.unwrap();

        assert_eq!(classified.diagnostic().unwrap().kind, DiagnosticKind::Stale);
        assert_eq!(f.tally().stale, 1);
    }

    #[tokio::test]
    async fn failed_requests_are_never_written() {
        let replies = [
            Ok(HttpResponse::new(500, Vec::new())),
            Err(TransportError::Timeout),
            Err(TransportError::Network("refused".into())),
            Ok(HttpResponse::new(200, b"garbage".to_vec())),
        ];

        for reply in replies {
            let mut cache = MockCache::new();
            cache.expect_try_read().returning(|_| Ok(None));
            cache.expect_write().never();
            let f = fetcher(FixedTransport::new(reply), Arc::new(cache));

            assert_eq!(f.fetch(&UserRef::new("abc")).await.unwrap(), None);
            assert_eq!(f.tally().dropped(), 1);
        }
    }

    #[tokio::test]
    async fn stale_cache_entry_is_dropped_without_refetch() {
        let transport = FixedTransport::new(ok_body(&record("old", true)));
        let mut cache = MockCache::new();
        cache
            .expect_try_read()
            .times(1)
            .returning(|id| Ok(Some(record(id, false))));
        cache.expect_write().never();
        let f = fetcher(Arc::clone(&transport), Arc::new(cache));

        let classified = f.fetch_classified(&UserRef::new("old")).await.unwrap();

        assert_eq!(classified.diagnostic().unwrap().kind, DiagnosticKind::Stale);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        let tally = f.tally();
        assert_eq!((tally.stale, tally.cache_hits, tally.usable()), (1, 0, 0));
    }

    #[tokio::test]
    async fn unusable_id_is_dropped_not_fatal() {
        let transport = FixedTransport::new(ok_body(&record("a/b", true)));
        let f = fetcher(Arc::clone(&transport), Arc::new(MemoryEntityCache::new()));

        let classified = f.fetch_classified(&UserRef::new("a/b")).await.unwrap();

        assert_eq!(classified.diagnostic().unwrap().tag(), "invalid-id");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.tally().invalid_ids, 1);
    }

    #[tokio::test]
    async fn http_error_is_tagged_with_status() {
        let transport = FixedTransport::new(Ok(HttpResponse::new(500, Vec::new())));
        let f = fetcher(transport, Arc::new(MemoryEntityCache::new()));

        let classified = f.fetch_classified(&UserRef::new("abc")).await.unwrap();

        assert_eq!(classified.diagnostic().unwrap().tag(), "http-error:500");
    }

    #[tokio::test]
    async fn cache_write_failure_propagates() {
        let transport = FixedTransport::new(ok_body(&record("abc", true)));
        let mut cache = MockCache::new();
        cache.expect_try_read().returning(|_| Ok(None));
        cache.expect_write().times(1).returning(|id, _| {
            Err(CacheError::io_error(
                format!("/ro/{id}.json"),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        });
        let f = fetcher(transport, Arc::new(cache));

        let result = f.fetch(&UserRef::new("abc")).await;

        assert!(matches!(result, Err(PipelineError::Cache(CacheError::Io { .. }))));
    }

    #[tokio::test]
    async fn corrupt_cache_entry_propagates() {
        let transport = FixedTransport::new(ok_body(&record("abc", true)));
        let mut cache = MockCache::new();
        cache
            .expect_try_read()
            .returning(|id| Err(CacheError::corrupt(id, "eof while parsing")));
        let f = fetcher(Arc::clone(&transport), Arc::new(cache));

        let result = f.fetch(&UserRef::new("abc")).await;

        assert!(matches!(result, Err(PipelineError::Cache(CacheError::Corrupt { .. }))));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
