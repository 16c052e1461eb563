//! In-memory cache backend using moka
//!
//! Same contract as the on-disk cache, minus persistence. Built without a
//! capacity bound or expiry, so entries are never evicted.

use crate::error::CacheError;
use crate::{check_key, EntityCache};
use async_trait::async_trait;
use lstats_model::DetailRecord;
use moka::future::Cache;
use std::sync::Arc;

/// Process-local detail record cache
#[derive(Debug, Clone)]
pub struct MemoryEntityCache {
    inner: Cache<String, Arc<DetailRecord>>,
}

impl MemoryEntityCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    /// Create cache pre-populated with records keyed by their own id
    pub async fn with_records(records: impl IntoIterator<Item = DetailRecord>) -> Self {
        let cache = Self::new();
        for record in records {
            cache
                .inner
                .insert(record.id().to_string(), Arc::new(record))
                .await;
        }
        cache
    }

    /// Check if cache holds an entry for `id`
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }
}

impl Default for MemoryEntityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityCache for MemoryEntityCache {
    async fn try_read(&self, id: &str) -> Result<Option<DetailRecord>, CacheError> {
        check_key(id)?;
        Ok(self.inner.get(id).await.map(|arc| (*arc).clone()))
    }

    async fn write(&self, id: &str, record: &DetailRecord) -> Result<(), CacheError> {
        check_key(id)?;
        self.inner
            .insert(id.to_string(), Arc::new(record.clone()))
            .await;
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.inner.iter().count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lstats_model::UserStats;

    fn record(id: &str, up_to_date: bool) -> DetailRecord {
        DetailRecord::new(UserStats {
            id: id.to_string(),
            is_up_to_date: up_to_date,
            ..UserStats::default()
        })
    }

    #[tokio::test]
    async fn write_and_read() {
        let cache = MemoryEntityCache::new();

        cache.write("a", &record("a", true)).await.unwrap();

        assert!(cache.contains("a"));
        assert_eq!(cache.try_read("a").await.unwrap(), Some(record("a", true)));
        assert!(cache.try_read("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prepopulated_entries_are_readable() {
        let cache = MemoryEntityCache::with_records([record("x", true), record("y", true)]).await;

        assert!(cache.contains("x"));
        assert!(cache.contains("y"));
        assert_eq!(cache.entry_count(), 2);
    }

    #[tokio::test]
    async fn write_stores_whatever_it_is_given() {
        let cache = MemoryEntityCache::new();

        cache.write("s", &record("s", false)).await.unwrap();

        let stored = cache.try_read("s").await.unwrap().unwrap();
        assert!(!stored.is_up_to_date());
    }
}
