//! Testing utilities for the lstats workspace
//!
//! Scripted transport, listing/detail payload builders and record fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::DashMap;
use lstats_core::{HttpResponse, Transport, TransportError};
use lstats_model::{Breakdown, DetailRecord, UserStats};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const LISTING_URL: &str = "http://leaders.test/api/v1/leaders";
pub const DETAIL_URL: &str = "http://leaders.test/api/v1/users";

/// Transport answering from a per-URL script
///
/// Unscripted URLs answer 404. Every request is counted and logged, and the
/// peak number of overlapping requests is tracked.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: DashMap<String, Result<HttpResponse, TransportError>>,
    calls: DashMap<String, usize>,
    log: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every request for `delay` before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script the reply for `url`
    #[must_use]
    pub fn reply(self, url: impl Into<String>, reply: Result<HttpResponse, TransportError>) -> Self {
        self.replies.insert(url.into(), reply);
        self
    }

    /// Script a 200 with `body` serialized as JSON
    #[must_use]
    pub fn json(self, url: impl Into<String>, body: &impl Serialize) -> Self {
        self.reply(url, Ok(json_response(body)))
    }

    /// Script a bare status code
    #[must_use]
    pub fn status(self, url: impl Into<String>, status: u16) -> Self {
        self.reply(url, Ok(HttpResponse::new(status, Vec::new())))
    }

    /// Script listing page `page` of `total_pages` holding `ids`
    #[must_use]
    pub fn page(self, page: u32, total_pages: u32, ids: &[&str]) -> Self {
        self.json(page_url(page), &leaders_page(page, total_pages, ids))
    }

    /// Script the detail reply for `record`
    #[must_use]
    pub fn detail(self, record: &DetailRecord) -> Self {
        self.json(detail_url(record.id()), record)
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.get(url).map_or(0, |c| *c)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Detail requests made so far
    pub fn detail_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.key().starts_with(DETAIL_URL))
            .map(|c| *c.value())
            .sum()
    }

    /// Requested URLs in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Most requests observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        *self.calls.entry(url.to_string()).or_insert(0) += 1;
        self.log.lock().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.replies
            .get(url)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new())))
    }
}

pub fn page_url(page: u32) -> String {
    format!("{LISTING_URL}?page={page}")
}

pub fn detail_url(id: &str) -> String {
    format!("{DETAIL_URL}/{id}/stats/last_7_days")
}

pub fn json_response(body: &impl Serialize) -> HttpResponse {
    HttpResponse::new(200, serde_json::to_vec(body).unwrap())
}

/// Listing page payload in the wire shape
pub fn leaders_page(page: u32, total_pages: u32, ids: &[&str]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = ids
        .iter()
        .enumerate()
        .map(|(rank, id)| {
            serde_json::json!({
                "rank": rank + 1,
                "running_total": {"total_seconds": 3600, "languages": []},
                "user": {"id": id, "username": format!("user-{id}")},
            })
        })
        .collect();
    serde_json::json!({
        "data": data,
        "page": page,
        "total_pages": total_pages,
        "range": "last_7_days",
    })
}

/// Builder for detail records
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    stats: UserStats,
}

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            stats: UserStats {
                id: id.to_string(),
                is_up_to_date: true,
                ..UserStats::default()
            },
        }
    }

    #[must_use]
    pub fn stale(mut self) -> Self {
        self.stats.is_up_to_date = false;
        self
    }

    #[must_use]
    pub fn language(mut self, name: &str, seconds: u64) -> Self {
        self.stats.languages.push(Breakdown::new(name, seconds));
        self
    }

    #[must_use]
    pub fn editor(mut self, name: &str, seconds: u64) -> Self {
        self.stats.editors.push(Breakdown::new(name, seconds));
        self
    }

    #[must_use]
    pub fn os(mut self, name: &str, seconds: u64) -> Self {
        self.stats.operating_systems.push(Breakdown::new(name, seconds));
        self
    }

    #[must_use]
    pub fn category(mut self, name: &str, seconds: u64) -> Self {
        self.stats.categories.push(Breakdown::new(name, seconds));
        self
    }

    pub fn build(self) -> DetailRecord {
        DetailRecord::new(self.stats)
    }
}

/// Up-to-date record with the given languages
pub fn record(id: &str, languages: &[(&str, u64)]) -> DetailRecord {
    languages
        .iter()
        .fold(RecordBuilder::new(id), |b, (name, secs)| b.language(name, *secs))
        .build()
}
