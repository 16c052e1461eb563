//! Failure classification for detail fetches
//!
//! Every attempt ends in a `FetchOutcome`. The classifier turns it into
//! either a usable record or a `FetchDiagnostic` explaining the drop.

use crate::error::TransportError;
use crate::transport::HttpResponse;
use lstats_model::{DetailRecord, UserRef};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Result of one detail fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Served from the entity cache, no network call made
    CacheHit(DetailRecord),
    /// Cache entry present but not up to date; no network call made
    StaleCached,
    /// Id cannot name a cache entry; no network call made
    InvalidId(String),
    /// Fetched and marked up to date
    FreshFetched(DetailRecord),
    /// Fetched but still being computed upstream
    StaleFetched,
    /// Non-2xx status
    HttpError(u16),
    /// Request or connection timed out
    TransportTimeout,
    /// Connection or protocol failure
    TransportError(String),
    /// Body unreadable or not a detail record
    NetworkOrDecodeError(String),
}

impl FetchOutcome {
    /// Outcome of a cache hit
    #[must_use]
    pub fn from_cache(record: DetailRecord) -> Self {
        if record.is_up_to_date() {
            Self::CacheHit(record)
        } else {
            Self::StaleCached
        }
    }

    /// Outcome of a network attempt
    #[must_use]
    pub fn from_transport(result: Result<HttpResponse, TransportError>) -> Self {
        let response = match result {
            Ok(response) => response,
            Err(TransportError::Timeout) => return Self::TransportTimeout,
            Err(TransportError::Network(cause)) => return Self::TransportError(cause),
            Err(TransportError::Decode(cause)) => return Self::NetworkOrDecodeError(cause),
        };

        if !response.is_success() {
            return Self::HttpError(response.status);
        }

        match serde_json::from_slice::<DetailRecord>(&response.body) {
            Ok(record) if record.is_up_to_date() => Self::FreshFetched(record),
            Ok(_) => Self::StaleFetched,
            Err(e) => Self::NetworkOrDecodeError(e.to_string()),
        }
    }

    /// Short label for log events
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::CacheHit(_) => "cache-hit",
            Self::StaleCached => "stale-cache",
            Self::InvalidId(_) => "invalid-id",
            Self::FreshFetched(_) => "fresh",
            Self::StaleFetched => "stale",
            Self::HttpError(_) => "http-error",
            Self::TransportTimeout => "timeout",
            Self::TransportError(_) => "transport-error",
            Self::NetworkOrDecodeError(_) => "decode-error",
        }
    }
}

/// Why a record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Request or connection timed out
    Timeout,
    /// Connection or protocol failure
    Transport,
    /// Body unreadable or malformed
    Decode,
    /// Non-2xx status
    HttpStatus(u16),
    /// Stats not yet computed upstream
    Stale,
    /// Id unusable as a cache key
    InvalidId,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Transport => f.write_str("transport-error"),
            Self::Decode => f.write_str("decode-error"),
            Self::HttpStatus(status) => write!(f, "http-error:{status}"),
            Self::Stale => f.write_str("stale"),
            Self::InvalidId => f.write_str("invalid-id"),
        }
    }
}

/// Structured record of a dropped fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchDiagnostic {
    /// User id
    pub id: String,
    /// Username, when known
    pub username: Option<String>,
    /// Requested URL
    pub url: String,
    /// Failure kind
    pub kind: DiagnosticKind,
    /// Underlying cause, when there is one
    pub cause: Option<String>,
}

impl FetchDiagnostic {
    /// Stable tag, e.g. `http-error:500`
    #[inline]
    #[must_use]
    pub fn tag(&self) -> String {
        self.kind.to_string()
    }
}

/// Where a usable record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Entity cache
    Cache,
    /// Detail endpoint
    Network,
}

/// Classified fetch result
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Record can be aggregated
    Usable {
        /// Up-to-date record
        record: DetailRecord,
        /// Where it came from
        source: RecordSource,
    },
    /// Nothing produced for this id
    Dropped(FetchDiagnostic),
}

impl Classification {
    /// The usable record, if any
    #[inline]
    #[must_use]
    pub fn into_record(self) -> Option<DetailRecord> {
        match self {
            Self::Usable { record, .. } => Some(record),
            Self::Dropped(_) => None,
        }
    }

    /// The diagnostic, if dropped
    #[inline]
    #[must_use]
    pub fn diagnostic(&self) -> Option<&FetchDiagnostic> {
        match self {
            Self::Usable { .. } => None,
            Self::Dropped(diagnostic) => Some(diagnostic),
        }
    }
}

/// Maps fetch outcomes to usable-or-dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    /// Classify `outcome` of fetching `user` from `url`
    #[must_use]
    pub fn classify(user: &UserRef, url: &str, outcome: FetchOutcome) -> Classification {
        let (kind, cause) = match outcome {
            FetchOutcome::CacheHit(record) => {
                return Classification::Usable {
                    record,
                    source: RecordSource::Cache,
                }
            }
            FetchOutcome::FreshFetched(record) => {
                return Classification::Usable {
                    record,
                    source: RecordSource::Network,
                }
            }
            FetchOutcome::StaleCached => (
                DiagnosticKind::Stale,
                Some("cached record is not up to date".to_string()),
            ),
            FetchOutcome::InvalidId(id) => (
                DiagnosticKind::InvalidId,
                Some(format!("'{id}' cannot name a cache entry")),
            ),
            FetchOutcome::StaleFetched => (DiagnosticKind::Stale, None),
            FetchOutcome::HttpError(status) => (DiagnosticKind::HttpStatus(status), None),
            FetchOutcome::TransportTimeout => (DiagnosticKind::Timeout, None),
            FetchOutcome::TransportError(cause) => (DiagnosticKind::Transport, Some(cause)),
            FetchOutcome::NetworkOrDecodeError(cause) => (DiagnosticKind::Decode, Some(cause)),
        };

        Classification::Dropped(FetchDiagnostic {
            id: user.id.clone(),
            username: user.username.clone(),
            url: url.to_string(),
            kind,
            cause,
        })
    }
}

/// Per-outcome counters, safe to share between workers
#[derive(Debug, Default)]
pub struct FetchTally {
    cache_hits: AtomicUsize,
    stale_cached: AtomicUsize,
    invalid_ids: AtomicUsize,
    fresh: AtomicUsize,
    stale: AtomicUsize,
    http_errors: AtomicUsize,
    timeouts: AtomicUsize,
    transport_errors: AtomicUsize,
    decode_errors: AtomicUsize,
}

impl FetchTally {
    /// Count one outcome
    pub fn record(&self, outcome: &FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::CacheHit(_) => &self.cache_hits,
            FetchOutcome::StaleCached => &self.stale_cached,
            FetchOutcome::InvalidId(_) => &self.invalid_ids,
            FetchOutcome::FreshFetched(_) => &self.fresh,
            FetchOutcome::StaleFetched => &self.stale,
            FetchOutcome::HttpError(_) => &self.http_errors,
            FetchOutcome::TransportTimeout => &self.timeouts,
            FetchOutcome::TransportError(_) => &self.transport_errors,
            FetchOutcome::NetworkOrDecodeError(_) => &self.decode_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    #[must_use]
    pub fn snapshot(&self) -> TallySnapshot {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);
        let fresh = load(&self.fresh);
        let fetched_stale = load(&self.stale);
        let http_errors = load(&self.http_errors);
        let timeouts = load(&self.timeouts);
        let transport_errors = load(&self.transport_errors);
        let decode_errors = load(&self.decode_errors);

        TallySnapshot {
            cache_hits: load(&self.cache_hits),
            fresh,
            stale: fetched_stale + load(&self.stale_cached),
            http_errors,
            timeouts,
            transport_errors,
            decode_errors,
            invalid_ids: load(&self.invalid_ids),
            requests: fresh
                + fetched_stale
                + http_errors
                + timeouts
                + transport_errors
                + decode_errors,
        }
    }
}

/// Outcome counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TallySnapshot {
    /// Up-to-date records served from the cache
    pub cache_hits: usize,
    /// Up-to-date records fetched and cached
    pub fresh: usize,
    /// Records not up to date, fetched or found in the cache
    pub stale: usize,
    /// Non-2xx responses
    pub http_errors: usize,
    /// Timed-out requests
    pub timeouts: usize,
    /// Connection or protocol failures
    pub transport_errors: usize,
    /// Unreadable bodies
    pub decode_errors: usize,
    /// Ids that cannot name a cache entry
    pub invalid_ids: usize,
    /// Detail requests issued
    pub requests: usize,
}

impl TallySnapshot {
    /// Records that can be aggregated
    #[inline]
    #[must_use]
    pub fn usable(&self) -> usize {
        self.cache_hits + self.fresh
    }

    /// Records dropped by classification
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.stale
            + self.http_errors
            + self.timeouts
            + self.transport_errors
            + self.decode_errors
            + self.invalid_ids
    }
}
