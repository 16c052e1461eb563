//! Per-user detail records
//!
//! `DetailRecord` mirrors the detail endpoint's envelope exactly, so the
//! bytes written to the cache re-parse into the same value a network
//! response would.

use crate::selection::AggregationKey;
use serde::{Deserialize, Serialize};

/// Detail payload for one user (`{"data": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    /// Stats body
    pub data: UserStats,
}

impl DetailRecord {
    /// Create record from stats body
    #[inline]
    #[must_use]
    pub fn new(data: UserStats) -> Self {
        Self { data }
    }

    /// Record id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// Whether the API finished computing these stats
    ///
    /// Only up-to-date records may be cached or aggregated.
    #[inline]
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.data.is_up_to_date
    }

    /// Breakdown list for a dimension
    #[inline]
    #[must_use]
    pub fn breakdown(&self, key: AggregationKey) -> &[Breakdown] {
        match key {
            AggregationKey::OperatingSystem => &self.data.operating_systems,
            AggregationKey::Editor => &self.data.editors,
            AggregationKey::Language => &self.data.languages,
            AggregationKey::Category => &self.data.categories,
        }
    }

    /// Whether a dimension contains an entry with exactly this name
    #[inline]
    #[must_use]
    pub fn has_entry(&self, key: AggregationKey, name: &str) -> bool {
        self.breakdown(key).iter().any(|b| b.name == name)
    }
}

/// Stats body of a detail record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserStats {
    /// Stats record id
    pub id: String,
    /// Owning user id
    #[serde(default)]
    pub user_id: String,
    /// Public username, if set
    #[serde(default)]
    pub username: Option<String>,
    /// Range key, `last_7_days` for weekly stats
    #[serde(default)]
    pub range: String,
    /// Server-side computation status
    #[serde(default)]
    pub status: String,
    /// Whether the server finished computing these stats
    pub is_up_to_date: bool,
    /// Whether a recomputation is in progress
    #[serde(default)]
    pub is_already_updating: bool,
    /// Coding time across the range
    #[serde(default)]
    pub total_seconds: u64,
    /// Average seconds per day
    #[serde(default)]
    pub daily_average: u64,
    /// Server note, usually absent
    #[serde(default)]
    pub message: Option<String>,
    /// Time per activity category
    #[serde(default)]
    pub categories: Vec<Breakdown>,
    /// Time per editor
    #[serde(default)]
    pub editors: Vec<Breakdown>,
    /// Time per language
    #[serde(default)]
    pub languages: Vec<Breakdown>,
    /// Time per operating system
    #[serde(default)]
    pub operating_systems: Vec<Breakdown>,
}

/// One `{name, total_seconds}` entry of a dimension breakdown
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    /// Entry name, compared case-sensitively
    pub name: String,
    /// Seconds attributed to this entry
    pub total_seconds: u64,
    /// `H:MM` rendering
    #[serde(default)]
    pub digital: String,
    /// Whole hours
    #[serde(default)]
    pub hours: u32,
    /// Minutes past the hour
    #[serde(default)]
    pub minutes: u32,
    /// Share of the record total
    #[serde(default)]
    pub percent: f64,
    /// Human readable duration
    #[serde(default)]
    pub text: String,
}

impl Breakdown {
    /// Create entry with name and seconds; display fields left empty
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, total_seconds: u64) -> Self {
        Self {
            name: name.into(),
            total_seconds,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DETAIL: &str = r#"{"data": {
        "id": "abc",
        "user_id": "abc",
        "username": "ferris",
        "range": "last_7_days",
        "status": "ok",
        "is_up_to_date": true,
        "is_already_updating": false,
        "total_seconds": 9000,
        "categories": [{"name": "Coding", "total_seconds": 9000, "digital": "2:30",
                        "hours": 2, "minutes": 30, "percent": 100.0, "text": "2 hrs 30 mins"}],
        "editors": [{"name": "VS Code", "total_seconds": 9000}],
        "languages": [{"name": "Rust", "total_seconds": 5400},
                      {"name": "Kotlin", "total_seconds": 3600}],
        "operating_systems": [{"name": "Linux", "total_seconds": 9000}],
        "best_day": {"date": "2019-01-01"}
    }}"#;

    #[test]
    fn detail_decodes_and_selects_dimensions() {
        let record: DetailRecord = serde_json::from_str(DETAIL).unwrap();

        assert_eq!(record.id(), "abc");
        assert!(record.is_up_to_date());
        assert_eq!(record.breakdown(AggregationKey::Language).len(), 2);
        assert_eq!(record.breakdown(AggregationKey::Editor)[0].name, "VS Code");
        assert_eq!(record.breakdown(AggregationKey::OperatingSystem)[0].total_seconds, 9000);
        assert_eq!(record.breakdown(AggregationKey::Category)[0].hours, 2);
    }

    #[test]
    fn missing_breakdowns_default_to_empty() {
        let record: DetailRecord =
            serde_json::from_str(r#"{"data": {"id": "x", "is_up_to_date": false}}"#).unwrap();

        assert!(!record.is_up_to_date());
        for key in AggregationKey::ALL {
            assert!(record.breakdown(key).is_empty());
        }
    }

    #[test]
    fn serialized_record_reparses_identically() {
        let record: DetailRecord = serde_json::from_str(DETAIL).unwrap();
        let bytes = serde_json::to_vec(&record).unwrap();
        let reparsed: DetailRecord = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(reparsed, record);
    }

    #[test]
    fn has_entry_matches_exact_name() {
        let record: DetailRecord = serde_json::from_str(DETAIL).unwrap();

        assert!(record.has_entry(AggregationKey::Language, "Kotlin"));
        assert!(!record.has_entry(AggregationKey::Language, "kotlin"));
        assert!(!record.has_entry(AggregationKey::Editor, "Kotlin"));
    }
}
