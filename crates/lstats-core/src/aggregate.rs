//! Dimensional aggregation
//!
//! Flatten one breakdown dimension across records, sum seconds per name,
//! rank descending and keep the top N. Groups with equal sums keep the
//! order in which their names were first seen.

use crate::config::TopN;
use indexmap::IndexMap;
use lstats_model::{AggregationKey, Cohort, DetailRecord};
use serde::Serialize;

/// Summed seconds for one name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotal {
    /// Breakdown entry name (language, editor, ...)
    pub name: String,
    /// Seconds summed across records
    pub total_seconds: u64,
}

impl GroupTotal {
    /// Create group total
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, total_seconds: u64) -> Self {
        Self {
            name: name.into(),
            total_seconds,
        }
    }
}

/// Ranked rows for one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionTable {
    /// Aggregated dimension
    pub key: AggregationKey,
    /// Top rows, highest total first
    pub rows: Vec<GroupTotal>,
}

/// Every dimension for one cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortReport {
    /// Cohort label
    pub label: String,
    /// Records in the cohort
    pub population: usize,
    /// One table per dimension, in `AggregationKey::ALL` order
    pub tables: Vec<DimensionTable>,
}

impl CohortReport {
    /// Table for a dimension
    #[must_use]
    pub fn table(&self, key: AggregationKey) -> Option<&DimensionTable> {
        self.tables.iter().find(|t| t.key == key)
    }
}

/// Groups, sums and ranks breakdowns
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    top_n: TopN,
}

impl Aggregator {
    /// Create aggregator with per-dimension row limits
    #[inline]
    #[must_use]
    pub fn new(top_n: TopN) -> Self {
        Self { top_n }
    }

    /// Top `top_n` names of dimension `key`, by summed seconds
    pub fn aggregate<'a>(
        records: impl IntoIterator<Item = &'a DetailRecord>,
        key: AggregationKey,
        top_n: usize,
    ) -> Vec<GroupTotal> {
        let mut groups: IndexMap<&'a str, u64> = IndexMap::new();
        for record in records {
            for entry in record.breakdown(key) {
                let sum = groups.entry(entry.name.as_str()).or_insert(0);
                *sum = sum.saturating_add(entry.total_seconds);
            }
        }

        let mut totals: Vec<GroupTotal> = groups
            .into_iter()
            .map(|(name, total_seconds)| GroupTotal::new(name, total_seconds))
            .collect();
        // Stable sort: ties keep first-seen order
        totals.sort_by(|a, b| b.total_seconds.cmp(&a.total_seconds));
        totals.truncate(top_n);
        totals
    }

    /// All four dimensions over the members of `cohort`
    #[must_use]
    pub fn sweep(&self, records: &[DetailRecord], cohort: &Cohort) -> CohortReport {
        let members = cohort.select(records);
        let tables = AggregationKey::ALL
            .into_iter()
            .map(|key| DimensionTable {
                key,
                rows: Self::aggregate(members.iter().copied(), key, self.top_n.for_key(key)),
            })
            .collect();

        tracing::debug!(cohort = cohort.label(), population = members.len(), "cohort aggregated");
        CohortReport {
            label: cohort.label().to_string(),
            population: members.len(),
            tables,
        }
    }
}
