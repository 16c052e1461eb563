//! Aggregation dimensions and cohort filters

use crate::record::DetailRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Breakdown dimension used as a grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKey {
    /// Programming language
    Language,
    /// Operating system
    OperatingSystem,
    /// Editor / IDE
    Editor,
    /// Activity category (coding, debugging, ...)
    Category,
}

impl AggregationKey {
    /// Every dimension, in report order
    pub const ALL: [AggregationKey; 4] = [
        AggregationKey::Language,
        AggregationKey::OperatingSystem,
        AggregationKey::Editor,
        AggregationKey::Category,
    ];

    /// Report title for tables of this dimension
    #[inline]
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Language => "Language stats",
            Self::OperatingSystem => "OS stats",
            Self::Editor => "Editor stats",
            Self::Category => "Category stats",
        }
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Language => "language",
            Self::OperatingSystem => "operating_system",
            Self::Editor => "editor",
            Self::Category => "category",
        };
        f.write_str(name)
    }
}

type Predicate = Arc<dyn Fn(&DetailRecord) -> bool + Send + Sync>;

/// Named subset of records selected by a predicate
#[derive(Clone)]
pub struct Cohort {
    label: String,
    predicate: Predicate,
}

impl Cohort {
    /// Cohort with an arbitrary predicate
    pub fn new(
        label: impl Into<String>,
        predicate: impl Fn(&DetailRecord) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Whole population (always-true predicate)
    pub fn everyone(label: impl Into<String>) -> Self {
        Self::new(label, |_| true)
    }

    /// Records with an entry named `name` in dimension `key`
    pub fn using(label: impl Into<String>, key: AggregationKey, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(label, move |record| record.has_entry(key, &name))
    }

    /// Cohort label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Test a record against the predicate
    #[inline]
    #[must_use]
    pub fn matches(&self, record: &DetailRecord) -> bool {
        (self.predicate)(record)
    }

    /// Records of `records` belonging to this cohort
    #[must_use]
    pub fn select<'a>(&self, records: &'a [DetailRecord]) -> Vec<&'a DetailRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Debug for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cohort").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Serializable cohort definition: "users with `name` in `dimension`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSpec {
    /// Label shown in reports
    pub label: String,
    /// Dimension searched for `name`
    pub dimension: AggregationKey,
    /// Exact entry name (case-sensitive)
    pub name: String,
}

impl CohortSpec {
    /// Create cohort definition
    pub fn new(label: impl Into<String>, dimension: AggregationKey, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            dimension,
            name: name.into(),
        }
    }
}

impl From<&CohortSpec> for Cohort {
    fn from(spec: &CohortSpec) -> Self {
        Cohort::using(spec.label.clone(), spec.dimension, spec.name.clone())
    }
}
