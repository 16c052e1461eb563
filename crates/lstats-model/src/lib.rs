//! lstats data model
//!
//! Typed records shared by every stage of the collection pipeline:
//! - **Listing**: paginated leaderboard pages and the `UserRef`s they yield
//! - **Detail**: per-user `DetailRecord` payloads with four breakdown dimensions
//! - **Selection**: `AggregationKey` dimensions and `Cohort` filters
//!
//! # Example
//!
//! ```rust
//! use lstats_model::{AggregationKey, Cohort, DetailRecord};
//!
//! let json = r#"{"data": {"id": "u1", "is_up_to_date": true,
//!     "languages": [{"name": "Rust", "total_seconds": 3600}]}}"#;
//! let record: DetailRecord = serde_json::from_str(json).unwrap();
//!
//! let rustaceans = Cohort::using("Rust", AggregationKey::Language, "Rust");
//! assert!(rustaceans.matches(&record));
//! ```

#![warn(missing_docs)]

pub mod duration;
pub mod listing;
pub mod record;
pub mod selection;

// Re-exports
pub use duration::format_hours;
pub use listing::{LeaderEntry, LeaderUser, LeadersPage, RunningTotal, RunningTotalLanguage, UserRef};
pub use record::{Breakdown, DetailRecord, UserStats};
pub use selection::{AggregationKey, Cohort, CohortSpec};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with lstats records
    pub use crate::{
        AggregationKey, Breakdown, Cohort, CohortSpec, DetailRecord, LeadersPage, UserRef,
        UserStats,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
