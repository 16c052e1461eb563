//! Leaderboard listing records
//!
//! One `LeadersPage` is returned per `?page=N` request. Only the user
//! identity is carried forward into the detail stage.

use serde::{Deserialize, Serialize};

/// One page of the leaderboard listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadersPage {
    /// Username of the authenticated caller, if any
    #[serde(default)]
    pub current_user: Option<String>,
    /// Ranked entries on this page
    #[serde(default)]
    pub data: Vec<LeaderEntry>,
    /// Language filter applied to the listing
    #[serde(default)]
    pub language: Option<String>,
    /// Last modification timestamp as sent by the API
    #[serde(default)]
    pub modified_at: String,
    /// 1-based page number
    #[serde(default = "first_page")]
    pub page: u32,
    /// Time range the ranking covers
    #[serde(default)]
    pub range: String,
    /// Total number of pages in the listing
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl LeadersPage {
    /// Users listed on this page, in rank order
    pub fn user_refs(&self) -> impl Iterator<Item = UserRef> + '_ {
        self.data.iter().map(|entry| UserRef::from(&entry.user))
    }
}

/// Ranked leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderEntry {
    /// Position on the leaderboard
    #[serde(default)]
    pub rank: u32,
    /// Totals over the leaderboard range
    #[serde(default)]
    pub running_total: RunningTotal,
    /// Listed user
    pub user: LeaderUser,
}

/// Public profile of a listed user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeaderUser {
    /// Stable user id, used as the detail endpoint key
    pub id: String,
    /// Public username
    #[serde(default)]
    pub username: Option<String>,
    /// Name shown on the leaderboard
    #[serde(default)]
    pub display_name: Option<String>,
    /// Full name, if public
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email, if public
    #[serde(default)]
    pub email: Option<String>,
    /// Whether `email` is shown
    #[serde(default)]
    pub email_public: bool,
    /// Website without scheme
    #[serde(default)]
    pub human_readable_website: Option<String>,
    /// Free-form location
    #[serde(default)]
    pub location: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub photo: Option<String>,
    /// Whether `photo` is shown
    #[serde(default)]
    pub photo_public: bool,
    /// Website URL
    #[serde(default)]
    pub website: Option<String>,
}

/// Running totals attached to a leaderboard entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningTotal {
    /// Seconds over the leaderboard range
    #[serde(default)]
    pub total_seconds: u64,
    /// Average seconds per day
    #[serde(default)]
    pub daily_average: u64,
    /// Rendered `total_seconds`
    #[serde(default)]
    pub human_readable_total: String,
    /// Rendered `daily_average`
    #[serde(default)]
    pub human_readable_daily_average: String,
    /// Per-language totals
    #[serde(default)]
    pub languages: Vec<RunningTotalLanguage>,
    /// Timestamp of the last recomputation
    #[serde(default)]
    pub modified_at: String,
}

/// Per-language total inside a running total
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningTotalLanguage {
    /// Language name
    pub name: String,
    /// Seconds in this language
    #[serde(default)]
    pub total_seconds: u64,
}

/// Reference to a listed user, produced by the crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// Stable user id
    pub id: String,
    /// Username, when the user made it public
    pub username: Option<String>,
}

impl UserRef {
    /// Create user reference
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }

    /// With username
    #[inline]
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Name to show in diagnostics: username when known, id otherwise
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

impl From<&LeaderUser> for UserRef {
    fn from(user: &LeaderUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}
