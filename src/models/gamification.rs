//! Leaderboard types (GET /leaderboard/{category}).

use serde::{Deserialize, Serialize};

/// Leaderboard categories offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardCategory {
    Earnings,
    Tasks,
    Rating,
}

impl LeaderboardCategory {
    /// Path segment used in the leaderboard endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardCategory::Earnings => "earnings",
            LeaderboardCategory::Tasks => "tasks",
            LeaderboardCategory::Rating => "rating",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "earnings" => Some(LeaderboardCategory::Earnings),
            "tasks" => Some(LeaderboardCategory::Tasks),
            "rating" => Some(LeaderboardCategory::Rating),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub rank: Option<i64>,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub score: f64,
}

impl LeaderboardEntry {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.user_id)
    }
}
