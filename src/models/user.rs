//! User identity and gamification profile types.
//!
//! The `User` payload is whatever the backend returns for the
//! authenticated account; beyond picking a display name the client
//! treats it as opaque.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub totp_enabled: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Free-form profile metadata; not interpreted client-side.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Best available name for display, falling back to the account id.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Aggregate statistics for the current user (GET /users/me/stats).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub tasks_completed: i64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub achievements_earned: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub points: i64,
}

/// Fields accepted by PATCH /users/me. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
