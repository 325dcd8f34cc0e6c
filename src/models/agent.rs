//! Agent resource types (GET/POST /agents).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub tasks_completed: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a new agent.
#[derive(Debug, Clone, Serialize)]
pub struct NewAgent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tool identifiers the agent is allowed to use.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

/// Result of running an agent against a message (POST /agents/{id}/run).
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRunResult {
    #[serde(default, alias = "response", alias = "output")]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
