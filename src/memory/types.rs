//! Memory item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a memory item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A user turn.
    User,
    /// An agent turn or task result.
    Agent,
    /// Service-generated notices (task failures, maintenance).
    System,
}

/// One recorded event in a thread's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique item ID.
    pub id: Uuid,
    /// Position within the owning thread, contiguous from 0.
    pub sequence: u64,
    /// When the item was appended.
    pub timestamp: DateTime<Utc>,
    /// Role/origin tag.
    pub origin: Origin,
    /// Arbitrary structured content.
    pub payload: serde_json::Value,
    /// Optional expiry; expired items are never returned by reads.
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryItem {
    /// Whether the item's expiry has elapsed as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}
