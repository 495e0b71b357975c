//! Back-office audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use patra_core::{ActivityId, UserId};

/// A row of `shop.activity_log` with the actor's email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub actor_id: Option<UserId>,
    pub actor_email: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// One mutation to record.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub actor_id: UserId,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
}

impl NewActivity {
    /// An entry about `entity_type` `entity_id`, with empty details.
    #[must_use]
    pub fn new(
        actor_id: UserId,
        action: &'static str,
        entity_type: &'static str,
        entity_id: impl Into<Uuid>,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id: Some(entity_id.into()),
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
