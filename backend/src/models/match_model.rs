use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A posted match that proposals target
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}
