use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "sports_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportsCategory {
    Badminton,
    Soccer,
    Baseball,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub sports_category: SportsCategory,
    pub leader_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamSimpleResponse {
    pub id: Uuid,
    pub name: String,
    pub sports_category: SportsCategory,
}

impl From<&Team> for TeamSimpleResponse {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            sports_category: team.sports_category,
        }
    }
}
