use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::match_record::MatchRecordTotals;
use crate::models::team::TeamSimpleResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

/// Display identity of a proposal's author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub nickname: String,
}

impl From<&User> for AuthorResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamRecordResponse {
    pub team: TeamSimpleResponse,
    pub record: MatchRecordTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfileResponse {
    pub nickname: String,
    pub teams: Vec<TeamRecordResponse>,
}
