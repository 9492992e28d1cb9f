use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Already-classified outcome of a match from one team's side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "match_record_value", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchRecordValue {
    Win,
    Draw,
    Lose,
}

/// A row of `match_records`. Rows are written by result finalization, which
/// lives outside this service; only the in-memory store materializes them.
#[cfg(test)]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub id: uuid::Uuid,
    pub match_id: uuid::Uuid,
    pub team_id: uuid::Uuid,
    pub result: MatchRecordValue,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Win/draw/loss summary for a team.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct MatchRecordTotals {
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
}

impl MatchRecordTotals {
    pub fn total(&self) -> i64 {
        self.wins + self.draws + self.losses
    }
}
