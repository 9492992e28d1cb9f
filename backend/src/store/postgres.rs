use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::db::DbPool;
use crate::models::match_model::Match;
use crate::models::match_proposal::{
    MatchProposal, MatchProposalStatus, NewMatchProposal, ProposalSummary, ProposalTransition,
    RefixPolicy, ResolvedProposal, StatusTransition,
};
use crate::models::match_record::{MatchRecordTotals, MatchRecordValue};
use crate::models::team::Team;
use crate::models::user::User;

use super::{ProposalStore, RecordStore, StoreHealth, TeamDirectory, UserDirectory};

const PROPOSAL_COLUMNS: &str =
    "id, match_id, user_id, team_id, content, status, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, nickname, created_at";
const TEAM_COLUMNS: &str = "id, name, sports_category, leader_id, created_at";

/// PostgreSQL-backed entity store.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: DbPool,
}

impl PgEntityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn proposal_exists(&self, id: Uuid) -> Result<bool, ApiError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM match_proposals WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ProposalStore for PgEntityStore {
    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, ApiError> {
        let posted = sqlx::query_as::<_, Match>(
            "SELECT id, title, author_id, created_at FROM matches WHERE id = $1",
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(posted)
    }

    async fn insert_proposal(&self, new: NewMatchProposal) -> Result<MatchProposal, ApiError> {
        let proposal = sqlx::query_as::<_, MatchProposal>(&format!(
            r#"
            INSERT INTO match_proposals (id, match_id, user_id, team_id, content, status)
            VALUES ($1, $2, $3, $4, $5, 'PENDING'::match_proposal_status)
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.match_id)
        .bind(new.user_id)
        .bind(new.team_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(proposal)
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<ProposalSummary>, ApiError> {
        let summary = sqlx::query_as::<_, ProposalSummary>(
            r#"
            SELECT id, match_id, user_id AS proposer_id, team_id, status
            FROM match_proposals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        to: MatchProposalStatus,
        policy: RefixPolicy,
    ) -> Result<Option<StatusTransition>, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent transitions on the same proposal queue here
        let current = sqlx::query_as::<_, MatchProposal>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM match_proposals WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        let from = current.status;

        if !policy.permits(from, to) {
            tx.rollback().await?;
            debug!(proposal_id = %id, from = %from, to = %to, "Transition refused");
            return Ok(Some(StatusTransition::Refused { from }));
        }

        // Author and team are share-locked until commit so the response
        // describes exactly what the write committed against
        let author = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR SHARE"
        ))
        .bind(current.user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(author) = author else {
            tx.rollback().await?;
            return Err(ApiError::not_found("User", current.user_id));
        };

        let team = match current.team_id {
            Some(team_id) => {
                let team = sqlx::query_as::<_, Team>(&format!(
                    "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR SHARE"
                ))
                .bind(team_id)
                .fetch_optional(&mut *tx)
                .await?;
                let Some(team) = team else {
                    tx.rollback().await?;
                    return Err(ApiError::not_found("Team", team_id));
                };
                Some(team)
            }
            None => None,
        };

        let updated = sqlx::query_as::<_, MatchProposal>(&format!(
            r#"
            UPDATE match_proposals
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(to)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO match_proposal_transitions (id, proposal_id, from_status, to_status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(StatusTransition::Applied {
            from,
            resolved: ResolvedProposal {
                proposal: updated,
                author,
                team,
            },
        }))
    }

    async fn transitions(&self, id: Uuid) -> Result<Option<Vec<ProposalTransition>>, ApiError> {
        if !self.proposal_exists(id).await? {
            return Ok(None);
        }

        let transitions = sqlx::query_as::<_, ProposalTransition>(
            r#"
            SELECT id, proposal_id, from_status, to_status, transitioned_at
            FROM match_proposal_transitions
            WHERE proposal_id = $1
            ORDER BY transitioned_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(transitions))
    }
}

#[async_trait]
impl RecordStore for PgEntityStore {
    async fn grouped_count(&self, team_id: Uuid) -> Result<MatchRecordTotals, ApiError> {
        // Aggregate without GROUP BY: exactly one row, zeros when nothing matches
        let totals = sqlx::query_as::<_, MatchRecordTotals>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE result = $2) AS wins,
                COUNT(*) FILTER (WHERE result = $3) AS draws,
                COUNT(*) FILTER (WHERE result = $4) AS losses
            FROM match_records
            WHERE team_id = $1
            "#,
        )
        .bind(team_id)
        .bind(MatchRecordValue::Win)
        .bind(MatchRecordValue::Draw)
        .bind(MatchRecordValue::Lose)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}

#[async_trait]
impl UserDirectory for PgEntityStore {
    async fn by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl TeamDirectory for PgEntityStore {
    async fn by_id(&self, id: Uuid) -> Result<Option<Team>, ApiError> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<Team>, ApiError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.sports_category, t.leader_id, t.created_at
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id
            WHERE tm.user_id = $1
            ORDER BY tm.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }
}

#[async_trait]
impl StoreHealth for PgEntityStore {
    async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
