use std::sync::Arc;

use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::team::TeamSimpleResponse;
use crate::models::user::{TeamRecordResponse, UserProfileResponse};
use crate::service::record_aggregator_service::RecordAggregatorService;
use crate::store::{TeamDirectory, UserDirectory};

/// Builds a user's profile from their nickname, teams, and each team's record totals.
pub struct ProfileService {
    users: Arc<dyn UserDirectory>,
    teams: Arc<dyn TeamDirectory>,
    records: RecordAggregatorService,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        teams: Arc<dyn TeamDirectory>,
        records: RecordAggregatorService,
    ) -> Self {
        Self {
            users,
            teams,
            records,
        }
    }

    pub async fn find_profile(&self, user_id: Uuid) -> Result<UserProfileResponse, ApiError> {
        let user = self
            .users
            .by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", user_id))?;

        let mut teams = Vec::new();
        for team in self.teams.find_all_by_member(user_id).await? {
            // Totals are final; outcomes are never re-derived here
            let record = self.records.totals_for_team(team.id).await?;
            teams.push(TeamRecordResponse {
                team: TeamSimpleResponse::from(&team),
                record,
            });
        }

        Ok(UserProfileResponse {
            nickname: user.nickname,
            teams,
        })
    }
}
