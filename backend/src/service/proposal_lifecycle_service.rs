use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::match_proposal::*;
use crate::store::{ProposalStore, TeamDirectory, UserDirectory};

/// Proposal lifecycle - drives a proposal from PENDING to FIXED
pub struct ProposalLifecycleService {
    proposals: Arc<dyn ProposalStore>,
    users: Arc<dyn UserDirectory>,
    teams: Arc<dyn TeamDirectory>,
    refix_policy: RefixPolicy,
}

impl ProposalLifecycleService {
    pub fn new(
        proposals: Arc<dyn ProposalStore>,
        users: Arc<dyn UserDirectory>,
        teams: Arc<dyn TeamDirectory>,
        refix_policy: RefixPolicy,
    ) -> Self {
        Self {
            proposals,
            users,
            teams,
            refix_policy,
        }
    }

    // =============================================================================
    // PROPOSE
    // =============================================================================

    /// Create a PENDING proposal against a posted match
    pub async fn propose(
        &self,
        user_id: Uuid,
        match_id: Uuid,
        dto: CreateProposalDto,
    ) -> Result<MatchProposal, ApiError> {
        dto.validate()?;

        if self.users.by_id(user_id).await?.is_none() {
            return Err(ApiError::not_found("User", user_id));
        }

        let posted = self
            .proposals
            .find_match(match_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Match", match_id))?;

        if let Some(team_id) = dto.team_id {
            if self.teams.by_id(team_id).await?.is_none() {
                return Err(ApiError::not_found("Team", team_id));
            }
        }

        let proposal = self
            .proposals
            .insert_proposal(NewMatchProposal {
                match_id,
                user_id,
                team_id: dto.team_id,
                content: dto.content,
            })
            .await?;

        info!(
            proposal_id = %proposal.id,
            match_id = %match_id,
            match_title = %posted.title,
            user_id = %user_id,
            team_id = ?proposal.team_id,
            "Match proposal created"
        );

        Ok(proposal)
    }

    // =============================================================================
    // FIX
    // =============================================================================

    /// Fix a proposal (PENDING -> FIXED) and bind its counterpart.
    ///
    /// The author and team are resolved by the store inside the same unit of
    /// work as the status write, so a failed lookup leaves the proposal as it was.
    pub async fn fix(&self, proposal_id: Uuid) -> Result<FixedProposalResponse, ApiError> {
        let outcome = self
            .proposals
            .transition_status(proposal_id, MatchProposalStatus::Fixed, self.refix_policy)
            .await?
            .ok_or_else(|| ApiError::not_found("MatchProposal", proposal_id))?;

        let (from, resolved) = match outcome {
            StatusTransition::Applied { from, resolved } => (from, resolved),
            StatusTransition::Refused { from } => {
                warn!(
                    proposal_id = %proposal_id,
                    from_state = %from,
                    "Rejected transition to FIXED"
                );
                return Err(ApiError::conflict(format!(
                    "Invalid state transition from {} to {} (allowed: {:?})",
                    from,
                    MatchProposalStatus::Fixed,
                    from.valid_next_states()
                )));
            }
        };

        if from.is_terminal() {
            debug!(proposal_id = %proposal_id, "Reapplied FIXED to an already fixed proposal");
        } else {
            info!(proposal_id = %proposal_id, from_state = %from, "Match proposal fixed");
        }

        Ok(FixedProposalResponse::from(&resolved))
    }

    // =============================================================================
    // QUERY METHODS
    // =============================================================================

    pub async fn find_summary(&self, proposal_id: Uuid) -> Result<ProposalSummary, ApiError> {
        self.proposals
            .find_summary(proposal_id)
            .await?
            .ok_or_else(|| ApiError::not_found("MatchProposal", proposal_id))
    }

    pub async fn transitions(&self, proposal_id: Uuid) -> Result<TransitionListResponse, ApiError> {
        let transitions = self
            .proposals
            .transitions(proposal_id)
            .await?
            .ok_or_else(|| ApiError::not_found("MatchProposal", proposal_id))?;

        Ok(TransitionListResponse {
            proposal_id,
            total: transitions.len(),
            transitions,
        })
    }
}
