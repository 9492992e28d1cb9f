use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::models::team::{Team, TeamSimpleResponse};
use crate::models::user::{AuthorResponse, User};

/// Match proposal status - the states of the proposal lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "match_proposal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchProposalStatus {
    Pending,
    Fixed,
}

impl MatchProposalStatus {
    /// Check if a forward transition to another state is valid
    pub fn can_transition_to(&self, to: &MatchProposalStatus) -> bool {
        matches!(
            (self, to),
            (MatchProposalStatus::Pending, MatchProposalStatus::Fixed)
        )
    }

    pub fn valid_next_states(&self) -> Vec<MatchProposalStatus> {
        match self {
            MatchProposalStatus::Pending => vec![MatchProposalStatus::Fixed],
            MatchProposalStatus::Fixed => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchProposalStatus::Fixed)
    }
}

impl std::fmt::Display for MatchProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchProposalStatus::Pending => write!(f, "PENDING"),
            MatchProposalStatus::Fixed => write!(f, "FIXED"),
        }
    }
}

/// What to do when a transition targets the state the proposal is already in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefixPolicy {
    /// Fail with a conflict and leave the row untouched.
    #[default]
    Reject,
    /// Write the same value again and answer as if it were the first call.
    Reapply,
}

impl RefixPolicy {
    pub fn permits(&self, from: MatchProposalStatus, to: MatchProposalStatus) -> bool {
        from.can_transition_to(&to) || (*self == RefixPolicy::Reapply && from == to)
    }
}

impl FromStr for RefixPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(RefixPolicy::Reject),
            "reapply" => Ok(RefixPolicy::Reapply),
            other => Err(anyhow::anyhow!("unknown proposal refix policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MatchProposal {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub content: String,
    pub status: MatchProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight projection of a proposal used for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProposalSummary {
    pub id: Uuid,
    pub match_id: Uuid,
    pub proposer_id: Uuid,
    pub team_id: Option<Uuid>,
    pub status: MatchProposalStatus,
}

impl From<&MatchProposal> for ProposalSummary {
    fn from(proposal: &MatchProposal) -> Self {
        Self {
            id: proposal.id,
            match_id: proposal.match_id,
            proposer_id: proposal.user_id,
            team_id: proposal.team_id,
            status: proposal.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProposalTransition {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub from_status: MatchProposalStatus,
    pub to_status: MatchProposalStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// Outcome of a locked read-modify-write on a proposal's status.
#[derive(Debug, Clone)]
pub enum StatusTransition {
    /// The write went through; author and team were read in the same unit of work.
    Applied {
        from: MatchProposalStatus,
        resolved: ResolvedProposal,
    },
    /// The policy refused the write and nothing changed.
    Refused { from: MatchProposalStatus },
}

/// A proposal together with its author and optional team.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProposal {
    pub proposal: MatchProposal,
    pub author: User,
    pub team: Option<Team>,
}

/// Insert payload for a new PENDING proposal
#[derive(Debug, Clone)]
pub struct NewMatchProposal {
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub content: String,
}

// ===== API DTOs =====

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct CreateProposalDto {
    #[validate(length(min = 1, max = 255))]
    pub content: String,
    pub team_id: Option<Uuid>,
}

/// The counterpart bound to a fixed proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "team", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalCounterpart {
    None,
    Team(TeamSimpleResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedProposalResponse {
    pub id: Uuid,
    pub author: AuthorResponse,
    pub counterpart: ProposalCounterpart,
}

impl From<&ResolvedProposal> for FixedProposalResponse {
    fn from(resolved: &ResolvedProposal) -> Self {
        Self {
            id: resolved.proposal.id,
            author: AuthorResponse::from(&resolved.author),
            counterpart: match &resolved.team {
                Some(team) => ProposalCounterpart::Team(TeamSimpleResponse::from(team)),
                None => ProposalCounterpart::None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionListResponse {
    pub proposal_id: Uuid,
    pub transitions: Vec<ProposalTransition>,
    pub total: usize,
}
