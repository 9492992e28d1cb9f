//! Storage seams.
//!
//! Services take these traits as `Arc<dyn …>` so the same lifecycle and
//! aggregation logic runs against Postgres ([`postgres::PgEntityStore`]) or an
//! in-process fake in tests. Infrastructure failures are returned as
//! [`ApiError::DatabaseError`] and never retried here.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::match_model::Match;
use crate::models::match_proposal::{
    MatchProposal, MatchProposalStatus, NewMatchProposal, ProposalSummary, ProposalTransition,
    RefixPolicy, StatusTransition,
};
use crate::models::match_record::MatchRecordTotals;
use crate::models::team::Team;
use crate::models::user::User;

#[cfg(test)]
pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;

#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, ApiError>;

    /// Insert a proposal in the PENDING state.
    async fn insert_proposal(&self, new: NewMatchProposal) -> Result<MatchProposal, ApiError>;

    async fn find_summary(&self, id: Uuid) -> Result<Option<ProposalSummary>, ApiError>;

    /// Atomically load the proposal, check `policy`, resolve its author and
    /// team, and write `to`.
    ///
    /// Concurrent callers on the same id are serialized. Every applied write
    /// appends a [`ProposalTransition`] inside the same unit of work. A missing
    /// author or team fails with `NotFound` and leaves nothing written. Returns
    /// `None` when the id does not exist.
    async fn transition_status(
        &self,
        id: Uuid,
        to: MatchProposalStatus,
        policy: RefixPolicy,
    ) -> Result<Option<StatusTransition>, ApiError>;

    /// Transition history, oldest first. `None` when the proposal does not exist.
    async fn transitions(&self, id: Uuid) -> Result<Option<Vec<ProposalTransition>>, ApiError>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Win/draw/loss counts for a team in one pass over its records.
    async fn grouped_count(&self, team_id: Uuid) -> Result<MatchRecordTotals, ApiError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
}

#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn by_id(&self, id: Uuid) -> Result<Option<Team>, ApiError>;

    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<Team>, ApiError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), ApiError>;
}

/// Everything one backend provides, so it can be shared behind a single `Arc`.
pub trait EntityStore:
    ProposalStore + RecordStore + UserDirectory + TeamDirectory + StoreHealth
{
}

impl<T> EntityStore for T where
    T: ProposalStore + RecordStore + UserDirectory + TeamDirectory + StoreHealth
{
}
