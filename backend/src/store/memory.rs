use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::match_model::Match;
use crate::models::match_proposal::{
    MatchProposal, MatchProposalStatus, NewMatchProposal, ProposalSummary, ProposalTransition,
    RefixPolicy, ResolvedProposal, StatusTransition,
};
use crate::models::match_record::{MatchRecord, MatchRecordTotals, MatchRecordValue};
use crate::models::team::Team;
use crate::models::user::User;

use super::{ProposalStore, RecordStore, StoreHealth, TeamDirectory, UserDirectory};

/// In-memory entity store used as a test double.
///
/// A single mutex guards all tables, so every trait call is one atomic step.
pub struct MemoryEntityStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    teams: HashMap<Uuid, Team>,
    /// (team_id, user_id) in join order.
    memberships: Vec<(Uuid, Uuid)>,
    matches: HashMap<Uuid, Match>,
    proposals: HashMap<Uuid, MatchProposal>,
    transitions: Vec<ProposalTransition>,
    records: Vec<MatchRecord>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn insert_user(&self, user: User) {
        self.inner.lock().users.insert(user.id, user);
    }

    pub fn insert_team(&self, team: Team) {
        self.inner.lock().teams.insert(team.id, team);
    }

    pub fn add_member(&self, team_id: Uuid, user_id: Uuid) {
        let mut inner = self.inner.lock();
        if !inner.memberships.contains(&(team_id, user_id)) {
            inner.memberships.push((team_id, user_id));
        }
    }

    pub fn insert_match(&self, m: Match) {
        self.inner.lock().matches.insert(m.id, m);
    }

    /// Records are append-only once written.
    pub fn insert_record(&self, record: MatchRecord) {
        self.inner.lock().records.push(record);
    }
}

impl Default for MemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProposalStore for MemoryEntityStore {
    async fn find_match(&self, match_id: Uuid) -> Result<Option<Match>, ApiError> {
        Ok(self.inner.lock().matches.get(&match_id).cloned())
    }

    async fn insert_proposal(&self, new: NewMatchProposal) -> Result<MatchProposal, ApiError> {
        let now = Utc::now();
        let proposal = MatchProposal {
            id: Uuid::new_v4(),
            match_id: new.match_id,
            user_id: new.user_id,
            team_id: new.team_id,
            content: new.content,
            status: MatchProposalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .proposals
            .insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn find_summary(&self, id: Uuid) -> Result<Option<ProposalSummary>, ApiError> {
        Ok(self.inner.lock().proposals.get(&id).map(ProposalSummary::from))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        to: MatchProposalStatus,
        policy: RefixPolicy,
    ) -> Result<Option<StatusTransition>, ApiError> {
        let mut inner = self.inner.lock();

        let Some(current) = inner.proposals.get(&id).cloned() else {
            return Ok(None);
        };
        let from = current.status;

        if !policy.permits(from, to) {
            return Ok(Some(StatusTransition::Refused { from }));
        }

        // Resolve before mutating so a dangling reference leaves nothing written
        let author = inner
            .users
            .get(&current.user_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User", current.user_id))?;
        let team = match current.team_id {
            Some(team_id) => Some(
                inner
                    .teams
                    .get(&team_id)
                    .cloned()
                    .ok_or_else(|| ApiError::not_found("Team", team_id))?,
            ),
            None => None,
        };

        let now = Utc::now();
        let proposal = MatchProposal {
            status: to,
            updated_at: now,
            ..current
        };
        inner.proposals.insert(id, proposal.clone());
        inner.transitions.push(ProposalTransition {
            id: Uuid::new_v4(),
            proposal_id: id,
            from_status: from,
            to_status: to,
            transitioned_at: now,
        });

        Ok(Some(StatusTransition::Applied {
            from,
            resolved: ResolvedProposal {
                proposal,
                author,
                team,
            },
        }))
    }

    async fn transitions(&self, id: Uuid) -> Result<Option<Vec<ProposalTransition>>, ApiError> {
        let inner = self.inner.lock();
        if !inner.proposals.contains_key(&id) {
            return Ok(None);
        }
        Ok(Some(
            inner
                .transitions
                .iter()
                .filter(|t| t.proposal_id == id)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl RecordStore for MemoryEntityStore {
    async fn grouped_count(&self, team_id: Uuid) -> Result<MatchRecordTotals, ApiError> {
        let inner = self.inner.lock();
        Ok(tally(
            inner
                .records
                .iter()
                .filter(|r| r.team_id == team_id)
                .map(|r| r.result),
        ))
    }
}

/// Win/draw/loss counts in a single pass.
fn tally<I>(results: I) -> MatchRecordTotals
where
    I: IntoIterator<Item = MatchRecordValue>,
{
    results
        .into_iter()
        .fold(MatchRecordTotals::default(), |mut totals, result| {
            match result {
                MatchRecordValue::Win => totals.wins += 1,
                MatchRecordValue::Draw => totals.draws += 1,
                MatchRecordValue::Lose => totals.losses += 1,
            }
            totals
        })
}

#[async_trait]
impl UserDirectory for MemoryEntityStore {
    async fn by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.inner.lock().users.get(&id).cloned())
    }
}

#[async_trait]
impl TeamDirectory for MemoryEntityStore {
    async fn by_id(&self, id: Uuid) -> Result<Option<Team>, ApiError> {
        Ok(self.inner.lock().teams.get(&id).cloned())
    }

    async fn find_all_by_member(&self, user_id: Uuid) -> Result<Vec<Team>, ApiError> {
        let inner = self.inner.lock();
        Ok(inner
            .memberships
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(team_id, _)| inner.teams.get(team_id).cloned())
            .collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryEntityStore {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

pub(crate) mod fixtures {
    use super::*;
    use crate::models::team::SportsCategory;

    pub fn user(nickname: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: format!("{nickname}_login"),
            nickname: nickname.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn team(name: &str, leader_id: Uuid, sports_category: SportsCategory) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sports_category,
            leader_id,
            created_at: Utc::now(),
        }
    }

    pub fn posted_match(author_id: Uuid) -> Match {
        Match {
            id: Uuid::new_v4(),
            title: "Weekend friendly".to_string(),
            author_id,
            created_at: Utc::now(),
        }
    }

    pub fn record(match_id: Uuid, team_id: Uuid, result: MatchRecordValue) -> MatchRecord {
        MatchRecord {
            id: Uuid::new_v4(),
            match_id,
            team_id,
            result,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::match_record::MatchRecordValue::*;
    use crate::models::team::SportsCategory;

    fn new_proposal(match_id: Uuid, user_id: Uuid) -> NewMatchProposal {
        NewMatchProposal {
            match_id,
            user_id,
            team_id: None,
            content: "Up for a game?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transition_refused_leaves_row_untouched() {
        let store = MemoryEntityStore::new();
        let author = user("libero");
        store.insert_user(author.clone());
        let proposal = store
            .insert_proposal(new_proposal(Uuid::new_v4(), author.id))
            .await
            .unwrap();

        let first = store
            .transition_status(proposal.id, MatchProposalStatus::Fixed, RefixPolicy::Reject)
            .await
            .unwrap()
            .unwrap();
        let StatusTransition::Applied { from, resolved } = first else {
            panic!("expected the first transition to apply");
        };
        assert_eq!(from, MatchProposalStatus::Pending);
        assert_eq!(resolved.author, author);
        assert_eq!(resolved.team, None);

        let second = store
            .transition_status(proposal.id, MatchProposalStatus::Fixed, RefixPolicy::Reject)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            second,
            StatusTransition::Refused { from: MatchProposalStatus::Fixed }
        ));
        assert_eq!(
            store.inner.lock().proposals[&proposal.id].updated_at,
            resolved.proposal.updated_at
        );

        let history = store.transitions(proposal.id).await.unwrap().unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_transition_with_dangling_team_writes_nothing() {
        let store = MemoryEntityStore::new();
        let author = user("sweeper");
        store.insert_user(author.clone());
        let missing_team = Uuid::new_v4();
        let proposal = store
            .insert_proposal(NewMatchProposal {
                team_id: Some(missing_team),
                ..new_proposal(Uuid::new_v4(), author.id)
            })
            .await
            .unwrap();

        let err = store
            .transition_status(proposal.id, MatchProposalStatus::Fixed, RefixPolicy::Reject)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { entity: "Team", ref key } if *key == missing_team.to_string()));

        let summary = store.find_summary(proposal.id).await.unwrap().unwrap();
        assert_eq!(summary.status, MatchProposalStatus::Pending);
        assert!(store.transitions(proposal.id).await.unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_tally_counts_each_outcome() {
        assert_eq!(tally(Vec::new()), MatchRecordTotals::default());
        assert_eq!(
            tally([Win, Win, Draw, Lose, Lose, Lose]),
            MatchRecordTotals { wins: 2, draws: 1, losses: 3 }
        );
    }

    #[tokio::test]
    async fn test_transition_unknown_proposal() {
        let store = MemoryEntityStore::new();
        let outcome = store
            .transition_status(Uuid::new_v4(), MatchProposalStatus::Fixed, RefixPolicy::Reapply)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(store.transitions(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_grouped_count_scoped_to_team() {
        let store = MemoryEntityStore::new();
        let match_id = Uuid::new_v4();
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        for result in [Win, Draw, Lose, Win] {
            store.insert_record(record(match_id, ours, result));
        }
        store.insert_record(record(match_id, theirs, Lose));

        let totals = store.grouped_count(ours).await.unwrap();
        assert_eq!(totals, MatchRecordTotals { wins: 2, draws: 1, losses: 1 });
    }

    #[tokio::test]
    async fn test_find_all_by_member_in_join_order() {
        let store = MemoryEntityStore::new();
        let member = user("striker");
        let first = team("Alpha", member.id, SportsCategory::Soccer);
        let second = team("Bravo", member.id, SportsCategory::Baseball);
        store.insert_user(member.clone());
        store.insert_team(first.clone());
        store.insert_team(second.clone());
        store.add_member(first.id, member.id);
        store.add_member(second.id, member.id);
        store.add_member(first.id, member.id);

        let teams = store.find_all_by_member(member.id).await.unwrap();
        assert_eq!(teams, vec![first, second]);
    }
}
