use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::match_record::MatchRecordTotals;
use crate::store::RecordStore;

/// Reduces a team's match records into win/draw/loss totals.
#[derive(Clone)]
pub struct RecordAggregatorService {
    records: Arc<dyn RecordStore>,
}

impl RecordAggregatorService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Totals for a team. Unknown teams and teams without records yield zeros.
    pub async fn totals_for_team(&self, team_id: Uuid) -> Result<MatchRecordTotals, ApiError> {
        let totals = self.records.grouped_count(team_id).await?;

        debug!(
            team_id = %team_id,
            wins = totals.wins,
            draws = totals.draws,
            losses = totals.losses,
            total = totals.total(),
            "Aggregated match records"
        );

        Ok(totals)
    }
}
