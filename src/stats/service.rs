use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::history::MatchHistoryRepository;
use super::models::{MatchResult, MatchSubmission, PlayerStats, StatsUpdate};
use super::repository::StatsRepository;
use super::StatsError;

/// Suggested bound for match history reads.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Match ingestion service: validates a submission, persists it to the
/// history store, then applies the aggregate update for the reporting
/// player, strictly in that order.
pub struct StatsService {
    stats: Arc<dyn StatsRepository>,
    history: Arc<dyn MatchHistoryRepository>,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsRepository>, history: Arc<dyn MatchHistoryRepository>) -> Self {
        Self { stats, history }
    }

    /// Records one submitted match result.
    ///
    /// Validation failures reject the submission before any write. The
    /// history insert happens first; if the aggregate update then fails,
    /// the history row is kept (it stays auditable) and the error is
    /// surfaced to the caller without retry or rollback. Until a
    /// resubmission succeeds, aggregate totals may lag history.
    #[instrument(skip(self, submission), fields(match_id = %submission.match_id, player_id = %submission.player_id))]
    pub async fn record_match(
        &self,
        submission: MatchSubmission,
    ) -> Result<PlayerStats, StatsError> {
        Self::validate(&submission)?;

        let result = MatchResult {
            match_id: submission.match_id.clone(),
            player_id: submission.player_id,
            is_win: submission.is_win,
            match_date: submission.match_date.unwrap_or_else(Utc::now),
            duration_seconds: submission.duration_seconds,
            units_killed: submission.units_killed,
            units_lost: submission.units_lost,
            base_destroyed: submission.base_destroyed,
            opponent_id: submission.opponent_id,
        };

        self.history.append(&result).await?;

        let username = submission
            .username
            .unwrap_or_else(|| submission.player_id.to_string());
        let stats = self
            .apply_match_result(
                submission.player_id,
                &username,
                submission.is_win,
                submission.units_killed,
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "Aggregate update failed after history write");
                e
            })?;

        debug!(
            total_matches = stats.total_matches,
            "Match result recorded"
        );
        Ok(stats)
    }

    /// Applies one match outcome to the player's aggregate row, creating
    /// the row on first contact. Atomicity is delegated to the store.
    pub async fn apply_match_result(
        &self,
        player_id: Uuid,
        username: &str,
        is_win: bool,
        kills: i32,
    ) -> Result<PlayerStats, StatsError> {
        let update = StatsUpdate {
            player_id,
            username: username.to_string(),
            is_win,
            kills,
        };
        self.stats.apply_match(&update).await
    }

    /// The player's most recent matches, newest first. Pure read.
    pub async fn match_history(
        &self,
        player_id: Uuid,
        limit: u32,
    ) -> Result<Vec<MatchResult>, StatsError> {
        self.history.recent_for_player(player_id, limit).await
    }

    fn validate(submission: &MatchSubmission) -> Result<(), StatsError> {
        if submission.player_id.is_nil() {
            return Err(StatsError::Validation(
                "player id must not be empty".to_string(),
            ));
        }
        if submission.match_id.trim().is_empty() {
            return Err(StatsError::Validation(
                "match id must not be empty".to_string(),
            ));
        }
        if submission.duration_seconds < 0
            || submission.units_killed < 0
            || submission.units_lost < 0
        {
            return Err(StatsError::Validation(
                "duration and unit counts must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
