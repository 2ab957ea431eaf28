use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable aggregate row for a single player, unique on `player_id`.
///
/// Rows are created implicitly on the first match result and mutated only
/// through the aggregation arithmetic in [`PlayerStats::record_outcome`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: Uuid,
    pub username: String,
    pub wins: i32,
    pub losses: i32,
    pub total_matches: i32,
    pub kills: i32,
    pub win_streak: i32,
    pub max_win_streak: i32,
    pub last_updated: DateTime<Utc>,
}

impl PlayerStats {
    /// First-match bootstrap: all counters at zero.
    pub fn new(player_id: Uuid, username: String, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            username,
            wins: 0,
            losses: 0,
            total_matches: 0,
            kills: 0,
            win_streak: 0,
            max_win_streak: 0,
            last_updated: now,
        }
    }

    /// Applies one match outcome to the row.
    ///
    /// The username is overwritten on every call (most recent submission
    /// wins). A win extends the streak and may raise the best streak; a
    /// loss resets the streak to zero unconditionally. Callers are
    /// responsible for running this inside whatever critical section the
    /// backing store provides (see `StatsRepository::apply_match`).
    pub fn record_outcome(&mut self, username: &str, is_win: bool, kills: i32, now: DateTime<Utc>) {
        self.username = username.to_string();
        self.total_matches += 1;

        if is_win {
            self.wins += 1;
            self.win_streak += 1;
            if self.win_streak > self.max_win_streak {
                self.max_win_streak = self.win_streak;
            }
        } else {
            self.losses += 1;
            self.win_streak = 0;
        }

        self.kills += kills;
        self.last_updated = now;
    }

    /// Win percentage rounded to two decimals, recomputed on every call.
    /// Never stored, so it cannot go stale.
    pub fn win_rate(&self) -> f64 {
        if self.total_matches > 0 {
            let rate = self.wins as f64 / self.total_matches as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        }
    }
}

/// Immutable record of one player's outcome in one match.
///
/// Each participant submits their own row, so `match_id` is not unique
/// across players. Rows are never updated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: String,
    pub player_id: Uuid,
    pub is_win: bool,
    pub match_date: DateTime<Utc>,
    pub duration_seconds: i32,
    pub units_killed: i32,
    pub units_lost: i32,
    pub base_destroyed: bool,
    pub opponent_id: Option<Uuid>,
}

/// Incoming match-result payload, as submitted by a game server.
///
/// `match_date` defaults to the ingestion time and `username` to the
/// player id rendered as a string when the submitter does not supply them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSubmission {
    pub match_id: String,
    pub player_id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    pub is_win: bool,
    #[serde(default)]
    pub match_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: i32,
    #[serde(default)]
    pub units_killed: i32,
    #[serde(default)]
    pub units_lost: i32,
    #[serde(default)]
    pub base_destroyed: bool,
    #[serde(default)]
    pub opponent_id: Option<Uuid>,
}

/// The per-player delta handed to the stats store for one match.
#[derive(Debug, Clone)]
pub struct StatsUpdate {
    pub player_id: Uuid,
    pub username: String,
    pub is_win: bool,
    pub kills: i32,
}
