use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::stats::PlayerStats;

/// One computed leaderboard row. Ephemeral: built on demand from the
/// current stats snapshot, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub player_id: Uuid,
    pub username: String,
    pub wins: i32,
    pub losses: i32,
    pub total_matches: i32,
    pub win_rate: f64,
    pub kills: i32,
    pub win_streak: i32,
    pub last_updated: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn from_stats(rank: u64, stats: &PlayerStats) -> Self {
        Self {
            rank,
            player_id: stats.player_id,
            username: stats.username.clone(),
            wins: stats.wins,
            losses: stats.losses,
            total_matches: stats.total_matches,
            // Recomputed here so the entry can never carry a stale rate.
            win_rate: stats.win_rate(),
            kills: stats.kills,
            win_streak: stats.win_streak,
            last_updated: stats.last_updated,
        }
    }
}
