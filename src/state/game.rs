use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::normalize::RawGameState;

/// Season number used for a brand new arena.
pub const FIRST_SEASON: u64 = 1;

/// Complete persisted state of the arena.
///
/// Deserialization always goes through [`RawGameState`], so any JSON object yields a
/// value that satisfies the invariants below:
///
/// * `alive` and `eliminated` hold unique identifiers and are disjoint.
/// * `winner`, when set, is a member of `alive`.
/// * `winners` holds at most one record per season.
/// * `season` is at least [`FIRST_SEASON`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawGameState")]
pub struct GameState {
    /// Current season, incremented only by a season reset.
    pub season: u64,
    /// True while eliminations are running.
    pub started: bool,
    /// Surviving participants in join order.
    pub alive: IndexSet<String>,
    /// Eliminated participants in elimination order.
    pub eliminated: IndexSet<String>,
    /// Last survivor of the current season, once declared.
    pub winner: Option<String>,
    /// Human readable description of the latest transition.
    pub last_event: String,
    /// When the next scheduled elimination becomes due.
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub next_elimination_time: Option<OffsetDateTime>,
    /// When the last elimination (or win) was processed.
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    pub last_tick_time: Option<OffsetDateTime>,
    /// A winner has been recorded and the season must be reset before new activity.
    pub pending_reset: bool,
    /// Append-only hall of fame, one record per finished season.
    pub winners: Vec<WinnerRecord>,
}

/// Winner of a finished season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerRecord {
    /// Season that was won.
    pub season: u64,
    /// Identifier of the last survivor.
    pub username: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            season: FIRST_SEASON,
            started: false,
            alive: IndexSet::new(),
            eliminated: IndexSet::new(),
            winner: None,
            last_event: String::new(),
            next_elimination_time: None,
            last_tick_time: None,
            pending_reset: false,
            winners: Vec::new(),
        }
    }
}

impl GameState {
    /// Whether a record for `season` is already present in the hall of fame.
    pub fn has_winner_for(&self, season: u64) -> bool {
        self.winners.iter().any(|record| record.season == season)
    }
}
