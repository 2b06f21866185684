use std::fmt;

use serde::Serialize;

use crate::state::game::GameState;

/// Lifecycle of a season, derived from the persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonPhase {
    /// Collecting participants; eliminations have not begun.
    Waiting,
    /// At least two participants joined and eliminations are running.
    InProgress,
    /// A single survivor was declared winner; awaiting the next season.
    Finished,
}

impl From<&GameState> for SeasonPhase {
    fn from(state: &GameState) -> Self {
        if state.winner.is_some() {
            SeasonPhase::Finished
        } else if state.started {
            SeasonPhase::InProgress
        } else {
            SeasonPhase::Waiting
        }
    }
}

impl fmt::Display for SeasonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SeasonPhase::Waiting => "waiting for challengers",
            SeasonPhase::InProgress => "battle in progress",
            SeasonPhase::Finished => "season finished",
        };
        f.write_str(label)
    }
}
