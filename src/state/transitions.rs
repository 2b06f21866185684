//! Transition engine: join, tick and season reset over an explicit [`GameState`].
//!
//! Every function here mutates only the state it is handed; time and randomness come
//! in through [`Schedule`] and [`IndexSource`].

use std::fmt;

use time::{Duration, OffsetDateTime};

use crate::state::{
    game::{GameState, WinnerRecord},
    random::IndexSource,
};

/// Clock reading and cadence used to arm the next elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Instant the triggering event is processed at.
    pub now: OffsetDateTime,
    /// Delay between two scheduled eliminations.
    pub interval: Duration,
}

impl Schedule {
    /// Create a schedule reading for `now`.
    pub fn new(now: OffsetDateTime, interval: Duration) -> Self {
        Self { now, interval }
    }

    /// Instant the next elimination becomes due, or `None` when it cannot be represented.
    pub fn next_due(&self) -> Option<OffsetDateTime> {
        self.now.checked_add(self.interval)
    }
}

/// Why a join request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejection {
    /// A winner was declared and the season has not been reset yet.
    SeasonFinished,
    /// Eliminations are already running with several survivors.
    AlreadyStarted,
    /// The participant is already in the arena.
    AlreadyAlive,
    /// The participant was eliminated earlier this season.
    AlreadyEliminated,
}

impl fmt::Display for JoinRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            JoinRejection::SeasonFinished => "the season is over",
            JoinRejection::AlreadyStarted => "the battle has already started",
            JoinRejection::AlreadyAlive => "already in the arena",
            JoinRejection::AlreadyEliminated => "already eliminated this season",
        };
        f.write_str(reason)
    }
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The participant was appended to `alive`; `season_started` is set when this join
    /// brought the arena to two participants.
    Joined {
        /// Whether this join started the season.
        season_started: bool,
    },
    /// The request was turned down and `alive` is unchanged.
    Rejected(JoinRejection),
}

impl JoinOutcome {
    /// Whether the participant was admitted.
    pub fn accepted(&self) -> bool {
        matches!(self, JoinOutcome::Joined { .. })
    }
}

/// Result of a scheduled tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do: no season is running.
    Idle,
    /// One participant was removed and the season continues.
    Eliminated {
        /// The participant that was removed.
        username: String,
        /// Survivors left after the elimination.
        remaining: usize,
    },
    /// The season ended with a single survivor.
    Won {
        /// Participant removed by this tick, when the win followed an elimination.
        eliminated: Option<String>,
        /// The declared winner.
        winner: String,
    },
}

/// Admit `username` to the current season.
///
/// Rejections leave every list untouched; only `last_event` records the outcome.
pub fn join(state: &mut GameState, username: &str, schedule: &Schedule) -> JoinOutcome {
    let rejection = if state.winner.is_some() || state.pending_reset {
        Some(JoinRejection::SeasonFinished)
    } else if state.started && state.alive.len() > 1 {
        Some(JoinRejection::AlreadyStarted)
    } else if state.alive.contains(username) {
        Some(JoinRejection::AlreadyAlive)
    } else if state.eliminated.contains(username) {
        Some(JoinRejection::AlreadyEliminated)
    } else {
        None
    };

    if let Some(rejection) = rejection {
        state.last_event = rejection_message(username, rejection);
        return JoinOutcome::Rejected(rejection);
    }

    state.alive.insert(username.to_owned());

    let season_started = !state.started && state.alive.len() == 2;
    if season_started {
        state.started = true;
        state.next_elimination_time = schedule.next_due();
        state.last_event = format!("{username} joined the arena. The battle has begun!");
    } else {
        state.last_event = format!("{username} joined the arena.");
    }

    JoinOutcome::Joined { season_started }
}

/// Run one scheduled elimination.
///
/// Nothing happens unless a season is running without a declared winner. A single
/// survivor is declared winner without an elimination. Otherwise one survivor, drawn
/// uniformly, is eliminated; if that leaves one survivor the win is declared in the
/// same tick.
pub fn tick<R>(state: &mut GameState, rng: &mut R, schedule: &Schedule) -> TickOutcome
where
    R: IndexSource + ?Sized,
{
    if !state.started || state.alive.is_empty() || state.winner.is_some() {
        return TickOutcome::Idle;
    }

    state.last_tick_time = Some(schedule.now);

    if state.alive.len() == 1 {
        let winner = declare_winner(state);
        state.last_event = format!("{winner} wins season {}!", state.season);
        return TickOutcome::Won {
            eliminated: None,
            winner,
        };
    }

    let len = state.alive.len();
    let index = rng.pick(len) % len;
    let Some(username) = state.alive.shift_remove_index(index) else {
        return TickOutcome::Idle;
    };
    state.eliminated.insert(username.clone());

    if state.alive.len() == 1 {
        let winner = declare_winner(state);
        state.last_event = format!(
            "{username} was eliminated. {winner} wins season {}!",
            state.season
        );
        return TickOutcome::Won {
            eliminated: Some(username),
            winner,
        };
    }

    let remaining = state.alive.len();
    state.next_elimination_time = schedule.next_due();
    state.last_event = format!("{username} was eliminated. {remaining} remain.");
    TickOutcome::Eliminated {
        username,
        remaining,
    }
}

/// Start the next season, keeping only the hall of fame.
pub fn reset_season(state: &mut GameState) {
    let winners = std::mem::take(&mut state.winners);
    let season = state.season.saturating_add(1);
    *state = GameState {
        season,
        winners,
        last_event: format!("Season {season} has begun. Open an issue to join."),
        ..GameState::default()
    };
}

/// Whether a scheduled tick should run at `now`.
pub fn elimination_due(state: &GameState, now: OffsetDateTime) -> bool {
    state.next_elimination_time.is_none_or(|due| now >= due)
}

/// Record the sole survivor as winner and close the season.
fn declare_winner(state: &mut GameState) -> String {
    let winner = state.alive.first().cloned().unwrap_or_default();
    state.winner = Some(winner.clone());
    state.started = false;
    state.pending_reset = true;
    state.next_elimination_time = None;
    if !state.has_winner_for(state.season) {
        state.winners.push(WinnerRecord {
            season: state.season,
            username: winner.clone(),
        });
    }
    winner
}

fn rejection_message(username: &str, rejection: JoinRejection) -> String {
    match rejection {
        JoinRejection::SeasonFinished | JoinRejection::AlreadyStarted => {
            format!("{username} cannot join: {rejection}.")
        }
        JoinRejection::AlreadyAlive => format!("{username} is {rejection}."),
        JoinRejection::AlreadyEliminated => format!("{username} was {rejection}."),
    }
}
