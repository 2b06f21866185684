//! Arena state and the pure transition core operating on it.

pub mod game;
pub mod normalize;
pub mod phase;
pub mod random;
pub mod transitions;

pub use self::game::{GameState, WinnerRecord};
pub use self::normalize::normalize;
pub use self::phase::SeasonPhase;
pub use self::random::{IndexSource, SeededIndex, SequenceIndex, ThreadIndex, index_source};
pub use self::transitions::{
    JoinOutcome, JoinRejection, Schedule, TickOutcome, elimination_due, join, reset_season, tick,
};
