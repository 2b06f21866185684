//! Maps one inbound trigger onto the transition engine, commits the result and fires the
//! advisory side channel.
//!
//! One invocation reads the store once and writes it once, or twice when a win is
//! followed by an immediate season reset. There is no locking: correctness relies on the
//! hosting environment never running two invocations against the same store at once.

use std::{path::PathBuf, sync::Arc};

use time::{Duration, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::{
    config::{AppConfig, ResetMode},
    dao::{state_store::StateStore, storage::write_atomically},
    dto::Trigger,
    error::DispatchError,
    services::{notifier::IssueNotifier, render::render_status_page},
    state::{
        GameState, IndexSource, JoinOutcome, Schedule, SeasonPhase, TickOutcome, elimination_due,
        join, normalize, reset_season, tick,
    },
};

/// What the dispatcher did with a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A join request was processed.
    Join(JoinOutcome),
    /// A scheduled tick ran.
    Tick(TickOutcome),
    /// A scheduled tick fired before the next elimination was due.
    NotDue {
        /// When the elimination becomes due.
        due: Option<OffsetDateTime>,
    },
    /// Only the status page was regenerated.
    Render,
}

/// Summary of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Outcome of the trigger itself.
    pub action: Action,
    /// A finished season was cleared before the trigger was applied.
    pub reset_before: bool,
    /// A finished season was cleared right after being committed.
    pub reset_after: bool,
    /// Number of times the store was written.
    pub writes: usize,
    /// Every status page write of this invocation succeeded.
    pub readme_written: bool,
    /// Season after the invocation.
    pub season: u64,
    /// Phase after the invocation.
    pub phase: SeasonPhase,
}

/// Event dispatcher owning the collaborators of a single invocation.
pub struct Dispatcher {
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn IssueNotifier>,
    rng: Box<dyn IndexSource + Send>,
    readme_path: PathBuf,
    repository: Option<String>,
    interval: Duration,
    reset_mode: ResetMode,
}

impl Dispatcher {
    /// Wire a dispatcher from explicit configuration and collaborators.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn IssueNotifier>,
        rng: Box<dyn IndexSource + Send>,
    ) -> Self {
        Self {
            store,
            notifier,
            rng,
            readme_path: config.readme_path.clone(),
            repository: config.repository.clone(),
            interval: config.elimination_interval,
            reset_mode: config.reset_mode,
        }
    }

    /// Process `trigger` as of `now`.
    ///
    /// Only store write failures are returned. A failed status page write or
    /// acknowledgement is logged and the invocation carries on.
    pub async fn dispatch(
        &mut self,
        trigger: Trigger,
        now: OffsetDateTime,
    ) -> Result<DispatchReport, DispatchError> {
        let mut state = self.load_state().await;
        let schedule = Schedule::new(now, self.interval);
        let mut reset_before = false;
        let mut acknowledgement = None;

        let action = match trigger {
            Trigger::Render => Action::Render,
            Trigger::Join(request) => {
                reset_before = reset_if_pending(&mut state);
                let outcome = join(&mut state, &request.username, &schedule);
                match outcome {
                    JoinOutcome::Joined { season_started } => info!(
                        username = %request.username,
                        season = state.season,
                        alive = state.alive.len(),
                        season_started,
                        "participant joined"
                    ),
                    JoinOutcome::Rejected(reason) => info!(
                        username = %request.username,
                        season = state.season,
                        %reason,
                        "join rejected"
                    ),
                }
                acknowledgement = request
                    .issue
                    .map(|issue| (issue, state.last_event.clone()));
                Action::Join(outcome)
            }
            Trigger::Tick { force } => {
                reset_before = reset_if_pending(&mut state);
                if !force && !elimination_due(&state, now) {
                    info!(
                        due = ?state.next_elimination_time,
                        "elimination not due yet; skipping tick"
                    );
                    Action::NotDue {
                        due: state.next_elimination_time,
                    }
                } else {
                    let outcome = tick(&mut state, self.rng.as_mut(), &schedule);
                    log_tick(&state, &outcome);
                    Action::Tick(outcome)
                }
            }
        };

        let mut readme_written = self.commit(&state).await?;
        let mut writes = 1;

        let mut reset_after = false;
        let won = matches!(action, Action::Tick(TickOutcome::Won { .. }));
        if self.reset_mode == ResetMode::Immediate && won {
            reset_season(&mut state);
            info!(season = state.season, "new season started right after the win");
            readme_written &= self.commit(&state).await?;
            writes += 1;
            reset_after = true;
        }

        if let Some((issue, message)) = acknowledgement {
            if let Err(err) = self.notifier.acknowledge(issue, message).await {
                warn!(issue, error = %err, "failed to acknowledge join issue");
            }
        }

        Ok(DispatchReport {
            action,
            reset_before,
            reset_after,
            writes,
            readme_written,
            season: state.season,
            phase: SeasonPhase::from(&state),
        })
    }

    async fn load_state(&self) -> GameState {
        match self.store.load().await {
            Ok(Some(document)) => {
                if !document.is_object() {
                    warn!("stored arena is not a JSON object; falling back to defaults");
                }
                normalize(document)
            }
            Ok(None) => {
                info!("no stored arena found; starting season 1");
                GameState::default()
            }
            Err(err) => {
                warn!(error = %err, "stored arena unreadable; falling back to defaults");
                GameState::default()
            }
        }
    }

    /// Persist `state`, then regenerate the status page from it. Returns whether the
    /// page was written.
    async fn commit(&self, state: &GameState) -> Result<bool, DispatchError> {
        self.store.save(state.clone()).await.map_err(|err| {
            error!(error = %err, "failed to persist arena state");
            DispatchError::StoreWrite(err)
        })?;

        let page = render_status_page(state, self.repository.as_deref());
        match write_atomically(&self.readme_path, page.as_bytes()).await {
            Ok(()) => {
                debug!(season = state.season, readme = %self.readme_path.display(), "state committed");
                Ok(true)
            }
            Err(err) => {
                error!(
                    error = %err,
                    readme = %self.readme_path.display(),
                    "failed to write status page"
                );
                Ok(false)
            }
        }
    }
}

fn reset_if_pending(state: &mut GameState) -> bool {
    if !state.pending_reset {
        return false;
    }
    let finished = state.season;
    reset_season(state);
    info!(finished, season = state.season, "cleared finished season");
    true
}

fn log_tick(state: &GameState, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Idle => info!(season = state.season, "no season running; tick ignored"),
        TickOutcome::Eliminated {
            username,
            remaining,
        } => info!(season = state.season, %username, remaining, "participant eliminated"),
        TickOutcome::Won { eliminated, winner } => info!(
            season = state.season,
            eliminated = ?eliminated,
            %winner,
            "season won"
        ),
    }
}
