//! README Royale entrypoint: turns one CLI invocation or GitHub Actions event into a
//! committed arena state and a regenerated status page.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readme_royale::{
    config::AppConfig,
    dao::state_store::JsonFileStore,
    dto::{JoinRequest, Trigger, github_event::load_event},
    services::{build_notifier, dispatcher::Dispatcher},
    state::index_source,
};

#[derive(Debug, Parser)]
#[command(name = "readme-royale", version, about = "Last-one-standing game played through a README")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a participant to the current season.
    Join {
        /// GitHub login of the participant.
        username: String,
        /// Issue the join request came from; acknowledged once processed.
        #[arg(long)]
        issue: Option<u64>,
    },
    /// Run the scheduled elimination.
    Tick {
        /// Eliminate even if the next elimination is not due yet.
        #[arg(long)]
        force: bool,
    },
    /// Regenerate the status page without changing the arena.
    Render,
    /// Handle the GitHub Actions event described by the runner environment.
    GithubEvent {
        /// Event name, as provided by the runner.
        #[arg(long, env = "GITHUB_EVENT_NAME")]
        name: String,
        /// Path of the JSON event payload.
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        payload: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let trigger = match cli.command {
        Command::Join { username, issue } => Some(Trigger::Join(
            JoinRequest::new(&username, issue).context("rejecting join request")?,
        )),
        Command::Tick { force } => Some(Trigger::Tick { force }),
        Command::Render => Some(Trigger::Render),
        Command::GithubEvent { name, payload } => {
            load_event(&name, payload.as_deref()).context("reading GitHub event")?
        }
    };

    let Some(trigger) = trigger else {
        info!("event does not concern the arena; nothing to do");
        return Ok(());
    };

    let config = AppConfig::load();
    info!(
        state = %config.state_path.display(),
        readme = %config.readme_path.display(),
        reset_mode = %config.reset_mode,
        "configuration loaded"
    );

    let store = Arc::new(JsonFileStore::new(config.state_path.clone()));
    let notifier = build_notifier(&config);
    let mut dispatcher = Dispatcher::new(&config, store, notifier, index_source(config.seed));

    let report = dispatcher
        .dispatch(trigger, OffsetDateTime::now_utc())
        .await
        .context("dispatching trigger")?;
    info!(
        season = report.season,
        phase = %report.phase,
        writes = report.writes,
        readme_written = report.readme_written,
        "invocation complete"
    );

    Ok(())
}

/// Configure tracing subscribers, honouring `RUST_LOG` when set.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
