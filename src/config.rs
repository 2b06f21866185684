//! Application-level configuration loading: an optional JSON file, then environment overrides.

use std::{
    env, fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

/// Default location on disk where the tool looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "royale.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ROYALE_CONFIG_PATH";
const DEFAULT_STATE_PATH: &str = "game.json";
const DEFAULT_README_PATH: &str = "README.md";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// One elimination per day.
const DEFAULT_ELIMINATION_INTERVAL_SECS: u64 = 86_400;

/// How a finished season is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Keep the winner on display until the next join or tick starts a new season.
    #[default]
    Deferred,
    /// Persist the win, then start the next season within the same invocation.
    Immediate,
}

impl FromStr for ResetMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deferred" => Ok(ResetMode::Deferred),
            "immediate" => Ok(ResetMode::Immediate),
            other => Err(format!("unknown reset mode `{other}`")),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetMode::Deferred => f.write_str("deferred"),
            ResetMode::Immediate => f.write_str("immediate"),
        }
    }
}

/// Credentials and endpoint used to acknowledge join issues.
#[derive(Clone)]
pub struct GitHubConfig {
    /// REST API root, without trailing slash.
    pub api_url: String,
    /// Repository slug (`owner/name`).
    pub repository: String,
    /// Token sent as bearer authentication.
    pub token: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration handed to the dispatcher.
pub struct AppConfig {
    /// Location of the arena JSON document.
    pub state_path: PathBuf,
    /// Location of the rendered status page.
    pub readme_path: PathBuf,
    /// Delay between two scheduled eliminations.
    pub elimination_interval: Duration,
    /// How finished seasons are cleared.
    pub reset_mode: ResetMode,
    /// Seed for reproducible eliminations.
    pub seed: Option<u64>,
    /// Repository slug, used for links even without credentials.
    pub repository: Option<String>,
    /// Issue acknowledgement settings; `None` disables the side channel.
    pub github: Option<GitHubConfig>,
}

impl AppConfig {
    /// Load the configuration file (if any) and apply environment overrides.
    pub fn load() -> Self {
        let raw = load_raw_config(&resolve_config_path());
        Self::resolve(raw, |key| env::var(key).ok())
    }

    /// Combine file settings with overrides looked up through `lookup`.
    pub fn resolve(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let state_path = lookup("ROYALE_STATE_PATH")
            .map(PathBuf::from)
            .or(raw.state_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        let readme_path = lookup("ROYALE_README_PATH")
            .map(PathBuf::from)
            .or(raw.readme_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_README_PATH));

        let interval_secs = lookup("ROYALE_ELIMINATION_INTERVAL_SECS")
            .and_then(|value| parse_or_warn::<u64>("ROYALE_ELIMINATION_INTERVAL_SECS", &value))
            .or(raw.elimination_interval_secs)
            .filter(|secs| {
                let valid = *secs > 0 && i64::try_from(*secs).is_ok();
                if !valid {
                    warn!(secs, "elimination interval out of range; using default");
                }
                valid
            })
            .unwrap_or(DEFAULT_ELIMINATION_INTERVAL_SECS);
        let elimination_interval =
            Duration::seconds(i64::try_from(interval_secs).unwrap_or(i64::MAX));

        let reset_mode = lookup("ROYALE_RESET_MODE")
            .and_then(|value| parse_or_warn::<ResetMode>("ROYALE_RESET_MODE", &value))
            .or(raw.reset_mode)
            .unwrap_or_default();

        let seed = lookup("ROYALE_SEED")
            .and_then(|value| parse_or_warn::<u64>("ROYALE_SEED", &value))
            .or(raw.seed);

        let repository = lookup("GITHUB_REPOSITORY").or(raw.repository);
        let api_url = lookup("GITHUB_API_URL")
            .or(raw.api_url)
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.into());
        let github = match (repository.clone(), lookup("GITHUB_TOKEN")) {
            (Some(repository), Some(token)) => Some(GitHubConfig {
                api_url: api_url.trim_end_matches('/').to_owned(),
                repository,
                token,
            }),
            _ => None,
        };

        Self {
            state_path,
            readme_path,
            elimination_interval,
            reset_mode,
            seed,
            repository,
            github,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(RawConfig::default(), |_| None)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
pub struct RawConfig {
    state_path: Option<PathBuf>,
    readme_path: Option<PathBuf>,
    elimination_interval_secs: Option<u64>,
    reset_mode: Option<ResetMode>,
    seed: Option<u64>,
    repository: Option<String>,
    api_url: Option<String>,
}

fn load_raw_config(path: &Path) -> RawConfig {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            RawConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            RawConfig::default()
        }
    }
}

fn parse_or_warn<T>(key: &str, value: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, value, error = %err, "ignoring invalid environment override");
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
