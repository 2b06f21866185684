use std::sync::Arc;

use crate::config::AppConfig;

use self::notifier::{IssueNotifier, NoopNotifier};

/// Trigger dispatch and commit coordination.
pub mod dispatcher;
/// GitHub REST client used to acknowledge join issues.
#[cfg(feature = "github-notify")]
pub mod github;
/// Advisory issue acknowledgement seam.
pub mod notifier;
/// Markdown status page rendering.
pub mod render;

/// Pick the issue notifier matching the configured credentials.
///
/// Falls back to [`NoopNotifier`] when no token is configured or the client cannot be
/// built, since acknowledgements never gate a state change.
pub fn build_notifier(config: &AppConfig) -> Arc<dyn IssueNotifier> {
    #[cfg(feature = "github-notify")]
    if let Some(github) = config.github.clone() {
        match github::GitHubNotifier::new(github) {
            Ok(notifier) => {
                tracing::info!("issue acknowledgements enabled");
                return Arc::new(notifier);
            }
            Err(err) => {
                tracing::warn!(error = %err, "GitHub client unavailable; acknowledgements disabled");
            }
        }
    }

    #[cfg(not(feature = "github-notify"))]
    if config.github.is_some() {
        tracing::info!("built without github-notify; acknowledgements disabled");
    }

    Arc::new(NoopNotifier)
}
