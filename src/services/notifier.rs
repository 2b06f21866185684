//! Advisory side channel used to acknowledge processed join requests.

use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

/// Failure of an advisory notification. Never affects the persisted state.
#[derive(Debug, Error)]
#[error("notification failed: {message}")]
pub struct NotifyError {
    message: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl NotifyError {
    /// Wrap a backend failure.
    pub fn new(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Acknowledges the issue a join request came from.
pub trait IssueNotifier: Send + Sync {
    /// Post `message` on `issue` and close it.
    fn acknowledge(&self, issue: u64, message: String) -> BoxFuture<'static, Result<(), NotifyError>>;
}

/// Notifier used when no credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl IssueNotifier for NoopNotifier {
    fn acknowledge(&self, issue: u64, _message: String) -> BoxFuture<'static, Result<(), NotifyError>> {
        Box::pin(async move {
            debug!(issue, "issue acknowledgement disabled");
            Ok(())
        })
    }
}
