//! GitHub REST client closing join issues once they have been processed.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{
    Client, Method, StatusCode,
    header::{ACCEPT, USER_AGENT},
};
use serde_json::json;
use thiserror::Error;

use crate::{
    config::GitHubConfig,
    services::notifier::{IssueNotifier, NotifyError},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Failures that can occur while talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build GitHub client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send GitHub request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// GitHub returned an unexpected status code.
    #[error("unexpected GitHub response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
}

impl From<GitHubError> for NotifyError {
    fn from(err: GitHubError) -> Self {
        NotifyError::new("GitHub issue acknowledgement", err)
    }
}

/// Comments on and closes join issues through the REST API.
#[derive(Clone)]
pub struct GitHubNotifier {
    client: Client,
    api_url: Arc<str>,
    repository: Arc<str>,
    token: Arc<str>,
}

impl GitHubNotifier {
    /// Build a client for the configured repository.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| GitHubError::ClientBuilder { source })?;

        Ok(Self {
            client,
            api_url: Arc::from(config.api_url.trim_end_matches('/')),
            repository: Arc::from(config.repository),
            token: Arc::from(config.token),
        })
    }

    fn issue_path(&self, issue: u64) -> String {
        format!("repos/{}/issues/{issue}", self.repository)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.api_url, path);
        self.client
            .request(method, url)
            .bearer_auth(self.token.as_ref())
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("readme-royale/", env!("CARGO_PKG_VERSION")))
            .header(API_VERSION_HEADER, API_VERSION)
    }

    async fn send(&self, builder: reqwest::RequestBuilder, path: String) -> Result<(), GitHubError> {
        let response = builder
            .send()
            .await
            .map_err(|source| GitHubError::RequestSend {
                path: path.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GitHubError::RequestStatus {
                path,
                status: response.status(),
            })
        }
    }

    /// Post a comment on `issue`.
    pub async fn comment(&self, issue: u64, body: &str) -> Result<(), GitHubError> {
        let path = format!("{}/comments", self.issue_path(issue));
        let builder = self
            .request(Method::POST, &path)
            .json(&json!({ "body": body }));
        self.send(builder, path).await
    }

    /// Close `issue`.
    pub async fn close(&self, issue: u64) -> Result<(), GitHubError> {
        let path = self.issue_path(issue);
        let builder = self
            .request(Method::PATCH, &path)
            .json(&json!({ "state": "closed" }));
        self.send(builder, path).await
    }
}

impl IssueNotifier for GitHubNotifier {
    fn acknowledge(&self, issue: u64, message: String) -> BoxFuture<'static, Result<(), NotifyError>> {
        let notifier = self.clone();
        Box::pin(async move {
            notifier.comment(issue, &message).await?;
            notifier.close(issue).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(api_url: &str) -> GitHubNotifier {
        GitHubNotifier::new(GitHubConfig {
            api_url: api_url.into(),
            repository: "octo/arena".into(),
            token: "token".into(),
        })
        .unwrap()
    }

    #[test]
    fn issue_paths_are_scoped_to_the_repository() {
        let notifier = notifier("https://api.github.com/");
        assert_eq!(notifier.issue_path(12), "repos/octo/arena/issues/12");
        assert_eq!(notifier.api_url.as_ref(), "https://api.github.com");
    }

    #[tokio::test]
    async fn unreachable_api_reports_a_send_error() {
        let notifier = notifier("http://127.0.0.1:9");
        let err = notifier.close(1).await.unwrap_err();
        assert!(matches!(err, GitHubError::RequestSend { .. }), "{err}");

        let err = notifier
            .acknowledge(1, "hello".into())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("notification failed"));
    }
}
