//! Mapping of a GitHub Actions event (name plus JSON payload) onto a [`Trigger`].

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    dto::trigger::{JoinRequest, Trigger},
    error::DispatchError,
};

/// Issue event payload, reduced to the fields the arena needs.
#[derive(Debug, Deserialize)]
pub struct IssueEvent {
    /// Activity type (`opened`, `edited`, ...).
    #[serde(default)]
    pub action: Option<String>,
    /// The issue the event is about.
    pub issue: IssuePayload,
}

/// Issue section of an [`IssueEvent`].
#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    /// Issue number within the repository.
    pub number: u64,
    /// Author of the issue.
    pub user: IssueAuthor,
}

/// Author section of an [`IssuePayload`].
#[derive(Debug, Deserialize)]
pub struct IssueAuthor {
    /// Login of the author, used as participant identifier.
    pub login: String,
}

/// Translate an event into a trigger. `Ok(None)` means the event is deliberately ignored.
pub fn trigger_from_event(name: &str, payload: &str) -> Result<Option<Trigger>, DispatchError> {
    match name {
        "issues" => {
            let event: IssueEvent = serde_json::from_str(payload).map_err(|err| {
                DispatchError::InvalidTrigger(format!("unreadable issue event payload: {err}"))
            })?;
            if event
                .action
                .as_deref()
                .is_some_and(|action| action != "opened")
            {
                return Ok(None);
            }
            let request = JoinRequest::new(&event.issue.user.login, Some(event.issue.number))?;
            Ok(Some(Trigger::Join(request)))
        }
        "schedule" | "workflow_dispatch" => Ok(Some(Trigger::Tick { force: false })),
        other => Err(DispatchError::InvalidTrigger(format!(
            "unsupported event `{other}`"
        ))),
    }
}

/// Read the payload at `path` and translate it. Payloads are only read for events that
/// carry one.
pub fn load_event(name: &str, path: Option<&Path>) -> Result<Option<Trigger>, DispatchError> {
    let payload = match (name, path) {
        ("issues", Some(path)) => fs::read_to_string(path).map_err(|err| {
            DispatchError::InvalidTrigger(format!(
                "cannot read event payload `{}`: {err}",
                path.display()
            ))
        })?,
        ("issues", None) => {
            return Err(DispatchError::InvalidTrigger(
                "issue event without payload path".into(),
            ));
        }
        _ => String::new(),
    };
    trigger_from_event(name, &payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn issue_payload(action: &str, login: &str) -> String {
        json!({
            "action": action,
            "issue": { "number": 17, "title": "join", "user": { "login": login } },
            "repository": { "full_name": "o/r" },
        })
        .to_string()
    }

    #[test]
    fn opened_issue_becomes_a_join() {
        let trigger = trigger_from_event("issues", &issue_payload("opened", "octocat")).unwrap();
        assert_eq!(
            trigger,
            Some(Trigger::Join(JoinRequest {
                username: "octocat".into(),
                issue: Some(17),
            }))
        );
    }

    #[test]
    fn other_issue_activity_is_ignored() {
        let trigger = trigger_from_event("issues", &issue_payload("labeled", "octocat")).unwrap();
        assert_eq!(trigger, None);
    }

    #[test]
    fn schedule_becomes_a_tick() {
        assert_eq!(
            trigger_from_event("schedule", "").unwrap(),
            Some(Trigger::Tick { force: false })
        );
        assert_eq!(
            load_event("workflow_dispatch", None).unwrap(),
            Some(Trigger::Tick { force: false })
        );
    }

    #[test]
    fn unknown_events_and_bad_payloads_are_invalid() {
        assert!(matches!(
            trigger_from_event("push", ""),
            Err(DispatchError::InvalidTrigger(_))
        ));
        assert!(matches!(
            trigger_from_event("issues", "{}"),
            Err(DispatchError::InvalidTrigger(_))
        ));
        assert!(matches!(
            load_event("issues", None),
            Err(DispatchError::InvalidTrigger(_))
        ));
    }
}
