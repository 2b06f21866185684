use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_username;

/// Inbound event handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A participant asks to enter the arena.
    Join(JoinRequest),
    /// The scheduler fired; `force` skips the due-time check.
    Tick {
        /// Run the elimination even if it is not due yet.
        force: bool,
    },
    /// Regenerate the status page without any transition.
    Render,
}

/// Join request carrying an opaque participant identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// Participant identifier, trimmed.
    pub username: String,
    /// Issue that carried the request, acknowledged once processed.
    pub issue: Option<u64>,
}

impl JoinRequest {
    /// Build a validated request; surrounding whitespace is dropped first.
    pub fn new(username: &str, issue: Option<u64>) -> Result<Self, ValidationErrors> {
        let request = Self {
            username: username.trim().to_owned(),
            issue,
        };
        request.validate()?;
        Ok(request)
    }
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_username(&self.username) {
            errors.add("username", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_before_validation() {
        let request = JoinRequest::new("  octocat \n", Some(3)).unwrap();
        assert_eq!(request.username, "octocat");
        assert_eq!(request.issue, Some(3));
    }

    #[test]
    fn blank_username_is_rejected() {
        let errors = JoinRequest::new("   ", None).unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }
}
