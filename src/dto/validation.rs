//! Validation helpers for inbound triggers.

use validator::ValidationError;

/// Validates that a participant identifier is a non-empty string without surrounding
/// whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_username("octocat")   // Ok
/// validate_username("")          // Err - empty
/// validate_username(" octocat")  // Err - untrimmed
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("username_empty");
        err.message = Some("Username must not be empty".into());
        return Err(err);
    }

    if username.trim() != username {
        let mut err = ValidationError::new("username_untrimmed");
        err.message = Some("Username must not start or end with whitespace".into());
        return Err(err);
    }

    Ok(())
}
