/// GitHub Actions event payloads.
pub mod github_event;
/// Inbound triggers consumed by the dispatcher.
pub mod trigger;
/// Validation helpers for inbound payloads.
pub mod validation;

pub use self::trigger::{JoinRequest, Trigger};
