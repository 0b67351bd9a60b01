//! State trait and the single live request state.
//!
//! The container holds exactly one [`RequestState`] at a time. It is
//! overwritten on every transition and never accumulates history.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine statuses.
///
/// All methods are pure - no side effects. Statuses are immutable values
/// describing where the request currently is.
///
/// # Example
///
/// ```rust
/// use request_saga::core::{RequestStatus, State};
///
/// assert_eq!(RequestStatus::Requesting.name(), "Requesting");
/// assert!(RequestStatus::Succeeded.is_final());
/// assert!(RequestStatus::Failed.is_error());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// Where a request currently is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Idle,
    Requesting,
    Succeeded,
    Failed,
    Canceled,
}

impl State for RequestStatus {
    fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Requesting => "Requesting",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }

    /// Every outcome of a request, including cancellation, ends it.
    fn is_final(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// The observable value of the container: a status plus an optional payload.
///
/// The payload carries the call output on success and the failure detail
/// on failure. It is empty for every other status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    pub status: RequestStatus,
    pub payload: Option<String>,
}

impl RequestState {
    /// The process-start value: `Idle` with no payload.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn new(status: RequestStatus, payload: Option<String>) -> Self {
        Self { status, payload }
    }

    /// Payload as a string slice, empty when absent.
    pub fn payload_str(&self) -> &str {
        self.payload.as_deref().unwrap_or("")
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_final()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_name_returns_variant_name() {
        assert_eq!(RequestStatus::Idle.name(), "Idle");
        assert_eq!(RequestStatus::Requesting.name(), "Requesting");
        assert_eq!(RequestStatus::Succeeded.name(), "Succeeded");
        assert_eq!(RequestStatus::Failed.name(), "Failed");
        assert_eq!(RequestStatus::Canceled.name(), "Canceled");
    }

    #[test]
    fn is_final_identifies_terminal_statuses() {
        assert!(!RequestStatus::Idle.is_final());
        assert!(!RequestStatus::Requesting.is_final());
        assert!(RequestStatus::Succeeded.is_final());
        assert!(RequestStatus::Failed.is_final());
        assert!(RequestStatus::Canceled.is_final());
    }

    #[test]
    fn only_failed_is_an_error() {
        assert!(RequestStatus::Failed.is_error());
        assert!(!RequestStatus::Canceled.is_error());
        assert!(!RequestStatus::Succeeded.is_error());
    }

    #[test]
    fn initial_state_is_idle_with_empty_payload() {
        let state = RequestState::idle();
        assert_eq!(state.status, RequestStatus::Idle);
        assert_eq!(state.payload, None);
        assert_eq!(state.payload_str(), "");
        assert!(!state.is_terminal());
    }

    #[test]
    fn state_serializes_correctly() {
        let state = RequestState::new(RequestStatus::Succeeded, Some("x hoge".to_string()));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"status":"Succeeded","payload":"x hoge"}"#);
        let deserialized: RequestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
