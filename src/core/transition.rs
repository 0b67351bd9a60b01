//! The pure transition function.

use super::event::Event;
use super::state::{RequestState, RequestStatus};

/// Compute the next state from the current state and an event.
///
/// The machine is memoryless: every event applies unconditionally and the
/// result depends only on the event, never on `current`. A `Success` that
/// arrives while already `Succeeded` simply overwrites.
///
/// # Example
///
/// ```rust
/// use request_saga::core::{transition, Event, RequestState, RequestStatus};
///
/// let state = transition(&RequestState::idle(), &Event::request("x"));
/// assert_eq!(state.status, RequestStatus::Requesting);
///
/// let state = transition(&state, &Event::success("x hoge"));
/// assert_eq!(state.payload_str(), "x hoge");
/// ```
pub fn transition(_current: &RequestState, event: &Event) -> RequestState {
    match event {
        Event::Request(_) => RequestState::new(RequestStatus::Requesting, None),
        Event::Success(output) => RequestState::new(RequestStatus::Succeeded, Some(output.clone())),
        Event::Failure(detail) => RequestState::new(RequestStatus::Failed, Some(detail.clone())),
        Event::Cancel => RequestState::new(RequestStatus::Canceled, None),
    }
}
