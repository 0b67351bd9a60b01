//! Core request state machine types and logic.
//!
//! This module contains the pure functional core:
//! - State definitions via the `State` trait
//! - The `Event` vocabulary
//! - The memoryless `transition` function
//!
//! All logic in this module is pure (no side effects), following
//! the "pure core, imperative shell" philosophy.

mod event;
mod state;
mod transition;

pub use event::Event;
pub use state::{RequestState, RequestStatus, State};
pub use transition::transition;
