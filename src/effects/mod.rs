//! Effectful request handling.
//!
//! This module provides the "imperative shell" around the pure core:
//! the external call the requests drive and the sequencer that decides
//! which completions reach the state machine.
//!
//! # Key Concepts
//!
//! - **External call**: an async operation behind the `ExternalCall` trait
//! - **Sequencer**: per-channel bookkeeping for the `Every`/`Latest` policies
//! - **Follow-up**: the call outcome mapped to an event with Stillwater's
//!   effect constructors

mod call;
mod sequencer;

pub use call::{ExternalCall, ServedFlag, SimulatedCall};
pub use sequencer::{follow_up, handle, EffectSequencer, Ticket, FAILURE_DETAIL};
