//! Request Saga: a pure request state machine driven by an effect sequencer.
//!
//! The crate follows the "pure core, imperative shell" philosophy. The state
//! machine is a pure, memoryless transition function; all waiting, spawning
//! and cancellation live in the effect sequencer and the store around it.
//!
//! # Core Concepts
//!
//! - **State**: one live [`RequestState`] (`Idle`, `Requesting`, `Succeeded`,
//!   `Failed`, `Canceled` plus an optional payload)
//! - **Events**: [`Event::Request`], [`Event::Success`], [`Event::Failure`],
//!   [`Event::Cancel`]
//! - **Policies**: [`Policy::Every`] runs every request to completion,
//!   [`Policy::Latest`] keeps only the most recent one per channel
//!
//! # Example
//!
//! ```rust
//! use request_saga::{Policy, RequestStatus, ServedFlag, Store};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let served = Arc::new(ServedFlag::new());
//! let store = Store::builder()
//!     .policy(Policy::Latest)
//!     .simulated(Arc::clone(&served))
//!     .build()
//!     .unwrap();
//!
//! store.request("x").unwrap();
//! store.request("y").unwrap();
//! store.settled().await;
//!
//! let state = store.state();
//! assert_eq!(state.status, RequestStatus::Succeeded);
//! assert_eq!(state.payload_str(), "y hoge");
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use builder::StoreBuilder;
pub use config::{Policy, SequencerConfig};
pub use core::{transition, Event, RequestState, RequestStatus, State};
pub use effects::{ExternalCall, ServedFlag, SimulatedCall};
pub use error::{BuildError, CallError, ConfigError, StoreError};
pub use store::Store;
