//! Effect sequencer: runs the external call for each request and turns
//! its outcome into a follow-up event, under a concurrency policy.
//!
//! The sequencer only does bookkeeping. The store spawns the handler task
//! and asks the sequencer whether a completion may still be delivered.

use crate::config::Policy;
use crate::core::Event;
use crate::effects::call::ExternalCall;
use crate::error::CallError;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use stillwater::effect::Effect;
use stillwater::prelude::*;
use tokio::task::AbortHandle;

/// Detail emitted on every failure. The rejection reason is discarded.
pub const FAILURE_DETAIL: &str = "error";

/// Identifies one handler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

/// Tracks handler invocations per logical channel.
pub struct EffectSequencer {
    policy: Policy,
    call: Arc<dyn ExternalCall>,
    next_generation: u64,
    in_flight: HashMap<String, InFlight>,
}

impl EffectSequencer {
    pub fn new(policy: Policy, call: Arc<dyn ExternalCall>) -> Self {
        Self {
            policy,
            call,
            next_generation: 0,
            in_flight: HashMap::new(),
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn call(&self) -> Arc<dyn ExternalCall> {
        Arc::clone(&self.call)
    }

    /// Start a new invocation on `channel`.
    ///
    /// Under `Latest` the invocation still in flight on the channel is
    /// aborted and forgotten, so its completion will be refused.
    pub fn begin(&mut self, channel: &str) -> Ticket {
        self.next_generation += 1;
        let ticket = Ticket {
            generation: self.next_generation,
        };

        if self.policy == Policy::Latest {
            if let Some(previous) = self.in_flight.remove(channel) {
                previous.abort.abort();
                tracing::debug!(
                    channel = %channel,
                    abandoned = previous.generation,
                    replaced_by = ticket.generation,
                    "Abandoned in-flight handler"
                );
            }
        }

        ticket
    }

    /// Remember the task running `ticket` so a later request can abort it.
    pub fn track(&mut self, channel: &str, ticket: Ticket, abort: AbortHandle) {
        if self.policy == Policy::Latest {
            self.in_flight.insert(
                channel.to_string(),
                InFlight {
                    generation: ticket.generation,
                    abort,
                },
            );
        }
    }

    /// Whether a completion for `ticket` may still reach the state machine.
    pub fn accepts(&self, channel: &str, ticket: Ticket) -> bool {
        match self.policy {
            Policy::Every => true,
            Policy::Latest => self
                .in_flight
                .get(channel)
                .is_some_and(|current| current.generation == ticket.generation),
        }
    }

    /// Retire `ticket`. Returns `false` if its completion must be dropped.
    pub fn complete(&mut self, channel: &str, ticket: Ticket) -> bool {
        if !self.accepts(channel, ticket) {
            return false;
        }
        if self.policy == Policy::Latest {
            self.in_flight.remove(channel);
        }
        true
    }

    /// Abandon whatever is in flight on `channel`. Only `Latest` cancels.
    pub fn abandon(&mut self, channel: &str) -> bool {
        if self.policy != Policy::Latest {
            return false;
        }
        match self.in_flight.remove(channel) {
            Some(previous) => {
                previous.abort.abort();
                tracing::debug!(
                    channel = %channel,
                    abandoned = previous.generation,
                    "Canceled in-flight handler"
                );
                true
            }
            None => false,
        }
    }

    pub fn in_flight_on(&self, channel: &str) -> Option<u64> {
        self.in_flight.get(channel).map(|f| f.generation)
    }
}

/// Translate a call outcome into the follow-up event.
pub fn follow_up(
    outcome: Result<String, CallError>,
) -> impl Effect<Output = Event, Error = Infallible, Env = ()> {
    match outcome {
        Ok(output) => pure(Event::Success(output)).boxed(),
        Err(CallError::Rejected { reason }) => {
            tracing::info!(reason = %reason, "External call rejected");
            pure(Event::Failure(FAILURE_DETAIL.to_string())).boxed()
        }
    }
}

/// The per-request procedure: invoke the call, then produce the follow-up.
pub async fn handle(call: Arc<dyn ExternalCall>, input: String) -> Event {
    tracing::info!(input = %input, "Invoking external call");
    let outcome = call.call(&input).await;

    match follow_up(outcome).run(&()).await {
        Ok(event) => {
            tracing::info!(input = %input, outcome = event.kind(), "External call settled");
            event
        }
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::call::{ServedFlag, SimulatedCall};
    use std::time::Duration;

    fn simulated() -> Arc<dyn ExternalCall> {
        Arc::new(SimulatedCall::new(
            Arc::new(ServedFlag::new()),
            Duration::from_millis(1000),
        ))
    }

    fn idle_task() -> tokio::task::JoinHandle<()> {
        tokio::spawn(std::future::pending::<()>())
    }

    #[tokio::test]
    async fn follow_up_maps_success_to_output() {
        let event = follow_up(Ok("x hoge".to_string())).run(&()).await.unwrap();
        assert_eq!(event, Event::Success("x hoge".to_string()));
    }

    #[tokio::test]
    async fn follow_up_discards_rejection_reason() {
        let outcome = Err(CallError::Rejected {
            reason: "x hoge".to_string(),
        });
        let event = follow_up(outcome).run(&()).await.unwrap();
        assert_eq!(event, Event::Failure("error".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_emits_success_then_failure() {
        let call = simulated();

        let first = handle(Arc::clone(&call), "x".to_string()).await;
        let second = handle(call, "y".to_string()).await;

        assert_eq!(first, Event::Success("x hoge".to_string()));
        assert_eq!(second, Event::Failure("error".to_string()));
    }

    #[tokio::test]
    async fn every_policy_accepts_all_completions() {
        let mut sequencer = EffectSequencer::new(Policy::Every, simulated());

        let first = sequencer.begin("request");
        let task = idle_task();
        sequencer.track("request", first, task.abort_handle());
        let second = sequencer.begin("request");

        assert!(!task.is_finished());
        assert!(sequencer.complete("request", first));
        assert!(sequencer.complete("request", second));
        assert_eq!(sequencer.in_flight_on("request"), None);
        task.abort();
    }

    #[tokio::test]
    async fn latest_policy_refuses_stale_completion() {
        let mut sequencer = EffectSequencer::new(Policy::Latest, simulated());

        let first = sequencer.begin("request");
        let first_task = idle_task();
        sequencer.track("request", first, first_task.abort_handle());

        let second = sequencer.begin("request");
        let second_task = idle_task();
        sequencer.track("request", second, second_task.abort_handle());

        assert!(first_task.await.unwrap_err().is_cancelled());
        assert!(!sequencer.accepts("request", first));
        assert!(!sequencer.complete("request", first));
        assert_eq!(sequencer.in_flight_on("request"), Some(second.generation()));
        assert!(sequencer.complete("request", second));
        assert_eq!(sequencer.in_flight_on("request"), None);
        second_task.abort();
    }

    #[tokio::test]
    async fn latest_policy_tracks_channels_independently() {
        let mut sequencer = EffectSequencer::new(Policy::Latest, simulated());

        let a = sequencer.begin("a");
        let a_task = idle_task();
        sequencer.track("a", a, a_task.abort_handle());
        let b = sequencer.begin("b");
        let b_task = idle_task();
        sequencer.track("b", b, b_task.abort_handle());

        assert!(sequencer.accepts("a", a));
        assert!(sequencer.accepts("b", b));
        a_task.abort();
        b_task.abort();
    }

    #[tokio::test]
    async fn abandon_only_cancels_under_latest() {
        let mut every = EffectSequencer::new(Policy::Every, simulated());
        assert!(!every.abandon("request"));

        let mut latest = EffectSequencer::new(Policy::Latest, simulated());
        let ticket = latest.begin("request");
        let task = idle_task();
        latest.track("request", ticket, task.abort_handle());

        assert!(latest.abandon("request"));
        assert!(!latest.accepts("request", ticket));
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!latest.abandon("request"));
    }
}
