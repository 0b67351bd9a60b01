//! The action-dispatch container.
//!
//! A [`Store`] owns the single live [`RequestState`], applies the pure
//! [`transition`] to every event in delivery order, notifies subscribers,
//! and hands `Request` events to the effect sequencer.
//!
//! Transitions happen under the store lock and queue a snapshot. Snapshots
//! are delivered to subscribers after the lock is released, one drainer at
//! a time, so subscribers may read the store or dispatch into it.

use crate::builder::StoreBuilder;
use crate::config::{Policy, SequencerConfig};
use crate::core::{transition, Event, RequestState, State};
use crate::effects::{handle, EffectSequencer, ExternalCall, Ticket};
use crate::error::StoreError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// Callback invoked after every transition with the full resulting state.
pub type Subscriber = Arc<dyn Fn(&RequestState) + Send + Sync>;

struct Core {
    state: RequestState,
    pending: VecDeque<RequestState>,
    sequencer: EffectSequencer,
}

impl Core {
    fn apply(&mut self, event: &Event) {
        let next = transition(&self.state, event);
        tracing::debug!(
            event = event.kind(),
            from = self.state.status.name(),
            to = next.status.name(),
            "Applied transition"
        );
        self.state = next;
        self.pending.push_back(self.state.clone());
    }
}

struct Shared {
    core: Mutex<Core>,
    subscribers: Mutex<Vec<Subscriber>>,
    draining: AtomicBool,
    channel: String,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Clears the draining flag even if a subscriber panics.
struct Draining<'a>(&'a AtomicBool);

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> Vec<Subscriber> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_pending(&self) -> Option<RequestState> {
        self.lock().pending.pop_front()
    }

    /// Deliver queued snapshots in transition order with no lock held.
    ///
    /// Only one caller drains at a time. A caller that finds a drain in
    /// progress returns at once and its snapshots are delivered by the
    /// drainer.
    fn notify(&self) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            {
                let _draining = Draining(&self.draining);
                while let Some(state) = self.next_pending() {
                    for subscriber in self.subscribers() {
                        subscriber(&state);
                    }
                }
            }

            if self.lock().pending.is_empty() {
                return;
            }
        }
    }

    fn settle(&self, ticket: Ticket, event: Event) {
        {
            let mut core = self.lock();
            if !core.sequencer.complete(&self.channel, ticket) {
                tracing::debug!(
                    channel = %self.channel,
                    generation = ticket.generation(),
                    "Dropping completion of abandoned handler"
                );
                return;
            }
            core.apply(&event);
        }
        self.notify();
    }
}

/// Counts a handler task as in flight until the task is dropped, whether it
/// finished or was aborted.
struct InFlightGuard {
    shared: Arc<Shared>,
}

impl InFlightGuard {
    fn enter(shared: Arc<Shared>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::AcqRel);
        Self { shared }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.shared.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.idle.notify_waiters();
        }
    }
}

/// State container wired to an effect sequencer.
///
/// Cloning a `Store` yields another handle to the same container.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    pub(crate) fn new(
        config: &SequencerConfig,
        call: Arc<dyn ExternalCall>,
        subscribers: Vec<Subscriber>,
    ) -> Self {
        let core = Core {
            state: RequestState::idle(),
            pending: VecDeque::new(),
            sequencer: EffectSequencer::new(config.policy, call),
        };

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                subscribers: Mutex::new(subscribers),
                draining: AtomicBool::new(false),
                channel: config.channel.clone(),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub fn policy(&self) -> Policy {
        self.shared.lock().sequencer.policy()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState {
        self.shared.lock().state.clone()
    }

    /// Register a callback invoked after every subsequent transition.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&RequestState) + Send + Sync + 'static,
    {
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(subscriber));
    }

    /// Number of handler tasks that have not finished or been dropped.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Apply `event` and, for a request, start its handler.
    ///
    /// The transition happens before this returns. Subscribers are notified
    /// before it returns too, unless another thread (or an enclosing
    /// subscriber) is already delivering, in which case that drainer
    /// delivers this snapshot in order. A `Request` needs a Tokio runtime to
    /// spawn its handler on.
    pub fn dispatch(&self, event: Event) -> Result<(), StoreError> {
        let runtime = match event {
            Event::Request(_) => Some(Handle::try_current().map_err(|_| StoreError::NoRuntime)?),
            _ => None,
        };

        {
            let mut core = self.shared.lock();
            core.apply(&event);

            match (event, runtime) {
                (Event::Request(input), Some(runtime)) => {
                    self.spawn_handler(&mut core, &runtime, input);
                }
                (Event::Cancel, _) => {
                    core.sequencer.abandon(&self.shared.channel);
                }
                _ => {}
            }
        }

        self.shared.notify();
        Ok(())
    }

    pub fn request(&self, input: impl Into<String>) -> Result<(), StoreError> {
        self.dispatch(Event::Request(input.into()))
    }

    pub fn cancel(&self) -> Result<(), StoreError> {
        self.dispatch(Event::Cancel)
    }

    /// Wait until no handler task is in flight.
    pub async fn settled(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn spawn_handler(&self, core: &mut Core, runtime: &Handle, input: String) {
        let channel = &self.shared.channel;
        let ticket = core.sequencer.begin(channel);
        let call = core.sequencer.call();
        let shared = Arc::clone(&self.shared);
        let guard = InFlightGuard::enter(Arc::clone(&self.shared));

        tracing::debug!(
            channel = %channel,
            generation = ticket.generation(),
            policy = %core.sequencer.policy(),
            "Spawning request handler"
        );

        let task = runtime.spawn(async move {
            let _guard = guard;
            let event = handle(call, input).await;
            shared.settle(ticket, event);
        });

        core.sequencer.track(channel, ticket, task.abort_handle());
    }
}
