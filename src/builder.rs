//! Builder for constructing stores.

use crate::config::{Policy, SequencerConfig};
use crate::core::RequestState;
use crate::effects::{ExternalCall, ServedFlag, SimulatedCall};
use crate::error::BuildError;
use crate::store::{Store, Subscriber};
use std::sync::Arc;
use std::time::Duration;

enum CallSource {
    Custom(Arc<dyn ExternalCall>),
    Simulated(Arc<ServedFlag>),
}

/// Builder for constructing a [`Store`] with a fluent API.
///
/// # Example
///
/// ```
/// use request_saga::{Policy, ServedFlag, Store};
/// use std::sync::Arc;
///
/// let store = Store::builder()
///     .policy(Policy::Latest)
///     .simulated(Arc::new(ServedFlag::new()))
///     .build()
///     .unwrap();
///
/// assert_eq!(store.policy(), Policy::Latest);
/// ```
pub struct StoreBuilder {
    config: SequencerConfig,
    call: Option<CallSource>,
    subscribers: Vec<Subscriber>,
}

impl StoreBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: SequencerConfig::default(),
            call: None,
            subscribers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.config.channel = channel.into();
        self
    }

    /// Delay used by the simulated call. Ignored for custom calls.
    pub fn call_delay(mut self, delay: Duration) -> Self {
        self.config.call_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Use a custom external call.
    pub fn call<C>(mut self, call: C) -> Self
    where
        C: ExternalCall + 'static,
    {
        self.call = Some(CallSource::Custom(Arc::new(call)));
        self
    }

    /// Use the simulated backend, sharing `served` so callers can inspect
    /// or reset it.
    pub fn simulated(mut self, served: Arc<ServedFlag>) -> Self {
        self.call = Some(CallSource::Simulated(served));
        self
    }

    /// Add a subscriber invoked after every transition.
    pub fn subscribe<F>(mut self, subscriber: F) -> Self
    where
        F: Fn(&RequestState) + Send + Sync + 'static,
    {
        self.subscribers.push(Arc::new(subscriber));
        self
    }

    /// Build the store.
    /// Returns an error if the call is missing or the configuration is invalid.
    pub fn build(self) -> Result<Store, BuildError> {
        let source = self.call.ok_or(BuildError::MissingCall)?;
        self.config.check().map_err(BuildError::InvalidConfig)?;

        let call: Arc<dyn ExternalCall> = match source {
            CallSource::Custom(call) => call,
            CallSource::Simulated(served) => {
                Arc::new(SimulatedCall::from_config(served, &self.config))
            }
        };

        tracing::debug!(
            policy = %self.config.policy,
            channel = %self.config.channel,
            "Built store"
        );

        Ok(Store::new(&self.config, call, self.subscribers))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
