//! The external call the sequencer drives, and its simulated backend.

use crate::config::SequencerConfig;
use crate::error::CallError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An asynchronous operation invoked once per request.
#[async_trait]
pub trait ExternalCall: Send + Sync {
    async fn call(&self, input: &str) -> Result<String, CallError>;
}

/// Records whether the simulated backend has already served a call.
///
/// The flag is read and written in one compare-and-set, so only the first
/// call to *resolve* can claim it, whatever order the calls were issued in.
#[derive(Debug, Default)]
pub struct ServedFlag {
    served: AtomicBool,
}

impl ServedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_served(&self) -> bool {
        self.served.load(Ordering::Acquire)
    }

    /// Claim the flag. Returns `true` only for the first claimant.
    pub fn try_serve(&self) -> bool {
        self.served
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn reset(&self) {
        self.served.store(false, Ordering::Release);
    }
}

/// Backend that accepts exactly one successful call ever.
///
/// Every call waits the configured delay, then appends `" hoge"` to its
/// input. The first call to resolve succeeds with that text; all later
/// ones are rejected with the same text as the reason.
#[derive(Debug, Clone)]
pub struct SimulatedCall {
    served: Arc<ServedFlag>,
    delay: Duration,
}

impl SimulatedCall {
    pub fn new(served: Arc<ServedFlag>, delay: Duration) -> Self {
        Self { served, delay }
    }

    pub fn from_config(served: Arc<ServedFlag>, config: &SequencerConfig) -> Self {
        Self::new(served, config.call_delay())
    }

    pub fn served_flag(&self) -> Arc<ServedFlag> {
        Arc::clone(&self.served)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl ExternalCall for SimulatedCall {
    async fn call(&self, input: &str) -> Result<String, CallError> {
        tokio::time::sleep(self.delay).await;

        let reply = format!("{input} hoge");
        if self.served.try_serve() {
            tracing::debug!(input = %input, "Simulated backend served call");
            Ok(reply)
        } else {
            tracing::debug!(input = %input, "Simulated backend already served, rejecting");
            Err(CallError::Rejected { reason: reply })
        }
    }
}
