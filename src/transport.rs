//! Channel transport abstraction with injectable fault and latency behavior.
//!
//! No real network is involved anywhere in this crate: the production
//! implementation simulates an OTA endpoint with randomized latency and a
//! configurable failure rate, while [`ScriptedTransport`] replays
//! predetermined outcomes so tests can drive the retry machine
//! deterministically.

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::ChannelConnection;

/// What the engine hands a channel on each dispatch attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchPayload {
    pub event_id: String,
    pub label: String,
    /// Channel-specific price (markup already applied) when the event
    /// carries one.
    pub price: Option<i64>,
}

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    Rejected,
}

/// One dispatch to one channel. Implementations must be cheap to call
/// concurrently; the fan-out engine runs one chain per (event, channel).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, channel: &ChannelConnection, payload: &DispatchPayload)
        -> DispatchOutcome;
}

/// Simulated OTA endpoint: random latency in a configured band, random
/// rejection at a configured rate.
pub struct SimulatedTransport {
    failure_rate: f64,
    latency_min: Duration,
    latency_max: Duration,
}

impl SimulatedTransport {
    pub fn new(failure_rate: f64, latency_min: Duration, latency_max: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency_min,
            latency_max: latency_max.max(latency_min),
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(
            0.1,
            Duration::from_millis(500),
            Duration::from_millis(2500),
        )
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn dispatch(
        &self,
        channel: &ChannelConnection,
        payload: &DispatchPayload,
    ) -> DispatchOutcome {
        let (latency, rejected) = {
            let mut rng = rand::thread_rng();
            let span = self.latency_max.saturating_sub(self.latency_min);
            let jitter = if span.is_zero() {
                Duration::ZERO
            } else {
                Duration::from_millis(rng.gen_range(0..=span.as_millis() as u64))
            };
            (self.latency_min + jitter, rng.gen_bool(self.failure_rate))
        };

        if let Ok(wire) = serde_json::to_string(payload) {
            debug!("Wire payload for {}: {}", channel.name, wire);
        }
        tokio::time::sleep(latency).await;

        if rejected {
            DispatchOutcome::Rejected
        } else {
            DispatchOutcome::Delivered
        }
    }
}

/// Deterministic transport for tests: per-channel outcome scripts with a
/// fallback default, zero latency, and a record of every attempt.
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<DispatchOutcome>>>,
    default_outcome: DispatchOutcome,
    attempts: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    /// Every dispatch yields `outcome` unless a channel script says otherwise.
    pub fn always(outcome: DispatchOutcome) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_outcome: outcome,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Queues outcomes for one channel; consumed front to back, after which
    /// the default applies again.
    pub fn script(&self, channel_name: &str, outcomes: Vec<DispatchOutcome>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(channel_name.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Every `(channel name, event id)` pair dispatched so far, in order.
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().unwrap().clone()
    }

    /// Number of dispatch attempts made against one channel.
    pub fn attempts_for(&self, channel_name: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == channel_name)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(
        &self,
        channel: &ChannelConnection,
        payload: &DispatchPayload,
    ) -> DispatchOutcome {
        self.attempts
            .lock()
            .unwrap()
            .push((channel.name.clone(), payload.event_id.clone()));
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&channel.name)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(self.default_outcome)
    }
}
