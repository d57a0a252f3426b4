//! Distribution fan-out and per-channel retry engine.
//!
//! Every committed booking or rate event is broadcast to all connected
//! channels except its origin. Each (event, channel) pair gets its own retry
//! chain running as an independent task, so a lagging channel for one event
//! never blocks progress on another. Stopped channels are skipped outright
//! (circuit-open): status recorded, no dispatch attempt, no retry accounting.

use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::channels::ChannelDirectory;
use crate::models::{ChannelConnection, ChannelStatus};
use crate::store::PropertyStore;
use crate::transport::{DispatchOutcome, DispatchPayload, Transport};

/// Default delay between a failed attempt and the next retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Default bound on retry attempts after the initial dispatch.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

type ChainKey = (String, String); // (event id, channel name)

/// Broadcasts events to channels and drives their retry state machines.
pub struct FanOutEngine {
    store: Arc<PropertyStore>,
    channels: Arc<ChannelDirectory>,
    transport: Arc<dyn Transport>,
    max_retries: u32,
    retry_delay: Duration,
    // Each entry carries the generation of the chain that owns it, so a
    // finishing chain only ever removes itself, never a successor that
    // replaced it.
    chains: Mutex<HashMap<ChainKey, (u64, JoinHandle<()>)>>,
    next_generation: AtomicU64,
}

impl FanOutEngine {
    pub fn new(
        store: Arc<PropertyStore>,
        channels: Arc<ChannelDirectory>,
        transport: Arc<dyn Transport>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            channels,
            transport,
            max_retries,
            retry_delay,
            chains: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Broadcasts one committed event to every connected channel except its
    /// origin. Reads the channel directory live, so a channel stopped
    /// mid-flight is skipped for this and all subsequent events.
    ///
    /// `base_price` is the pre-markup price when the payload carries one;
    /// each channel receives its own markup-adjusted figure.
    pub fn fan_out(
        self: Arc<Self>,
        event_id: &str,
        origin: &str,
        label: &str,
        base_price: Option<i64>,
    ) {
        for channel in self.channels.connected() {
            if channel.name == origin {
                // The origin already has the event; nothing to push.
                self.store
                    .update_channel_status(event_id, &channel.name, ChannelStatus::Success);
                continue;
            }

            if channel.stopped {
                self.store
                    .update_channel_status(event_id, &channel.name, ChannelStatus::Stopped);
                warn!(
                    "Circuit open: sync of {} skipped for '{}' (stop-sell active)",
                    event_id, channel.name
                );
                continue;
            }

            let price = base_price.map(|base| match &channel.markup {
                Some(markup) => {
                    let marked = markup.apply(base);
                    self.store.record_channel_price(event_id, &channel.name, marked);
                    marked
                }
                None => base,
            });

            self.store
                .update_channel_status(event_id, &channel.name, ChannelStatus::Pending);
            info!("Dispatching {} to '{}'", label, channel.name);

            let payload = DispatchPayload {
                event_id: event_id.to_string(),
                label: label.to_string(),
                price,
            };
            Arc::clone(&self).spawn_chain(event_id.to_string(), channel, payload);
        }
    }

    fn spawn_chain(self: Arc<Self>, event_id: String, channel: ChannelConnection, payload: DispatchPayload) {
        let key = (event_id.clone(), channel.name.clone());
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let engine = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            engine.run_chain(event_id, channel, payload, generation).await;
        });
        // A fresh fan-out for the same (event, channel) supersedes any chain
        // still in flight; abort it so its timers don't leak.
        if let Some((_, stale)) = self.chains.lock().unwrap().insert(key, (generation, handle)) {
            stale.abort();
        }
    }

    /// One (event, channel) retry chain, run to a terminal state.
    ///
    /// The attempt counter counts retries, not dispatches: the initial
    /// dispatch is attempt 0, and a failure on retry `max_retries` is fatal.
    async fn run_chain(
        self: Arc<Self>,
        event_id: String,
        channel: ChannelConnection,
        payload: DispatchPayload,
        generation: u64,
    ) {
        let mut attempt: u32 = 0;
        loop {
            let outcome = self.transport.dispatch(&channel, &payload).await;
            match outcome {
                DispatchOutcome::Delivered => {
                    self.store
                        .update_channel_status(&event_id, &channel.name, ChannelStatus::Success);
                    if attempt == 0 {
                        info!("'{}' acknowledged {}", channel.name, event_id);
                    } else {
                        info!(
                            "Recovery: '{}' confirmed {} on retry {}",
                            channel.name, event_id, attempt
                        );
                    }
                    break;
                }
                DispatchOutcome::Rejected if attempt >= self.max_retries => {
                    self.store
                        .update_channel_status(&event_id, &channel.name, ChannelStatus::Error);
                    error!(
                        "Fatal: maximum retries reached for '{}' on {}",
                        channel.name, event_id
                    );
                    break;
                }
                DispatchOutcome::Rejected => {
                    self.store.update_channel_status(
                        &event_id,
                        &channel.name,
                        ChannelStatus::WaitingRetry,
                    );
                    warn!(
                        "'{}' rejected {}, retry {}/{} scheduled",
                        channel.name,
                        event_id,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                    self.store
                        .update_channel_status(&event_id, &channel.name, ChannelStatus::Retrying);
                }
            }
        }
        let key = (event_id, channel.name);
        let mut chains = self.chains.lock().unwrap();
        if chains.get(&key).map(|(g, _)| *g) == Some(generation) {
            chains.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn chain_count(&self) -> usize {
        self.chains.lock().unwrap().len()
    }

    /// Awaits every in-flight chain. Used by tests and at shutdown; new
    /// fan-outs issued while draining are awaited too.
    pub async fn drain(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut chains = self.chains.lock().unwrap();
                chains.drain().map(|(_, (_, handle))| handle).collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
