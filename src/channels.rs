//! Channel directory: live registry of distribution channel connections.
//!
//! The fan-out engine reads this on every dispatch rather than caching at
//! startup, so an operator flipping a stop-sell switch takes effect for the
//! very next event.

use std::sync::RwLock;

use log::info;

use crate::models::{ChannelConnection, Markup};

/// Thread-safe registry of channel connections and their operator-set flags.
#[derive(Debug, Default)]
pub struct ChannelDirectory {
    inner: RwLock<Vec<ChannelConnection>>,
}

impl ChannelDirectory {
    pub fn new(channels: Vec<ChannelConnection>) -> Self {
        Self {
            inner: RwLock::new(channels),
        }
    }

    /// Snapshot of all channels, connected or not.
    pub fn all(&self) -> Vec<ChannelConnection> {
        self.inner.read().unwrap().clone()
    }

    /// Snapshot of the channels that currently participate in fan-out.
    pub fn connected(&self) -> Vec<ChannelConnection> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.connected)
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<ChannelConnection> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Whether the named channel has its stop-sell switch engaged. Unknown
    /// names (e.g. the front desk's "Direct" source) are never stopped.
    pub fn is_stopped(&self, name: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .iter()
            .any(|c| c.name == name && c.stopped)
    }

    /// Engages or releases a channel's stop-sell switch. Returns false when
    /// the id is unknown.
    pub fn set_stopped(&self, id: &str, stopped: bool) -> bool {
        let mut channels = self.inner.write().unwrap();
        match channels.iter_mut().find(|c| c.id == id) {
            Some(channel) => {
                channel.stopped = stopped;
                info!(
                    "Channel '{}' stop-sell {}",
                    channel.name,
                    if stopped { "engaged" } else { "released" }
                );
                true
            }
            None => false,
        }
    }

    pub fn set_connected(&self, id: &str, connected: bool) -> bool {
        let mut channels = self.inner.write().unwrap();
        match channels.iter_mut().find(|c| c.id == id) {
            Some(channel) => {
                channel.connected = connected;
                true
            }
            None => false,
        }
    }

    pub fn set_markup(&self, id: &str, markup: Option<Markup>) -> bool {
        let mut channels = self.inner.write().unwrap();
        match channels.iter_mut().find(|c| c.id == id) {
            Some(channel) => {
                channel.markup = markup;
                true
            }
            None => false,
        }
    }

    /// Adds a channel, or replaces the existing one with the same id.
    pub fn upsert(&self, connection: ChannelConnection) {
        let mut channels = self.inner.write().unwrap();
        match channels.iter_mut().find(|c| c.id == connection.id) {
            Some(existing) => *existing = connection,
            None => channels.push(connection),
        }
    }
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;
