//! Persistence collaborator: best-effort external store for bookings.
//!
//! The core treats persistence as fire-and-forget: failures are logged and
//! never roll back the in-memory commit, so memory and store may disagree
//! until the next successful write. That window is deliberate and documented.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::Booking;

/// Create/update contract the booking manager issues against an external
/// store. Both calls are asynchronous and best-effort.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> Result<()>;
    async fn update_booking(&self, booking: &Booking) -> Result<()>;
}

/// In-memory stand-in for the external database. Rows are stored as JSON
/// documents keyed by booking id; a failure switch simulates an outage.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a store outage: while set, every write returns an error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored JSON document for a booking, if any.
    pub fn row(&self, booking_id: &str) -> Option<String> {
        self.rows.lock().unwrap().get(booking_id).cloned()
    }

    fn write(&self, booking: &Booking) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Persistence(format!(
                "store unavailable, dropped write for booking {}",
                booking.id
            )));
        }
        let row = serde_json::to_string(booking)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        self.rows.lock().unwrap().insert(booking.id.clone(), row);
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryStore {
    async fn create_booking(&self, booking: &Booking) -> Result<()> {
        self.write(booking)
    }

    async fn update_booking(&self, booking: &Booking) -> Result<()> {
        self.write(booking)
    }
}
