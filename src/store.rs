//! Shared property store: configuration, event log and the derived grid.
//!
//! One lock owns all three, which is what makes a booking commit's
//! availability check and event append a single indivisible step. No caller
//! ever observes a half-updated grid: mutations rebuild the grid before the
//! lock is released, and readers get snapshots.

use chrono::NaiveDate;
use std::sync::{Mutex, MutexGuard};

use crate::ledger::{self, InventoryGrid};
use crate::models::{
    Booking, ChannelStatus, RateRulesConfig, RoomType, SyncEvent,
};

pub(crate) struct StoreInner {
    pub(crate) room_types: Vec<RoomType>,
    pub(crate) rules: RateRulesConfig,
    pub(crate) events: Vec<SyncEvent>,
    pub(crate) grid: InventoryGrid,
}

impl StoreInner {
    /// Recomputes the grid wholesale from the current inputs.
    pub(crate) fn rebuild(&mut self, start: NaiveDate, horizon_days: u32) {
        self.grid = ledger::rebuild(
            start,
            horizon_days,
            &self.room_types,
            &self.rules,
            &self.events,
        );
    }

    pub(crate) fn booking_mut(&mut self, booking_id: &str) -> Option<&mut Booking> {
        self.events.iter_mut().find_map(|e| match e {
            SyncEvent::Booking(b) if b.id == booking_id => Some(b),
            _ => None,
        })
    }
}

/// Owner of the event log and derived grid, shared between the booking
/// manager and the fan-out engine.
pub struct PropertyStore {
    inner: Mutex<StoreInner>,
    start_date: NaiveDate,
    horizon_days: u32,
}

impl PropertyStore {
    pub(crate) fn new(
        start_date: NaiveDate,
        horizon_days: u32,
        room_types: Vec<RoomType>,
        rules: RateRulesConfig,
    ) -> Self {
        let mut inner = StoreInner {
            room_types,
            rules,
            events: Vec::new(),
            grid: InventoryGrid::default(),
        };
        inner.rebuild(start_date, horizon_days);
        Self {
            inner: Mutex::new(inner),
            start_date,
            horizon_days,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap()
    }

    /// Snapshot of the derived grid for display/consumers.
    pub fn grid(&self) -> InventoryGrid {
        self.lock().grid.clone()
    }

    /// Snapshot of the event log with attached per-channel sync status.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.lock().events.clone()
    }

    pub fn room_types(&self) -> Vec<RoomType> {
        self.lock().room_types.clone()
    }

    pub fn rules(&self) -> RateRulesConfig {
        self.lock().rules.clone()
    }

    pub fn find_booking(&self, booking_id: &str) -> Option<Booking> {
        self.lock()
            .events
            .iter()
            .find_map(|e| match e {
                SyncEvent::Booking(b) if b.id == booking_id => Some(b.clone()),
                _ => None,
            })
    }

    /// Replaces the room-type configuration and re-derives the grid.
    pub(crate) fn set_room_types(&self, room_types: Vec<RoomType>) {
        let mut inner = self.lock();
        inner.room_types = room_types;
        inner.rebuild(self.start_date, self.horizon_days);
    }

    /// Replaces the rate rules and re-derives the grid.
    pub(crate) fn set_rules(&self, rules: RateRulesConfig) {
        let mut inner = self.lock();
        inner.rules = rules;
        inner.rebuild(self.start_date, self.horizon_days);
    }

    /// Writes one channel's sync status back onto the originating event.
    pub(crate) fn update_channel_status(
        &self,
        event_id: &str,
        channel_name: &str,
        status: ChannelStatus,
    ) {
        let mut inner = self.lock();
        if let Some(event) = inner.events.iter_mut().find(|e| e.id() == event_id) {
            event
                .channel_sync_mut()
                .insert(channel_name.to_string(), status);
        }
    }

    /// Records the markup-adjusted price sent to one channel for a rate event.
    pub(crate) fn record_channel_price(&self, event_id: &str, channel_name: &str, price: i64) {
        let mut inner = self.lock();
        if let Some(SyncEvent::RateUpdate(update)) =
            inner.events.iter_mut().find(|e| e.id() == event_id)
        {
            update.channel_prices.insert(channel_name.to_string(), price);
        }
    }

    /// Flips the advisory lock flag on a set of cells.
    pub(crate) fn set_locked(&self, room_type_id: &str, dates: &[NaiveDate], locked: bool) {
        self.lock().grid.set_locked(room_type_id, dates, locked);
    }
}
