//! Booking transaction manager and top-level engine wiring.
//!
//! Owns the property store, channel directory and fan-out engine, and
//! exposes the four core operations: commit a booking, cancel it, walk its
//! check-in/check-out lifecycle, and push a rate update. The availability
//! check and the event append run under one store lock, so two interleaved
//! commits can never both pass the check for the last remaining unit.

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::ChannelDirectory;
use crate::error::{Error, Result};
use crate::fanout::{FanOutEngine, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::ledger::{InventoryGrid, DEFAULT_HORIZON_DAYS};
use crate::models::{
    new_event_id, nights_between, Booking, BookingStatus, ChannelConnection, RateRulesConfig,
    RateUpdateEvent, RoomType, SyncEvent, UNASSIGNED_UNIT,
};
use crate::persistence::PersistenceGateway;
use crate::store::PropertyStore;
use crate::transport::Transport;

/// Label on the synthetic rate event emitted when a cancellation releases
/// inventory back to the channels.
pub const INVENTORY_RELEASE_LABEL: &str = "Inventory Release";

/// Engine tunables. Defaults mirror the production constants; tests shrink
/// the delays.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// First day of the planning horizon.
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// How long committed cells keep their advisory lock flag for UI
    /// feedback.
    pub lock_release_delay: Duration,
}

impl EngineConfig {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            lock_release_delay: Duration::from_millis(800),
        }
    }
}

/// The assembled core: ledger, booking manager and distribution sync.
pub struct SyncEngine {
    config: EngineConfig,
    store: Arc<PropertyStore>,
    channels: Arc<ChannelDirectory>,
    fanout: Arc<FanOutEngine>,
    persistence: Arc<dyn PersistenceGateway>,
}

impl SyncEngine {
    pub fn new(
        config: EngineConfig,
        room_types: Vec<RoomType>,
        rules: RateRulesConfig,
        channels: Vec<ChannelConnection>,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn PersistenceGateway>,
    ) -> Result<Self> {
        for rt in &room_types {
            rt.validate()?;
        }
        let store = Arc::new(PropertyStore::new(
            config.start_date,
            config.horizon_days,
            room_types,
            rules,
        ));
        let channels = Arc::new(ChannelDirectory::new(channels));
        let fanout = Arc::new(FanOutEngine::new(
            Arc::clone(&store),
            Arc::clone(&channels),
            transport,
            config.max_retries,
            config.retry_delay,
        ));
        Ok(Self {
            config,
            store,
            channels,
            fanout,
            persistence,
        })
    }

    /// Snapshot of the derived grid (consumer surface).
    pub fn grid(&self) -> InventoryGrid {
        self.store.grid()
    }

    /// Snapshot of the event log with per-channel sync status attached.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.store.events()
    }

    pub fn find_booking(&self, booking_id: &str) -> Option<Booking> {
        self.store.find_booking(booking_id)
    }

    /// Operator controls for the channel directory (stop-sell, markup).
    pub fn channels(&self) -> &ChannelDirectory {
        &self.channels
    }

    /// Config-provider edge: replaces room types and re-derives the ledger.
    pub fn set_room_types(&self, room_types: Vec<RoomType>) -> Result<()> {
        for rt in &room_types {
            rt.validate()?;
        }
        self.store.set_room_types(room_types);
        info!("Room type configuration replaced, ledger rebuilt");
        Ok(())
    }

    /// Config-provider edge: replaces rate rules and re-derives the ledger.
    pub fn set_rules(&self, rules: RateRulesConfig) {
        self.store.set_rules(rules);
        info!("Rate rules replaced, ledger rebuilt");
    }

    /// Awaits all in-flight fan-out chains.
    pub async fn drain_sync(&self) {
        self.fanout.drain().await;
    }

    /// Validates and commits a booking against the current derived grid.
    ///
    /// Succeeds only if every covered night still has availability; on
    /// conflict a Rejected entry is appended to the log for audit and the
    /// grid stays untouched. Persistence is fire-and-forget: a store failure
    /// is logged, never rolled back.
    pub async fn commit_booking(
        &self,
        source: &str,
        room_type_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_name: &str,
    ) -> Result<Booking> {
        if self.channels.is_stopped(source) {
            error!(
                "Gateway reject: ignoring booking from '{}' (stop-sell active)",
                source
            );
            return Err(Error::ChannelStopped(source.to_string()));
        }

        let nights = nights_between(check_in, check_out);
        if nights.is_empty() {
            error!(
                "Validation: invalid date range {} to {} from '{}'",
                check_in, check_out, source
            );
            return Err(Error::InvalidDateRange {
                check_in,
                check_out,
            });
        }

        // Availability check, unit assignment and event append are one
        // indivisible step under the store lock.
        let booking = {
            let mut inner = self.store.lock();

            let room_type = inner
                .room_types
                .iter()
                .find(|rt| rt.id == room_type_id)
                .cloned()
                .ok_or_else(|| Error::UnknownRoomType(room_type_id.to_string()))?;

            let available = nights
                .iter()
                .all(|&night| inner.grid.available(night, room_type_id) > 0);
            if !available {
                let reason = format!(
                    "no availability for '{}' across {} to {}",
                    room_type.name, check_in, check_out
                );
                error!(
                    "Conflict: overbooking prevented for '{}' ({})",
                    source, reason
                );
                inner.events.push(SyncEvent::Booking(Booking {
                    id: new_event_id("b"),
                    room_type_id: room_type_id.to_string(),
                    unit: None,
                    guest_name: guest_name.to_string(),
                    source: source.to_string(),
                    status: BookingStatus::Rejected,
                    check_in,
                    check_out,
                    channel_sync: Default::default(),
                    amount: None,
                    rejection_reason: Some(reason.clone()),
                    timestamp: Utc::now(),
                }));
                // Rejected entries never hold inventory; no rebuild needed.
                return Err(Error::Conflict(reason));
            }

            let unit = match assign_unit(&room_type, &inner.events, check_in, check_out) {
                Some(unit) => unit,
                None => {
                    // Capacity counters allowed the booking but the unit
                    // roster disagrees; surface the drift instead of failing.
                    warn!(
                        "Data integrity: unit roster of '{}' exhausted, assigning sentinel",
                        room_type.name
                    );
                    UNASSIGNED_UNIT.to_string()
                }
            };

            let amount: i64 = nights
                .iter()
                .filter_map(|&night| inner.grid.cell(night, room_type_id))
                .map(|cell| cell.price)
                .sum();

            let booking = Booking {
                id: new_event_id("b"),
                room_type_id: room_type_id.to_string(),
                unit: Some(unit),
                guest_name: guest_name.to_string(),
                source: source.to_string(),
                status: BookingStatus::Confirmed,
                check_in,
                check_out,
                channel_sync: Default::default(),
                amount: Some(amount),
                rejection_reason: None,
                timestamp: Utc::now(),
            };
            inner.events.push(SyncEvent::Booking(booking.clone()));
            inner.rebuild(self.config.start_date, self.config.horizon_days);
            inner.grid.set_locked(room_type_id, &nights, true);
            booking
        };

        info!(
            "Commit: secured unit {} for booking {} ({} nights, '{}')",
            booking.unit.as_deref().unwrap_or("?"),
            booking.id,
            nights.len(),
            source
        );

        self.persist(booking.clone(), true);
        self.release_lock_later(room_type_id.to_string(), nights);
        Arc::clone(&self.fanout).fan_out(
            &booking.id,
            source,
            &format!("booking {}", booking.id),
            None,
        );

        Ok(booking)
    }

    /// Cancels a booking, restoring the capacity its nights consumed, and
    /// broadcasts a synthetic inventory-release event. No-op when the
    /// booking is already cancelled.
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<()> {
        let (booking, release) = {
            let mut inner = self.store.lock();
            let booking = inner
                .booking_mut(booking_id)
                .ok_or_else(|| Error::UnknownBooking(booking_id.to_string()))?;
            if booking.status == BookingStatus::Cancelled {
                return Ok(());
            }
            booking.status = BookingStatus::Cancelled;
            booking.timestamp = Utc::now();
            let booking = booking.clone();

            // Restores availability for every covered future night.
            inner.rebuild(self.config.start_date, self.config.horizon_days);

            let release = RateUpdateEvent {
                id: new_event_id("c"),
                room_type_id: booking.room_type_id.clone(),
                new_price: booking.amount.unwrap_or(0),
                date: None,
                rule_applied: Some(INVENTORY_RELEASE_LABEL.to_string()),
                channel_sync: Default::default(),
                channel_prices: Default::default(),
                timestamp: Utc::now(),
            };
            inner.events.push(SyncEvent::RateUpdate(release.clone()));
            (booking, release)
        };

        warn!(
            "Cancellation: booking {} released, inventory restored",
            booking.id
        );

        self.persist(booking.clone(), false);
        Arc::clone(&self.fanout).fan_out(
            &release.id,
            crate::models::PMS_SOURCE,
            &format!("inventory release for booking {}", booking.id),
            None,
        );

        Ok(())
    }

    /// Front-desk transition: Confirmed -> CheckedIn.
    pub async fn check_in(&self, booking_id: &str) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::Confirmed, BookingStatus::CheckedIn)
    }

    /// Front-desk transition: CheckedIn -> CheckedOut.
    pub async fn check_out(&self, booking_id: &str) -> Result<Booking> {
        self.transition(booking_id, BookingStatus::CheckedIn, BookingStatus::CheckedOut)
    }

    fn transition(
        &self,
        booking_id: &str,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Booking> {
        let booking = {
            let mut inner = self.store.lock();
            let booking = inner
                .booking_mut(booking_id)
                .ok_or_else(|| Error::UnknownBooking(booking_id.to_string()))?;
            if booking.status != from {
                return Err(Error::InvalidTransition(format!(
                    "booking {} is {:?}, expected {:?}",
                    booking_id, booking.status, from
                )));
            }
            booking.status = to;
            booking.timestamp = Utc::now();
            booking.clone()
            // Confirmed, CheckedIn and CheckedOut all hold inventory, so the
            // grid is unaffected by these transitions.
        };
        info!("Booking {} moved to {:?}", booking.id, to);
        self.persist(booking.clone(), false);
        Ok(booking)
    }

    /// Records a rate change (optionally for a single date), re-derives the
    /// ledger and fans the new price out with channel markups applied.
    pub async fn update_rate(
        &self,
        room_type_id: &str,
        new_price: i64,
        date: Option<NaiveDate>,
        rule_applied: Option<String>,
    ) -> Result<RateUpdateEvent> {
        let event = {
            let mut inner = self.store.lock();
            if !inner.room_types.iter().any(|rt| rt.id == room_type_id) {
                return Err(Error::UnknownRoomType(room_type_id.to_string()));
            }
            let event = RateUpdateEvent {
                id: new_event_id("r"),
                room_type_id: room_type_id.to_string(),
                new_price,
                date,
                rule_applied,
                channel_sync: Default::default(),
                channel_prices: Default::default(),
                timestamp: Utc::now(),
            };
            inner.events.push(SyncEvent::RateUpdate(event.clone()));
            inner.rebuild(self.config.start_date, self.config.horizon_days);
            event
        };

        info!(
            "Broadcast: rate {} for '{}'{}",
            new_price,
            room_type_id,
            match date {
                Some(d) => format!(" on {d}"),
                None => String::new(),
            }
        );

        Arc::clone(&self.fanout).fan_out(
            &event.id,
            crate::models::DIRECT_SOURCE,
            &format!("rate {} for {}", new_price, room_type_id),
            Some(new_price),
        );

        Ok(event)
    }

    fn persist(&self, booking: Booking, create: bool) {
        let persistence = Arc::clone(&self.persistence);
        tokio::spawn(async move {
            let result = if create {
                persistence.create_booking(&booking).await
            } else {
                persistence.update_booking(&booking).await
            };
            if let Err(e) = result {
                // Deliberate inconsistency window: in-memory state stands.
                error!("Persistence fail for booking {}: {}", booking.id, e);
            }
        });
    }

    fn release_lock_later(&self, room_type_id: String, nights: Vec<NaiveDate>) {
        let store = Arc::clone(&self.store);
        let delay = self.config.lock_release_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.set_locked(&room_type_id, &nights, false);
        });
    }
}

/// First free unit among the room type's roster, considering every active
/// booking whose stay intersects the requested range. None when the roster
/// is exhausted.
fn assign_unit(
    room_type: &RoomType,
    events: &[SyncEvent],
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Option<String> {
    let occupied: HashSet<&str> = events
        .iter()
        .filter_map(SyncEvent::as_booking)
        .filter(|b| {
            b.status.occupies_inventory()
                && b.room_type_id == room_type.id
                && b.overlaps(check_in, check_out)
        })
        .filter_map(|b| b.unit.as_deref())
        .collect();

    room_type
        .unit_roster()
        .into_iter()
        .find(|unit| !occupied.contains(unit.as_str()))
}
