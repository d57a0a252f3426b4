//! Domain model shared by the ledger, booking manager and fan-out engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Source label used for front-desk (non-OTA) bookings and manual rate edits.
pub const DIRECT_SOURCE: &str = "Direct";
/// Origin label for events the system itself emits (e.g. inventory release
/// after a cancellation).
pub const PMS_SOURCE: &str = "PMS";
/// Sentinel unit assigned when the unit roster is exhausted but the capacity
/// counters still allowed the booking.
pub const UNASSIGNED_UNIT: &str = "Unassigned";

/// Rate adjustment attached to a yield rule.
///
/// Percentage modifiers are multipliers (1.20 = +20%); fixed modifiers add a
/// flat amount in integer currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Modifier {
    Percentage(f64),
    Fixed(i64),
}

impl Modifier {
    pub fn apply(&self, base: f64) -> f64 {
        match self {
            Modifier::Percentage(multiplier) => base * multiplier,
            Modifier::Fixed(amount) => base + *amount as f64,
        }
    }
}

/// Channel-level price markup. Unlike [`Modifier`], percentage markups are
/// expressed in percent (5.0 = +5%), matching how operators configure OTAs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Markup {
    Percentage(f64),
    Fixed(i64),
}

impl Markup {
    pub fn apply(&self, base: i64) -> i64 {
        match self {
            Markup::Percentage(percent) => (base as f64 * (1.0 + percent / 100.0)).round() as i64,
            Markup::Fixed(amount) => base + amount,
        }
    }
}

/// A bookable room category with its price band and physical unit roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub total_capacity: u32,
    pub base_price: i64,
    pub floor_price: i64,
    pub ceiling_price: i64,
    pub base_occupancy: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Physical unit identifiers (room numbers). May be empty, in which case
    /// a synthetic roster is derived from the capacity.
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub extra_bed_charge: i64,
}

impl RoomType {
    /// Checks the price band invariant: floor <= base <= ceiling.
    pub fn validate(&self) -> Result<()> {
        if self.floor_price > self.base_price || self.base_price > self.ceiling_price {
            return Err(Error::InvalidConfig(format!(
                "room type '{}': price band must satisfy floor <= base <= ceiling \
                 (got {} <= {} <= {})",
                self.id, self.floor_price, self.base_price, self.ceiling_price
            )));
        }
        Ok(())
    }

    /// The explicit unit list, or a capacity-derived synthetic one when the
    /// configuration carries no room numbers.
    pub fn unit_roster(&self) -> Vec<String> {
        if !self.units.is_empty() {
            return self.units.clone();
        }
        let prefix: String = self.name.chars().take(2).collect::<String>().to_uppercase();
        (0..self.total_capacity)
            .map(|i| format!("{}-{}", prefix, 101 + i))
            .collect()
    }
}

/// Weekday-driven pricing rule. Day indices follow the 0=Sunday .. 6=Saturday
/// convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRule {
    pub is_active: bool,
    pub active_days: Vec<u32>,
    pub modifier: Modifier,
}

/// Date-ranged pricing rule; both endpoints are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub modifier: Modifier,
}

impl SpecialEvent {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Full rate-rule configuration. Special events are ordered; the first event
/// containing a date wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRulesConfig {
    pub weekly: WeeklyRule,
    pub special_events: Vec<SpecialEvent>,
}

impl Default for RateRulesConfig {
    fn default() -> Self {
        Self {
            weekly: WeeklyRule {
                is_active: false,
                active_days: Vec::new(),
                modifier: Modifier::Percentage(1.0),
            },
            special_events: Vec::new(),
        }
    }
}

/// Per-channel synchronization state of one event. Absence from the map means
/// the channel has not been considered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Pending,
    Success,
    Error,
    Retrying,
    WaitingRetry,
    Stopped,
}

impl ChannelStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChannelStatus::Success | ChannelStatus::Error | ChannelStatus::Stopped
        )
    }
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Whether a booking in this status holds inventory. Checked-out stays
    /// counted so past cells keep reflecting the stay.
    pub fn occupies_inventory(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::CheckedIn | BookingStatus::CheckedOut
        )
    }
}

/// A reservation recorded in the event log. Never deleted; superseded by
/// status transitions only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub room_type_id: String,
    /// Assigned physical unit, set at commit time.
    pub unit: Option<String>,
    pub guest_name: String,
    /// Originating channel name, or [`DIRECT_SOURCE`].
    pub source: String,
    pub status: BookingStatus,
    pub check_in: NaiveDate,
    /// Exclusive: the guest departs this day.
    pub check_out: NaiveDate,
    #[serde(default)]
    pub channel_sync: HashMap<String, ChannelStatus>,
    pub amount: Option<i64>,
    pub rejection_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Booking {
    /// The covered nights as a list of dates, half-open on check-out.
    pub fn nights(&self) -> Vec<NaiveDate> {
        nights_between(self.check_in, self.check_out)
    }

    /// Whether the stay intersects the half-open range [check_in, check_out).
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && self.check_out > check_in
    }
}

/// Expands a half-open [check_in, check_out) range into covered nights.
/// Empty when the range is inverted or zero-length.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    let mut nights = Vec::new();
    let mut day = check_in;
    while day < check_out {
        nights.push(day);
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    nights
}

/// A rate change recorded in the event log, either a manual edit or a
/// synthetic entry emitted by the system (e.g. inventory release).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateUpdateEvent {
    pub id: String,
    pub room_type_id: String,
    pub new_price: i64,
    /// When set, the ledger overwrites exactly this cell's price.
    pub date: Option<NaiveDate>,
    pub rule_applied: Option<String>,
    #[serde(default)]
    pub channel_sync: HashMap<String, ChannelStatus>,
    /// Price actually sent to each channel after markup.
    #[serde(default)]
    pub channel_prices: HashMap<String, i64>,
    pub timestamp: DateTime<Utc>,
}

/// Event-log entry: the shared substrate both the ledger and the fan-out
/// engine read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    Booking(Booking),
    RateUpdate(RateUpdateEvent),
}

impl SyncEvent {
    pub fn id(&self) -> &str {
        match self {
            SyncEvent::Booking(b) => &b.id,
            SyncEvent::RateUpdate(r) => &r.id,
        }
    }

    pub fn channel_sync(&self) -> &HashMap<String, ChannelStatus> {
        match self {
            SyncEvent::Booking(b) => &b.channel_sync,
            SyncEvent::RateUpdate(r) => &r.channel_sync,
        }
    }

    pub(crate) fn channel_sync_mut(&mut self) -> &mut HashMap<String, ChannelStatus> {
        match self {
            SyncEvent::Booking(b) => &mut b.channel_sync,
            SyncEvent::RateUpdate(r) => &mut r.channel_sync,
        }
    }

    pub fn as_booking(&self) -> Option<&Booking> {
        match self {
            SyncEvent::Booking(b) => Some(b),
            SyncEvent::RateUpdate(_) => None,
        }
    }
}

/// A configured distribution channel as seen by the fan-out engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConnection {
    pub id: String,
    pub name: String,
    pub connected: bool,
    /// Master stop-sell switch: suppresses all dispatch without retries.
    pub stopped: bool,
    pub markup: Option<Markup>,
}

impl ChannelConnection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connected: true,
            stopped: false,
            markup: None,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }
}

/// One cell of the derived availability/price grid. Regenerated wholesale on
/// every recomputation; never hand-edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryCell {
    pub date: NaiveDate,
    pub room_type_id: String,
    pub available_count: u32,
    pub price: i64,
    pub applied_rule: Option<String>,
    /// Advisory flag set while a commit is in flight for this cell; cleared
    /// after a short fixed delay. Not a concurrency barrier.
    pub is_locked: bool,
}

pub(crate) fn new_event_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
