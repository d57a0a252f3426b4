//! Error types for channel_sync operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for ledger, booking and distribution operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Availability check failed; the booking was rejected without touching
    /// the derived grid.
    #[error("inventory conflict: {0}")]
    Conflict(String),
    /// Empty or inverted check-in/check-out range.
    #[error("invalid date range: check-in {check_in} is not before check-out {check_out}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    /// The originating channel has its stop-sell switch engaged.
    #[error("channel '{0}' is stopped (stop-sell active)")]
    ChannelStopped(String),
    /// Room type id not present in the current configuration.
    #[error("unknown room type: {0}")]
    UnknownRoomType(String),
    /// Booking id not present in the event log.
    #[error("unknown booking: {0}")]
    UnknownBooking(String),
    /// A status transition that the booking lifecycle does not allow.
    #[error("invalid booking transition: {0}")]
    InvalidTransition(String),
    /// Room type configuration violates an invariant (e.g. price band order).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The external store refused or failed a write. Never fatal to the
    /// in-memory state; callers log and move on.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Result alias for channel_sync operations.
pub type Result<T> = std::result::Result<T, Error>;
