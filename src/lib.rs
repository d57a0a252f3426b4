//! Channel Sync - Inventory Ledger & Distribution Engine
//!
//! Manages the availability/price ledger for a property's room inventory and
//! propagates every state change (new booking, cancellation, price change)
//! to the configured external sales channels, each of which may accept,
//! reject, lag or go offline. Transport and persistence are simulated behind
//! injectable collaborator traits; there is no real network anywhere.

pub mod channels;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod ledger;
pub mod models;
pub mod persistence;
pub mod pricing;
pub mod store;
pub mod transport;

// Re-export commonly used items
pub use channels::ChannelDirectory;
pub use engine::{EngineConfig, SyncEngine, INVENTORY_RELEASE_LABEL};
pub use error::{Error, Result};
pub use fanout::{FanOutEngine, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use ledger::{rebuild, InventoryGrid, DEFAULT_HORIZON_DAYS, MANUAL_OVERRIDE_LABEL};
pub use models::{
    nights_between, Booking, BookingStatus, ChannelConnection, ChannelStatus, InventoryCell,
    Markup, Modifier, RateRulesConfig, RateUpdateEvent, RoomType, SpecialEvent, SyncEvent,
    WeeklyRule, DIRECT_SOURCE, PMS_SOURCE, UNASSIGNED_UNIT,
};
pub use persistence::{InMemoryStore, PersistenceGateway};
pub use pricing::{final_rate, RateQuote, WEEKLY_STRATEGY_LABEL};
pub use store::PropertyStore;
pub use transport::{
    DispatchOutcome, DispatchPayload, ScriptedTransport, SimulatedTransport, Transport,
};
