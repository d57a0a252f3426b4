//! Inventory ledger: derives the availability/price grid from configuration
//! and the event log.
//!
//! The grid is a pure function of (room types, rate rules, event log). Every
//! recomputation rebuilds it wholesale; nothing patches cells incrementally,
//! which is what makes repeated rebuilds from identical inputs bit-identical.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::models::{InventoryCell, RateRulesConfig, RoomType, SyncEvent};
use crate::pricing;

/// Default planning horizon in days (three years).
pub const DEFAULT_HORIZON_DAYS: u32 = 1095;

/// Label recorded when a dated rate override carries no rule name.
pub const MANUAL_OVERRIDE_LABEL: &str = "Manual Override";

/// The derived date x room-type grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryGrid {
    // room type id -> date -> cell; BTreeMap keeps dates in calendar order
    // for display and deterministic iteration.
    cells: HashMap<String, BTreeMap<NaiveDate, InventoryCell>>,
}

impl InventoryGrid {
    pub fn cell(&self, date: NaiveDate, room_type_id: &str) -> Option<&InventoryCell> {
        self.cells.get(room_type_id)?.get(&date)
    }

    fn cell_mut(&mut self, date: NaiveDate, room_type_id: &str) -> Option<&mut InventoryCell> {
        self.cells.get_mut(room_type_id)?.get_mut(&date)
    }

    /// Available units for a (date, room type); 0 for cells outside the grid.
    pub fn available(&self, date: NaiveDate, room_type_id: &str) -> u32 {
        self.cell(date, room_type_id)
            .map(|c| c.available_count)
            .unwrap_or(0)
    }

    /// Cells of one room type in calendar order.
    pub fn room_type_cells(&self, room_type_id: &str) -> impl Iterator<Item = &InventoryCell> {
        self.cells.get(room_type_id).into_iter().flat_map(|m| m.values())
    }

    /// All cells, unordered across room types.
    pub fn cells(&self) -> impl Iterator<Item = &InventoryCell> {
        self.cells.values().flat_map(|m| m.values())
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flips the advisory lock flag on a set of cells.
    pub(crate) fn set_locked(&mut self, room_type_id: &str, dates: &[NaiveDate], locked: bool) {
        for &date in dates {
            if let Some(cell) = self.cell_mut(date, room_type_id) {
                cell.is_locked = locked;
            }
        }
    }

    fn insert(&mut self, cell: InventoryCell) {
        self.cells
            .entry(cell.room_type_id.clone())
            .or_default()
            .insert(cell.date, cell);
    }
}

/// Rebuilds the full grid for `horizon_days` starting at `start`.
///
/// Pass order matters and mirrors the event-log semantics:
/// 1. seed every cell with full capacity and the yield-engine price,
/// 2. overwrite prices for dated rate overrides (later log entries win),
/// 3. deduct one unit per night for every booking that holds inventory,
///    floored at zero.
pub fn rebuild(
    start: NaiveDate,
    horizon_days: u32,
    room_types: &[RoomType],
    rules: &RateRulesConfig,
    events: &[SyncEvent],
) -> InventoryGrid {
    let mut grid = InventoryGrid::default();

    for offset in 0..horizon_days {
        let date = start + Duration::days(i64::from(offset));
        for rt in room_types {
            let quote = pricing::final_rate(rt.base_price, date, rt, rules);
            grid.insert(InventoryCell {
                date,
                room_type_id: rt.id.clone(),
                available_count: rt.total_capacity,
                price: quote.price,
                applied_rule: quote.applied_rule,
                is_locked: false,
            });
        }
    }

    for event in events {
        if let SyncEvent::RateUpdate(update) = event {
            if let Some(date) = update.date {
                if let Some(cell) = grid.cell_mut(date, &update.room_type_id) {
                    cell.price = update.new_price;
                    cell.applied_rule = Some(
                        update
                            .rule_applied
                            .clone()
                            .unwrap_or_else(|| MANUAL_OVERRIDE_LABEL.to_string()),
                    );
                }
            }
        }
    }

    for event in events {
        if let SyncEvent::Booking(booking) = event {
            if !booking.status.occupies_inventory() {
                continue;
            }
            for night in booking.nights() {
                if let Some(cell) = grid.cell_mut(night, &booking.room_type_id) {
                    cell.available_count = cell.available_count.saturating_sub(1);
                }
            }
        }
    }

    grid
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
