//! Yield pricing engine.
//!
//! Pure rate computation: maps (base price, date, room type, rules) to a
//! clamped, rounded price plus the label of the rule that produced it.
//! Manual per-date overrides outrank everything here, but those are applied
//! by the ledger before this engine is consulted for a cell.

use chrono::{Datelike, NaiveDate};

use crate::models::{RateRulesConfig, RoomType};

/// Label attached to cells priced by the weekday rule.
pub const WEEKLY_STRATEGY_LABEL: &str = "Weekly Strategy";

/// Outcome of a yield computation for one (date, room type) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub price: i64,
    pub applied_rule: Option<String>,
}

/// Computes the final nightly rate for a date.
///
/// Priority: first special event whose inclusive range contains the date
/// (configuration order, no overlap resolution beyond "first listed"), then
/// the weekly rule if active and the weekday matches, then the base price
/// unmodified. The result is clamped to the room type's [floor, ceiling]
/// band and rounded to the nearest integer currency unit.
pub fn final_rate(
    base_price: i64,
    date: NaiveDate,
    room_type: &RoomType,
    rules: &RateRulesConfig,
) -> RateQuote {
    let mut price = base_price as f64;
    let mut applied_rule = None;

    if let Some(event) = rules.special_events.iter().find(|e| e.contains(date)) {
        price = event.modifier.apply(base_price as f64);
        applied_rule = Some(event.name.clone());
    } else if rules.weekly.is_active {
        let weekday = date.weekday().num_days_from_sunday();
        if rules.weekly.active_days.contains(&weekday) {
            price = rules.weekly.modifier.apply(base_price as f64);
            applied_rule = Some(WEEKLY_STRATEGY_LABEL.to_string());
        }
    }

    let clamped = price
        .max(room_type.floor_price as f64)
        .min(room_type.ceiling_price as f64);

    RateQuote {
        price: clamped.round() as i64,
        applied_rule,
    }
}

#[cfg(test)]
#[path = "pricing_tests.rs"]
mod tests;
