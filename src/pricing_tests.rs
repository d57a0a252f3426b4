//! Unit tests for the yield pricing engine.

use super::*;
use crate::models::{Modifier, SpecialEvent, WeeklyRule};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn delux() -> RoomType {
    RoomType {
        id: "rt-1".into(),
        name: "Delux Room (AC)".into(),
        total_capacity: 10,
        base_price: 4500,
        floor_price: 3000,
        ceiling_price: 8000,
        base_occupancy: 2,
        amenities: Vec::new(),
        units: Vec::new(),
        extra_bed_charge: 0,
    }
}

fn weekend_rules() -> RateRulesConfig {
    RateRulesConfig {
        weekly: WeeklyRule {
            is_active: true,
            active_days: vec![5, 6], // Friday & Saturday
            modifier: Modifier::Percentage(1.20),
        },
        special_events: Vec::new(),
    }
}

fn diwali() -> SpecialEvent {
    SpecialEvent {
        id: "ev-1".into(),
        name: "Diwali".into(),
        start_date: date(2025, 10, 30),
        end_date: date(2025, 11, 5),
        modifier: Modifier::Fixed(5000),
    }
}

#[test]
fn base_price_passes_through_without_rules() {
    let quote = final_rate(4500, date(2025, 9, 3), &delux(), &RateRulesConfig::default());
    assert_eq!(quote.price, 4500);
    assert_eq!(quote.applied_rule, None);
}

#[test]
fn weekly_rule_applies_on_active_weekday() {
    // 2025-09-05 is a Friday.
    let quote = final_rate(4500, date(2025, 9, 5), &delux(), &weekend_rules());
    assert_eq!(quote.price, 5400);
    assert_eq!(quote.applied_rule.as_deref(), Some(WEEKLY_STRATEGY_LABEL));
}

#[test]
fn weekly_rule_skips_inactive_weekday() {
    // 2025-09-03 is a Wednesday.
    let quote = final_rate(4500, date(2025, 9, 3), &delux(), &weekend_rules());
    assert_eq!(quote.price, 4500);
    assert_eq!(quote.applied_rule, None);
}

#[test]
fn inactive_weekly_rule_is_ignored() {
    let mut rules = weekend_rules();
    rules.weekly.is_active = false;
    let quote = final_rate(4500, date(2025, 9, 5), &delux(), &rules);
    assert_eq!(quote.price, 4500);
}

#[test]
fn special_event_overrides_weekly_rule() {
    // 2025-11-01 is a Saturday inside the Diwali window; the event wins and
    // the fixed +5000 pushes the price into the ceiling clamp.
    let mut rules = weekend_rules();
    rules.special_events.push(diwali());
    let quote = final_rate(4500, date(2025, 11, 1), &delux(), &rules);
    assert_eq!(quote.applied_rule.as_deref(), Some("Diwali"));
    assert_eq!(quote.price, 8000);
}

#[test]
fn special_event_range_is_inclusive() {
    let mut rules = RateRulesConfig::default();
    rules.special_events.push(diwali());
    assert_eq!(
        final_rate(4500, date(2025, 10, 30), &delux(), &rules).applied_rule.as_deref(),
        Some("Diwali")
    );
    assert_eq!(
        final_rate(4500, date(2025, 11, 5), &delux(), &rules).applied_rule.as_deref(),
        Some("Diwali")
    );
    assert_eq!(
        final_rate(4500, date(2025, 11, 6), &delux(), &rules).applied_rule,
        None
    );
}

#[test]
fn first_listed_event_wins_on_overlap() {
    let mut rules = RateRulesConfig::default();
    rules.special_events.push(SpecialEvent {
        id: "ev-a".into(),
        name: "Conference".into(),
        start_date: date(2025, 11, 1),
        end_date: date(2025, 11, 3),
        modifier: Modifier::Percentage(1.10),
    });
    rules.special_events.push(diwali());
    let quote = final_rate(4500, date(2025, 11, 2), &delux(), &rules);
    assert_eq!(quote.applied_rule.as_deref(), Some("Conference"));
    assert_eq!(quote.price, 4950);
}

#[test]
fn price_is_clamped_to_floor() {
    let mut rules = RateRulesConfig::default();
    rules.special_events.push(SpecialEvent {
        id: "ev-low".into(),
        name: "Monsoon Discount".into(),
        start_date: date(2025, 7, 1),
        end_date: date(2025, 7, 31),
        modifier: Modifier::Percentage(0.5),
    });
    let quote = final_rate(4500, date(2025, 7, 10), &delux(), &rules);
    assert_eq!(quote.price, 3000);
}

#[test]
fn price_is_rounded_to_nearest_unit() {
    let mut rules = RateRulesConfig::default();
    rules.special_events.push(SpecialEvent {
        id: "ev-odd".into(),
        name: "Odd".into(),
        start_date: date(2025, 8, 1),
        end_date: date(2025, 8, 1),
        modifier: Modifier::Percentage(1.2345),
    });
    // 4500 * 1.2345 = 5555.25, rounds to 5555.
    let quote = final_rate(4500, date(2025, 8, 1), &delux(), &rules);
    assert_eq!(quote.price, 5555);
}
