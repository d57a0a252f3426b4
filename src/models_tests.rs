//! Unit tests for the domain model.

use super::*;
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
        amenities: vec!["WiFi".into(), "AC".into()],
        units: (101..=110).map(|n| n.to_string()).collect(),
        extra_bed_charge: 1200,
    }
}

mod room_type_tests {
    use super::*;

    #[test]
    fn validate_accepts_ordered_price_band() {
        assert!(delux().validate().is_ok());
    }

    #[test]
    fn validate_rejects_floor_above_base() {
        let mut rt = delux();
        rt.floor_price = 5000;
        assert!(matches!(rt.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_base_above_ceiling() {
        let mut rt = delux();
        rt.ceiling_price = 4000;
        assert!(rt.validate().is_err());
    }

    #[test]
    fn unit_roster_prefers_explicit_list() {
        let roster = delux().unit_roster();
        assert_eq!(roster.len(), 10);
        assert_eq!(roster[0], "101");
    }

    #[test]
    fn unit_roster_synthesizes_from_capacity() {
        let mut rt = delux();
        rt.units.clear();
        rt.total_capacity = 3;
        let roster = rt.unit_roster();
        assert_eq!(roster, vec!["DE-101", "DE-102", "DE-103"]);
    }
}

mod modifier_tests {
    use super::*;

    #[test]
    fn percentage_modifier_multiplies() {
        assert_eq!(Modifier::Percentage(1.20).apply(4500.0), 5400.0);
    }

    #[test]
    fn fixed_modifier_adds() {
        assert_eq!(Modifier::Fixed(5000).apply(4500.0), 9500.0);
    }

    #[test]
    fn percentage_markup_is_expressed_in_percent() {
        assert_eq!(Markup::Percentage(5.0).apply(4500), 4725);
    }

    #[test]
    fn fixed_markup_adds_flat_amount() {
        assert_eq!(Markup::Fixed(150).apply(4500), 4650);
    }
}

mod booking_tests {
    use super::*;
    use chrono::Utc;

    fn booking(check_in: NaiveDate, check_out: NaiveDate) -> Booking {
        Booking {
            id: "b-1".into(),
            room_type_id: "rt-1".into(),
            unit: Some("101".into()),
            guest_name: "Asha Verma".into(),
            source: DIRECT_SOURCE.into(),
            status: BookingStatus::Confirmed,
            check_in,
            check_out,
            channel_sync: Default::default(),
            amount: None,
            rejection_reason: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn nights_are_half_open() {
        let b = booking(date(2025, 9, 1), date(2025, 9, 4));
        assert_eq!(
            b.nights(),
            vec![date(2025, 9, 1), date(2025, 9, 2), date(2025, 9, 3)]
        );
    }

    #[test]
    fn inverted_range_has_no_nights() {
        assert!(nights_between(date(2025, 9, 4), date(2025, 9, 1)).is_empty());
        assert!(nights_between(date(2025, 9, 1), date(2025, 9, 1)).is_empty());
    }

    #[test]
    fn overlap_is_exclusive_at_boundaries() {
        let b = booking(date(2025, 9, 1), date(2025, 9, 4));
        // Back-to-back stays share a turnover day but do not overlap.
        assert!(!b.overlaps(date(2025, 9, 4), date(2025, 9, 6)));
        assert!(!b.overlaps(date(2025, 8, 28), date(2025, 9, 1)));
        assert!(b.overlaps(date(2025, 9, 3), date(2025, 9, 5)));
    }

    #[test]
    fn cancelled_and_rejected_release_inventory() {
        assert!(BookingStatus::Confirmed.occupies_inventory());
        assert!(BookingStatus::CheckedIn.occupies_inventory());
        assert!(BookingStatus::CheckedOut.occupies_inventory());
        assert!(!BookingStatus::Cancelled.occupies_inventory());
        assert!(!BookingStatus::Rejected.occupies_inventory());
    }
}

mod channel_status_tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ChannelStatus::Success.is_terminal());
        assert!(ChannelStatus::Error.is_terminal());
        assert!(ChannelStatus::Stopped.is_terminal());
        assert!(!ChannelStatus::Pending.is_terminal());
        assert!(!ChannelStatus::Retrying.is_terminal());
        assert!(!ChannelStatus::WaitingRetry.is_terminal());
    }
}
