//! Unit tests for the channel directory.

use super::*;

fn directory() -> ChannelDirectory {
    ChannelDirectory::new(vec![
        ChannelConnection::new("mmt", "MakeMyTrip").with_markup(Markup::Percentage(5.0)),
        ChannelConnection::new("booking", "Booking.com"),
        ChannelConnection {
            connected: false,
            ..ChannelConnection::new("expedia", "Expedia")
        },
    ])
}

#[test]
fn connected_filters_disconnected_channels() {
    let names: Vec<String> = directory().connected().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["MakeMyTrip", "Booking.com"]);
}

#[test]
fn stop_sell_switch_round_trips() {
    let dir = directory();
    assert!(!dir.is_stopped("Booking.com"));
    assert!(dir.set_stopped("booking", true));
    assert!(dir.is_stopped("Booking.com"));
    assert!(dir.set_stopped("booking", false));
    assert!(!dir.is_stopped("Booking.com"));
}

#[test]
fn unknown_names_are_never_stopped() {
    let dir = directory();
    assert!(!dir.is_stopped("Direct"));
    assert!(!dir.set_stopped("nope", true));
}

#[test]
fn markup_can_be_changed_live() {
    let dir = directory();
    assert!(dir.set_markup("booking", Some(Markup::Fixed(150))));
    assert_eq!(
        dir.get("Booking.com").unwrap().markup,
        Some(Markup::Fixed(150))
    );
}

#[test]
fn upsert_replaces_by_id() {
    let dir = directory();
    let mut replacement = ChannelConnection::new("mmt", "MakeMyTrip");
    replacement.stopped = true;
    dir.upsert(replacement);
    assert!(dir.is_stopped("MakeMyTrip"));
    assert_eq!(dir.all().len(), 3);

    dir.upsert(ChannelConnection::new("agoda", "Agoda"));
    assert_eq!(dir.all().len(), 4);
}
