//! Unit tests for the fan-out engine's chain registry.

use super::*;
use crate::models::{RateRulesConfig, RateUpdateEvent, RoomType, SyncEvent};
use crate::transport::ScriptedTransport;
use chrono::{NaiveDate, Utc};

fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

fn room_type() -> RoomType {
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

fn rate_event(id: &str) -> SyncEvent {
    SyncEvent::RateUpdate(RateUpdateEvent {
        id: id.into(),
        room_type_id: "rt-1".into(),
        new_price: 4500,
        date: None,
        rule_applied: None,
        channel_sync: Default::default(),
        channel_prices: Default::default(),
        timestamp: Utc::now(),
    })
}

fn engine_with(transport: Arc<ScriptedTransport>, retry_delay: Duration) -> Arc<FanOutEngine> {
    let store = Arc::new(PropertyStore::new(
        day0(),
        10,
        vec![room_type()],
        RateRulesConfig::default(),
    ));
    store.lock().events.push(rate_event("r-1"));
    let channels = Arc::new(ChannelDirectory::new(vec![ChannelConnection::new(
        "expedia", "Expedia",
    )]));
    Arc::new(FanOutEngine::new(
        store,
        channels,
        transport as _,
        DEFAULT_MAX_RETRIES,
        retry_delay,
    ))
}

#[tokio::test(start_paused = true)]
async fn completed_chain_unregisters_itself() {
    let transport = Arc::new(ScriptedTransport::always(DispatchOutcome::Delivered));
    let engine = engine_with(Arc::clone(&transport), Duration::from_secs(5));

    Arc::clone(&engine).fan_out("r-1", "PMS", "rate 4500", None);
    assert_eq!(engine.chain_count(), 1);
    engine.drain().await;

    assert_eq!(engine.chain_count(), 0);
    assert_eq!(transport.attempts_for("Expedia"), 1);
}

#[tokio::test(start_paused = true)]
async fn superseding_fanout_replaces_a_waiting_chain() {
    let transport = Arc::new(ScriptedTransport::always(DispatchOutcome::Delivered));
    // First dispatch fails, parking the chain in its long retry sleep.
    transport.script("Expedia", vec![DispatchOutcome::Rejected]);
    let engine = engine_with(Arc::clone(&transport), Duration::from_secs(600));

    Arc::clone(&engine).fan_out("r-1", "PMS", "rate 4500", None);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(transport.attempts_for("Expedia"), 1);

    // Second fan-out for the same (event, channel): the waiting chain is
    // aborted and must not unregister its replacement when it unwinds.
    Arc::clone(&engine).fan_out("r-1", "PMS", "rate 4500", None);
    engine.drain().await;

    assert_eq!(engine.chain_count(), 0);
    assert_eq!(transport.attempts_for("Expedia"), 2);
    let status = engine
        .store
        .events()
        .into_iter()
        .find(|e| e.id() == "r-1")
        .and_then(|e| e.channel_sync().get("Expedia").copied());
    assert_eq!(status, Some(ChannelStatus::Success));
}

#[tokio::test(start_paused = true)]
async fn stale_generation_does_not_remove_the_live_chain() {
    let transport = Arc::new(ScriptedTransport::always(DispatchOutcome::Delivered));
    transport.script("Expedia", vec![DispatchOutcome::Rejected]);
    let engine = engine_with(Arc::clone(&transport), Duration::from_secs(600));

    Arc::clone(&engine).fan_out("r-1", "PMS", "rate 4500", None);
    tokio::time::sleep(Duration::from_millis(1)).await;
    Arc::clone(&engine).fan_out("r-1", "PMS", "rate 4500", None);

    // The first chain's cleanup path must leave the second chain's entry in
    // place even though both share the registry key.
    {
        let chains = engine.chains.lock().unwrap();
        let (generation, _) = chains
            .get(&("r-1".to_string(), "Expedia".to_string()))
            .expect("replacement chain registered");
        assert_eq!(*generation, 1);
    }
    engine.drain().await;
    assert_eq!(engine.chain_count(), 0);
}
