//! Channel Sync - demo harness
//!
//! Seeds a demo property, runs a short scripted traffic scenario against the
//! engine (front-desk and OTA bookings, a stop-sell, a rate push, a
//! cancellation) and prints the resulting grid and propagation log.

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use channel_sync::{
    ChannelConnection, EngineConfig, InMemoryStore, Markup, Modifier, RateRulesConfig, RoomType,
    SimulatedTransport, SpecialEvent, SyncEngine, SyncEvent, WeeklyRule, DIRECT_SOURCE,
};

/// Hotel channel manager core - runs a simulated distribution scenario
#[derive(Parser, Debug)]
#[command(name = "channel_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Planning horizon in days
    #[arg(long, default_value_t = 1095)]
    horizon_days: u32,

    /// Simulated transport failure rate (0.0 - 1.0)
    #[arg(long, default_value_t = 0.1)]
    failure_rate: f64,

    /// Retry delay in milliseconds
    #[arg(long, default_value_t = 5000)]
    retry_delay_ms: u64,

    /// Number of simulated OTA bookings in the load phase
    #[arg(long, default_value_t = 8)]
    load: u32,
}

fn demo_room_types() -> Vec<RoomType> {
    vec![
        RoomType {
            id: "rt-1".into(),
            name: "Delux Room (AC)".into(),
            total_capacity: 10,
            base_price: 4500,
            floor_price: 3000,
            ceiling_price: 8000,
            base_occupancy: 2,
            amenities: vec!["WiFi".into(), "AC".into(), "TV".into()],
            units: (101..=110).map(|n| n.to_string()).collect(),
            extra_bed_charge: 1200,
        },
        RoomType {
            id: "rt-2".into(),
            name: "Double Bed Room".into(),
            total_capacity: 10,
            base_price: 2800,
            floor_price: 1800,
            ceiling_price: 5000,
            base_occupancy: 2,
            amenities: vec!["WiFi".into(), "Fan".into()],
            units: (201..=210).map(|n| n.to_string()).collect(),
            extra_bed_charge: 800,
        },
        RoomType {
            id: "rt-3".into(),
            name: "Single Bed Room".into(),
            total_capacity: 5,
            base_price: 1800,
            floor_price: 1200,
            ceiling_price: 3000,
            base_occupancy: 1,
            amenities: vec!["WiFi".into()],
            units: (301..=305).map(|n| n.to_string()).collect(),
            extra_bed_charge: 500,
        },
    ]
}

fn demo_rules() -> RateRulesConfig {
    RateRulesConfig {
        weekly: WeeklyRule {
            is_active: true,
            active_days: vec![5, 6], // Friday & Saturday
            modifier: Modifier::Percentage(1.20),
        },
        special_events: vec![
            SpecialEvent {
                id: "ev-1".into(),
                name: "Diwali Festival".into(),
                start_date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(),
                modifier: Modifier::Percentage(1.5),
            },
            SpecialEvent {
                id: "ev-2".into(),
                name: "New Year Eve".into(),
                start_date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                modifier: Modifier::Fixed(5000),
            },
        ],
    }
}

fn demo_channels() -> Vec<ChannelConnection> {
    vec![
        ChannelConnection::new("mmt", "MakeMyTrip").with_markup(Markup::Percentage(5.0)),
        ChannelConnection::new("booking", "Booking.com").with_markup(Markup::Fixed(150)),
        ChannelConnection {
            connected: false,
            ..ChannelConnection::new("expedia", "Expedia")
        },
    ]
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let today = Local::now().date_naive();

    log::info!("Starting channel_sync demo...");
    log::info!(
        "Horizon: {} days, failure rate: {}",
        args.horizon_days,
        args.failure_rate
    );

    let mut config = EngineConfig::new(today);
    config.horizon_days = args.horizon_days;
    config.retry_delay = Duration::from_millis(args.retry_delay_ms);

    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(SimulatedTransport::new(
        args.failure_rate,
        Duration::from_millis(500),
        Duration::from_millis(2500),
    ));

    let engine = match SyncEngine::new(
        config,
        demo_room_types(),
        demo_rules(),
        demo_channels(),
        transport,
        Arc::clone(&store) as Arc<dyn channel_sync::PersistenceGateway>,
    ) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to assemble engine: {e}");
            std::process::exit(1);
        }
    };

    run_scenario(&engine, today, args.load).await;

    engine.drain_sync().await;
    print_summary(&engine, today);
    log::info!("Demo complete. Persisted rows: {}", store.len());
}

async fn run_scenario(engine: &SyncEngine, today: NaiveDate, load: u32) {
    // Front-desk booking, three nights.
    if let Ok(b) = engine
        .commit_booking(
            DIRECT_SOURCE,
            "rt-1",
            today,
            today + ChronoDuration::days(3),
            "Asha Verma",
        )
        .await
    {
        let _ = engine.check_in(&b.id).await;
    }

    // OTA load phase: bookings from rotating sources across room types.
    let sources = ["MakeMyTrip", "Booking.com", DIRECT_SOURCE];
    let room_types = ["rt-1", "rt-2", "rt-3"];
    let mut last_id = None;
    for i in 0..load {
        let source = sources[(i as usize) % sources.len()];
        let rt = room_types[(i as usize) % room_types.len()];
        let start = today + ChronoDuration::days(i64::from(i % 5));
        match engine
            .commit_booking(
                source,
                rt,
                start,
                start + ChronoDuration::days(1),
                &format!("Load Guest {}", i + 1),
            )
            .await
        {
            Ok(b) => last_id = Some(b.id),
            Err(e) => log::warn!("Load booking {} rejected: {e}", i + 1),
        }
    }

    // Operator engages a stop-sell mid-flight; the next events skip the
    // channel without a dispatch attempt.
    engine.channels().set_stopped("booking", true);
    let _ = engine
        .commit_booking(
            "MakeMyTrip",
            "rt-2",
            today + ChronoDuration::days(7),
            today + ChronoDuration::days(9),
            "Rahul Nair",
        )
        .await;

    // Manual rate push for next Saturday, with channel markups applied.
    let _ = engine
        .update_rate("rt-1", 5200, Some(today + ChronoDuration::days(2)), None)
        .await;

    // Incoming cancellation webhook for the last load booking.
    if let Some(id) = last_id {
        if let Err(e) = engine.cancel_booking(&id).await {
            log::warn!("Cancellation failed: {e}");
        }
    }
}

fn print_summary(engine: &SyncEngine, today: NaiveDate) {
    let grid = engine.grid();
    println!(
        "\nAvailability / price grid ({} cells, next 7 days shown):",
        grid.len()
    );
    for rt in ["rt-1", "rt-2", "rt-3"] {
        let mut line = format!("  {rt}:");
        for offset in 0..7 {
            let date = today + ChronoDuration::days(offset);
            if let Some(cell) = grid.cell(date, rt) {
                line.push_str(&format!(
                    " {}@{}{}",
                    cell.available_count,
                    cell.price,
                    if cell.applied_rule.is_some() { "*" } else { "" }
                ));
            }
        }
        println!("{line}");
    }

    println!("\nPropagation log:");
    for event in engine.events() {
        match &event {
            SyncEvent::Booking(b) => {
                println!(
                    "  {} [{:?}] {} {} -> {} sync: {:?}",
                    b.id, b.status, b.source, b.check_in, b.check_out, b.channel_sync
                );
            }
            SyncEvent::RateUpdate(r) => {
                println!(
                    "  {} rate {} ({}) sync: {:?} prices: {:?}",
                    r.id,
                    r.new_price,
                    r.rule_applied.as_deref().unwrap_or("manual"),
                    r.channel_sync,
                    r.channel_prices
                );
            }
        }
    }
}
