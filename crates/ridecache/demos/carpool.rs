// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Walks a ride search through its fresh, stale, and expired phases.
//!
//! The clock is driven by hand so the two-minute and one-hour windows pass instantly.
//! Run with `cargo run --example carpool --features test-util`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ridecache::{
    CacheStore, CachedPayload, CarpoolBackend, CarpoolData, Ride, RideFilters, TelemetryConfig, Transaction, UserProfile,
};
use ridecache_durable::{DurableTier, MemoryKeyValueStore};
use tick::ClockControl;

#[derive(Default)]
struct Backend {
    calls: AtomicU32,
}

impl CarpoolBackend for Backend {
    type Error = String;

    async fn ride_listings(&self, filters: &RideFilters) -> Result<Vec<Ride>, String> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(vec![Ride {
            id: format!("r{call}"),
            driver_id: "d1".to_string(),
            from: filters.from.clone().unwrap_or_else(|| "North Campus".to_string()),
            to: "Airport".to_string(),
            departure: "2024-09-01T08:00:00Z".to_string(),
            seats_available: 3,
            price_cents: 450,
        }])
    }

    async fn ride(&self, ride_id: &str) -> Result<Ride, String> {
        Err(format!("ride {ride_id} is not part of this demo"))
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, String> {
        Ok(UserProfile {
            id: user_id.to_string(),
            display_name: "Demo Student".to_string(),
            university: None,
            verified: true,
        })
    }

    async fn user_rides(&self, _user_id: &str) -> Result<Vec<Ride>, String> {
        Ok(Vec::new())
    }

    async fn user_transactions(&self, _user_id: &str) -> Result<Vec<Transaction>, String> {
        Ok(Vec::new())
    }
}

fn describe(rides: &[Ride]) -> String {
    rides.iter().map(|r| r.id.as_str()).collect::<Vec<_>>().join(", ")
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let control = ClockControl::new();
    let store = CacheStore::builder::<CachedPayload>(control.to_clock())
        .name("carpool-demo")
        .durable(DurableTier::new(MemoryKeyValueStore::new()))
        .telemetry(TelemetryConfig::new().with_logs().build())
        .build();
    let data = CarpoolData::new(Backend::default(), Arc::new(store));
    let filters = RideFilters::new().from("North Campus");

    let rides = data.ride_listings(&filters).await?;
    println!("t=0s     fetched: {} (backend calls: {})", describe(&rides), data.backend().calls.load(Ordering::Relaxed));

    control.advance(Duration::from_secs(60));
    let rides = data.ride_listings(&filters).await?;
    println!("t=60s    fresh:   {} (backend calls: {})", describe(&rides), data.backend().calls.load(Ordering::Relaxed));

    control.advance(Duration::from_secs(140));
    let rides = data.ride_listings(&filters).await?;
    println!("t=200s   stale:   {} (refresh running in background)", describe(&rides));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let rides = data.ride_listings(&filters).await?;
    println!("t=200s   fresh:   {} (backend calls: {})", describe(&rides), data.backend().calls.load(Ordering::Relaxed));

    control.advance(Duration::from_secs(4_000));
    let rides = data.ride_listings(&filters).await?;
    println!("t=4200s  expired, fetched: {} (backend calls: {})", describe(&rides), data.backend().calls.load(Ordering::Relaxed));

    data.invalidation().invalidate_all().await;
    println!("cleared: {} entries in memory", data.store().len());

    match data.ride("r1").await {
        Ok(ride) => println!("ride: {ride:?}"),
        Err(e) => println!("ride lookup failed with nothing cached: {e}"),
    }

    Ok(())
}
