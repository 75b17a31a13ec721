//! Run a seeded 500 riders / 100 drivers scenario and print completed rides.
//!
//! Run with: cargo run -p dispatch_core --example scenario_run

use dispatch_core::scenario::{random_scenario, run_scenario, RandomScenarioConfig};

fn main() {
    const NUM_RIDERS: usize = 500;
    const NUM_DRIVERS: usize = 100;
    const SEED: u64 = 123;

    let params = random_scenario(
        RandomScenarioConfig::default()
            .with_seed(SEED)
            .with_counts(NUM_DRIVERS, NUM_RIDERS),
    );
    let run = match run_scenario(&params) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("scenario failed: {err}");
            std::process::exit(1);
        }
    };

    let sim = &run.simulation;
    let telemetry = sim.telemetry();
    println!(
        "--- Scenario run ({} riders, {} drivers, seed {}) ---",
        NUM_RIDERS, NUM_DRIVERS, SEED
    );
    println!("Ticks executed: {}", sim.tick_count());
    println!("Offers made: {} ({} rejected)", telemetry.offers_made, telemetry.offers_rejected);
    println!("Requests failed: {}", telemetry.requests_failed);
    println!("Completed rides: {}", telemetry.rides_completed());

    const SAMPLE: usize = 20;
    if telemetry.rides_completed() > 0 {
        println!("\nSample completed rides (first {SAMPLE}):");
        for (i, ride) in telemetry.completed_rides.iter().take(SAMPLE).enumerate() {
            println!(
                "  {}  rider={} driver={}  time_to_assign={}  time_to_pickup={}  ride_duration={}  completed_at={}",
                i + 1,
                ride.rider_id,
                ride.driver_id,
                ride.time_to_assign(),
                ride.time_to_pickup(),
                ride.ride_duration(),
                ride.completed_at
            );
        }
    }
}
