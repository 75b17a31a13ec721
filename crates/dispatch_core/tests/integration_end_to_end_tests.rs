mod support;

use dispatch_core::telemetry_export::{write_completed_rides_csv, write_driver_positions_csv};
use dispatch_core::test_helpers::assert_consistent;
use dispatch_core::{Location, RideStatus, SharedSimulation};
use support::entities::{request_and_accept, ride_status};
use support::world::TestWorldBuilder;

#[test]
fn rider_can_ride_again_after_completion() {
    let mut sim = TestWorldBuilder::new()
        .with_driver("d", 0, 0)
        .with_rider("r", 0, 0)
        .build();

    request_and_accept(&mut sim, "r", Location::new(3, 0));
    sim.run_until_idle(50);
    assert_eq!(ride_status(&sim, "r"), RideStatus::Completed);

    // Second ride starts from the previous dropoff.
    request_and_accept(&mut sim, "r", Location::new(3, 3));
    let request = sim.snapshot().ride_request("r").cloned().expect("request");
    assert_eq!(request.pickup_location, Location::new(3, 0));
    sim.run_until_idle(50);

    assert_eq!(sim.telemetry().rides_completed(), 2);
    assert_eq!(sim.state().ride_history().len(), 1);
    assert_eq!(sim.snapshot().ride_history[0].status, RideStatus::Completed);
    assert_consistent(&sim);
}

#[test]
fn telemetry_exports_every_completed_ride() {
    let mut sim = TestWorldBuilder::new()
        .with_driver("d1", 0, 0)
        .with_driver("d2", 9, 0)
        .with_rider("r1", 1, 0)
        .with_rider("r2", 8, 0)
        .build();
    request_and_accept(&mut sim, "r1", Location::new(1, 4));
    request_and_accept(&mut sim, "r2", Location::new(8, 2));
    sim.run_until_idle(50);

    let mut rides = Vec::new();
    write_completed_rides_csv(&mut rides, sim.telemetry()).expect("rides csv");
    let rides = String::from_utf8(rides).expect("utf8");
    // header plus one row per ride
    assert_eq!(rides.lines().count(), 3);
    assert!(rides.lines().any(|line| line.starts_with("r1,d1,")));
    assert!(rides.lines().any(|line| line.starts_with("r2,d2,")));

    let mut positions = Vec::new();
    write_driver_positions_csv(&mut positions, &sim.snapshot()).expect("positions csv");
    let positions = String::from_utf8(positions).expect("utf8");
    assert!(positions.contains(",d1,1,4,available"));
    assert!(positions.contains(",d2,8,2,available"));
}

#[test]
fn shared_simulation_serializes_requests_and_ticks() {
    let shared = SharedSimulation::new(
        TestWorldBuilder::new()
            .with_driver("d1", 0, 0)
            .with_driver("d2", 5, 5)
            .with_rider("r1", 0, 1)
            .with_rider("r2", 5, 6)
            .build(),
    );

    let workers: Vec<_> = ["r1", "r2"]
        .into_iter()
        .map(|rider| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let offer = shared
                    .request_ride(rider, Location::new(9, 9))
                    .expect("request");
                let driver = offer.driver_id().cloned().expect("offered driver");
                shared
                    .respond_to_offer(rider, driver, true)
                    .expect("accept");
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }

    let ticker = {
        let shared = shared.clone();
        std::thread::spawn(move || {
            for _ in 0..40 {
                shared.tick();
            }
        })
    };
    ticker.join().expect("ticker thread");

    let snapshot = shared.snapshot();
    assert_eq!(snapshot.tick_count, 40);
    assert_eq!(snapshot.counts.requests_completed, 2);
    shared.with(|sim| assert_consistent(sim));
}
