#![allow(dead_code)]

use dispatch_core::{
    DispatchResult, DispatchSimulation, DriverStatus, Location, RidePhase, RideStatus,
};

pub fn driver_status(sim: &DispatchSimulation, id: &str) -> DriverStatus {
    sim.snapshot().driver(id).expect("driver exists").status
}

pub fn driver_location(sim: &DispatchSimulation, id: &str) -> Location {
    sim.snapshot().driver(id).expect("driver exists").location
}

pub fn ride_status(sim: &DispatchSimulation, rider: &str) -> RideStatus {
    sim.snapshot()
        .ride_request(rider)
        .expect("ride request exists")
        .status
}

pub fn ride_phase(sim: &DispatchSimulation, rider: &str) -> Option<RidePhase> {
    sim.snapshot()
        .ride_request(rider)
        .expect("ride request exists")
        .current_phase
}

/// Id of the driver named by an offer or assignment result.
pub fn offered_driver(result: &DispatchResult) -> &str {
    result
        .driver_id()
        .map(|id| id.as_str())
        .expect("result should name a driver")
}

/// Requests a ride and accepts the first offer.
pub fn request_and_accept(sim: &mut DispatchSimulation, rider: &str, dropoff: Location) -> String {
    let offer = sim.request_ride(rider, dropoff).expect("request ride");
    let driver = offered_driver(&offer).to_owned();
    sim.respond_to_offer(rider, driver.as_str(), true)
        .expect("accept offer");
    driver
}
