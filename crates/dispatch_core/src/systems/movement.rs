//! Movement system: advances every assigned ride by one grid step per tick.
//!
//! Requests are visited in ascending id order. A driver standing on its
//! target spends the tick on the phase transition instead of moving: pickup
//! flips the ride to `to_dropoff`, dropoff completes it and frees the driver.

use bevy_ecs::prelude::{ResMut, Resource};
use log::{debug, info};
use serde::Serialize;

use crate::clock::TickClock;
use crate::ecs::{DriverId, DriverStatus, RidePhase, RideRequestId, RideStatus, RiderId};
use crate::spatial::Location;
use crate::telemetry::{CompletedRideRecord, DispatchTelemetry};
use crate::world::WorldState;

/// One driver movement during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverMove {
    pub driver_id: DriverId,
    pub rider_id: RiderId,
    pub from: Location,
    pub to: Location,
}

/// What a single tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub moves: Vec<DriverMove>,
    /// Riders whose driver reached pickup this tick.
    pub picked_up: Vec<RiderId>,
    /// Riders whose ride completed this tick.
    pub completed: Vec<RiderId>,
    /// Rides still assigned after the tick.
    pub active_rides: usize,
}

/// Summary of the most recent tick, written by [`movement_system`].
#[derive(Debug, Clone, Default, Resource)]
pub struct LastTickSummary(pub TickSummary);

enum StepOutcome {
    Moved(DriverMove),
    PickedUp,
    Completed(CompletedRideRecord),
}

/// Advances all assigned rides for tick number `tick`.
pub fn advance_rides(
    state: &mut WorldState,
    telemetry: &mut DispatchTelemetry,
    tick: u64,
) -> TickSummary {
    let mut summary = TickSummary {
        tick,
        ..TickSummary::default()
    };

    for request_id in state.assigned_request_ids() {
        match step_ride(state, &request_id, tick) {
            Some(StepOutcome::Moved(movement)) => summary.moves.push(movement),
            Some(StepOutcome::PickedUp) => summary.picked_up.push(request_id),
            Some(StepOutcome::Completed(record)) => {
                summary.completed.push(record.rider_id.clone());
                telemetry.completed_rides.push(record);
            }
            None => {}
        }
    }

    summary.active_rides = state
        .ride_requests()
        .filter(|request| request.status == RideStatus::Assigned)
        .count();
    debug!(
        "tick {tick}: {} moved, {} picked up, {} completed, {} active",
        summary.moves.len(),
        summary.picked_up.len(),
        summary.completed.len(),
        summary.active_rides
    );
    summary
}

fn step_ride(state: &mut WorldState, request_id: &RideRequestId, tick: u64) -> Option<StepOutcome> {
    let (driver_id, phase, target) = {
        let request = state.ride_request(request_id)?;
        let driver_id = request.assigned_driver.clone()?;
        (driver_id, request.current_phase?, request.target()?)
    };
    let driver_location = state.driver(&driver_id)?.location;

    if driver_location != target {
        let next = driver_location.step_toward(target);
        state.driver_mut(&driver_id)?.location = next;
        return Some(StepOutcome::Moved(DriverMove {
            driver_id,
            rider_id: request_id.clone(),
            from: driver_location,
            to: next,
        }));
    }

    match phase {
        RidePhase::ToPickup => {
            let request = state.ride_request_mut(request_id)?;
            request.current_phase = Some(RidePhase::ToDropoff);
            request.timing.picked_up_at = Some(tick);
            debug!("driver {driver_id} picked up rider {request_id} at {target}");
            Some(StepOutcome::PickedUp)
        }
        RidePhase::ToDropoff => {
            let request = state.ride_request_mut(request_id)?;
            request.status = RideStatus::Completed;
            request.current_phase = None;
            request.timing.completed_at = Some(tick);
            let timing = request.timing;
            let rider_id = request.rider_id.clone();

            if let Some(driver) = state.driver_mut(&driver_id) {
                driver.status = DriverStatus::Available;
            }
            if let Some(rider) = state.rider_mut(&rider_id) {
                rider.pickup_location = target;
            }
            info!("driver {driver_id} completed the ride for rider {rider_id} at {target}");

            Some(StepOutcome::Completed(CompletedRideRecord {
                rider_id,
                driver_id,
                requested_at: timing.requested_at,
                assigned_at: timing.assigned_at.unwrap_or(timing.requested_at),
                picked_up_at: timing.picked_up_at.unwrap_or(tick),
                completed_at: tick,
            }))
        }
    }
}

/// Runs one tick: advances the clock, then every assigned ride.
pub fn movement_system(
    mut clock: ResMut<TickClock>,
    mut state: ResMut<WorldState>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut last: ResMut<LastTickSummary>,
) {
    let tick = clock.advance();
    last.0 = advance_rides(&mut state, &mut telemetry, tick);
}
