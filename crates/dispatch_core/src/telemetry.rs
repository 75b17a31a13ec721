//! Telemetry / KPIs: dispatch counters, completed rides, and world snapshots.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::ecs::{Driver, DriverId, DriverStatus, RideRequest, RideStatus, Rider, RiderId};
use crate::world::WorldState;

/// One completed ride, recorded when the driver reaches dropoff.
/// Timestamps are tick numbers; use the helper methods for derived KPIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedRideRecord {
    pub rider_id: RiderId,
    pub driver_id: DriverId,
    pub requested_at: u64,
    pub assigned_at: u64,
    pub picked_up_at: u64,
    pub completed_at: u64,
}

impl CompletedRideRecord {
    /// Ticks from request to driver acceptance.
    pub fn time_to_assign(&self) -> u64 {
        self.assigned_at.saturating_sub(self.requested_at)
    }

    /// Ticks from acceptance to pickup.
    pub fn time_to_pickup(&self) -> u64 {
        self.picked_up_at.saturating_sub(self.assigned_at)
    }

    /// Ticks from pickup to dropoff.
    pub fn ride_duration(&self) -> u64 {
        self.completed_at.saturating_sub(self.picked_up_at)
    }
}

/// Collects dispatch telemetry. Insert as a resource to record outcomes.
#[derive(Debug, Default, Clone, Resource)]
pub struct DispatchTelemetry {
    pub offers_made: u64,
    pub offers_rejected: u64,
    pub rides_assigned: u64,
    pub requests_failed: u64,
    pub completed_rides: Vec<CompletedRideRecord>,
}

impl DispatchTelemetry {
    pub fn rides_completed(&self) -> usize {
        self.completed_rides.len()
    }
}

/// Aggregated status counts at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotCounts {
    pub drivers_available: usize,
    pub drivers_offered: usize,
    pub drivers_busy: usize,
    pub requests_pending: usize,
    pub requests_offered: usize,
    pub requests_assigned: usize,
    pub requests_failed: usize,
    pub requests_completed: usize,
}

impl SnapshotCounts {
    pub fn add_driver(&mut self, status: DriverStatus) {
        match status {
            DriverStatus::Available => self.drivers_available += 1,
            DriverStatus::Offered => self.drivers_offered += 1,
            DriverStatus::Busy => self.drivers_busy += 1,
        }
    }

    pub fn add_request(&mut self, status: RideStatus) {
        match status {
            RideStatus::Pending => self.requests_pending += 1,
            RideStatus::Offered => self.requests_offered += 1,
            RideStatus::Assigned => self.requests_assigned += 1,
            RideStatus::Failed => self.requests_failed += 1,
            RideStatus::Completed => self.requests_completed += 1,
        }
    }
}

/// Read-only view of the world for rendering and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldSnapshot {
    pub tick_count: u64,
    pub counts: SnapshotCounts,
    pub drivers: Vec<Driver>,
    pub riders: Vec<Rider>,
    pub ride_requests: Vec<RideRequest>,
    pub ride_history: Vec<RideRequest>,
}

impl WorldSnapshot {
    /// Captures the world in id order.
    pub fn capture(state: &WorldState, tick_count: u64) -> Self {
        let mut counts = SnapshotCounts::default();
        for driver in state.drivers() {
            counts.add_driver(driver.status);
        }
        for request in state.ride_requests() {
            counts.add_request(request.status);
        }
        Self {
            tick_count,
            counts,
            drivers: state.drivers().cloned().collect(),
            riders: state.riders().cloned().collect(),
            ride_requests: state.ride_requests().cloned().collect(),
            ride_history: state.ride_history().to_vec(),
        }
    }

    pub fn driver(&self, id: &str) -> Option<&Driver> {
        self.drivers.iter().find(|driver| driver.id.as_str() == id)
    }

    pub fn ride_request(&self, rider_id: &str) -> Option<&RideRequest> {
        self.ride_requests
            .iter()
            .find(|request| request.rider_id.as_str() == rider_id)
    }
}
