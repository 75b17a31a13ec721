//! Authoritative in-memory state: drivers, riders, and ride requests.
//!
//! All maps are `BTreeMap`s so iteration (candidate ranking, tick processing,
//! snapshots) is ordered by id and therefore reproducible.

use std::collections::BTreeMap;

use bevy_ecs::prelude::Resource;
use log::debug;

use crate::ecs::{
    Driver, DriverId, DriverStatus, RideRequest, RideRequestId, RideStatus, Rider, RiderId,
};
use crate::error::{DispatchError, InvariantViolation};
use crate::spatial::{GridBounds, Location};

#[derive(Debug, Clone, Default, Resource)]
pub struct WorldState {
    bounds: GridBounds,
    drivers: BTreeMap<DriverId, Driver>,
    riders: BTreeMap<RiderId, Rider>,
    ride_requests: BTreeMap<RideRequestId, RideRequest>,
    /// Terminal requests displaced when their rider requested again. Append-only.
    ride_history: Vec<RideRequest>,
}

impl WorldState {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn ensure_in_bounds(&self, location: Location) -> Result<(), DispatchError> {
        if self.bounds.contains(location) {
            Ok(())
        } else {
            Err(DispatchError::OutOfBounds {
                location,
                bounds: self.bounds,
            })
        }
    }

    pub fn register_driver(
        &mut self,
        id: DriverId,
        location: Location,
    ) -> Result<(), DispatchError> {
        if self.drivers.contains_key(&id) {
            return Err(DispatchError::DriverIdConflict(id));
        }
        self.ensure_in_bounds(location)?;
        debug!("registered driver {id} at {location}");
        self.drivers.insert(id.clone(), Driver::new(id, location));
        Ok(())
    }

    /// Removes an available driver. Offered or busy drivers belong to a ride.
    pub fn remove_driver(&mut self, id: &DriverId) -> Result<Driver, DispatchError> {
        let driver = self
            .drivers
            .get(id)
            .ok_or_else(|| DispatchError::DriverNotFound(id.clone()))?;
        if !driver.is_available() {
            return Err(DispatchError::DriverBusy(id.clone()));
        }
        debug!("removed driver {id}");
        self.drivers
            .remove(id)
            .ok_or_else(|| DispatchError::DriverNotFound(id.clone()))
    }

    /// Moves an available driver to another cell.
    pub fn relocate_driver(
        &mut self,
        id: &DriverId,
        location: Location,
    ) -> Result<(), DispatchError> {
        let bounds = self.bounds;
        let driver = self
            .drivers
            .get_mut(id)
            .ok_or_else(|| DispatchError::DriverNotFound(id.clone()))?;
        if !bounds.contains(location) {
            return Err(DispatchError::OutOfBounds { location, bounds });
        }
        if !driver.is_available() {
            return Err(DispatchError::DriverBusy(id.clone()));
        }
        debug!("relocated driver {id} from {} to {location}", driver.location);
        driver.location = location;
        Ok(())
    }

    pub fn register_rider(&mut self, id: RiderId, location: Location) -> Result<(), DispatchError> {
        if self.riders.contains_key(&id) {
            return Err(DispatchError::RiderIdConflict(id));
        }
        self.ensure_in_bounds(location)?;
        debug!("registered rider {id} at {location}");
        self.riders.insert(id.clone(), Rider::new(id, location));
        Ok(())
    }

    /// Removes a rider whose current request (if any) is terminal.
    ///
    /// The rider's requests stay in the world as history.
    pub fn remove_rider(&mut self, id: &RiderId) -> Result<Rider, DispatchError> {
        if !self.riders.contains_key(id) {
            return Err(DispatchError::RiderNotFound(id.clone()));
        }
        if self.active_request(id).is_some() {
            return Err(DispatchError::RiderHasActiveRequest(id.clone()));
        }
        debug!("removed rider {id}");
        self.riders
            .remove(id)
            .ok_or_else(|| DispatchError::RiderNotFound(id.clone()))
    }

    pub fn driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.get(id)
    }

    pub fn rider(&self, id: &RiderId) -> Option<&Rider> {
        self.riders.get(id)
    }

    pub fn ride_request(&self, id: &RideRequestId) -> Option<&RideRequest> {
        self.ride_requests.get(id)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values()
    }

    pub fn riders(&self) -> impl Iterator<Item = &Rider> {
        self.riders.values()
    }

    pub fn ride_requests(&self) -> impl Iterator<Item = &RideRequest> {
        self.ride_requests.values()
    }

    pub fn ride_history(&self) -> &[RideRequest] {
        &self.ride_history
    }

    /// The rider's request if it has not reached a terminal state.
    pub fn active_request(&self, rider_id: &RiderId) -> Option<&RideRequest> {
        self.ride_requests
            .get(rider_id)
            .filter(|request| !request.is_terminal())
    }

    pub(crate) fn driver_mut(&mut self, id: &DriverId) -> Option<&mut Driver> {
        self.drivers.get_mut(id)
    }

    pub(crate) fn rider_mut(&mut self, id: &RiderId) -> Option<&mut Rider> {
        self.riders.get_mut(id)
    }

    pub(crate) fn ride_request_mut(&mut self, id: &RideRequestId) -> Option<&mut RideRequest> {
        self.ride_requests.get_mut(id)
    }

    /// Stores a fresh request, archiving the rider's previous terminal request.
    pub(crate) fn insert_ride_request(&mut self, request: RideRequest) {
        debug_assert!(
            self.active_request(&request.id).is_none(),
            "active request must not be replaced"
        );
        if let Some(previous) = self.ride_requests.insert(request.id.clone(), request) {
            self.ride_history.push(previous);
        }
    }

    /// Ids of requests the tick processor should advance, in id order.
    pub(crate) fn assigned_request_ids(&self) -> Vec<RideRequestId> {
        self.ride_requests
            .values()
            .filter(|request| request.status == RideStatus::Assigned)
            .map(|request| request.id.clone())
            .collect()
    }

    /// Verifies every cross-record invariant, returning the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for driver in self.drivers.values() {
            if !self.bounds.contains(driver.location) {
                return Err(InvariantViolation::OutOfBounds(format!(
                    "driver {} at {}",
                    driver.id, driver.location
                )));
            }
            let holders: Vec<RideStatus> = self
                .ride_requests
                .values()
                .filter(|request| request.assigned_driver.as_ref() == Some(&driver.id))
                .map(|request| request.status)
                .filter(|status| matches!(status, RideStatus::Offered | RideStatus::Assigned))
                .collect();
            let consistent = match driver.status {
                DriverStatus::Available => holders.is_empty(),
                DriverStatus::Offered => holders == [RideStatus::Offered],
                DriverStatus::Busy => holders == [RideStatus::Assigned],
            };
            if !consistent {
                return Err(InvariantViolation::DriverStatusMismatch {
                    driver_id: driver.id.clone(),
                    status: driver.status,
                    holders: holders.len(),
                });
            }
        }

        for rider in self.riders.values() {
            if !self.bounds.contains(rider.pickup_location) {
                return Err(InvariantViolation::OutOfBounds(format!(
                    "rider {} at {}",
                    rider.id, rider.pickup_location
                )));
            }
        }

        for (key, request) in &self.ride_requests {
            if *key != request.rider_id {
                return Err(InvariantViolation::MismatchedKey {
                    key: key.clone(),
                    rider_id: request.rider_id.clone(),
                });
            }
            if let Some(driver_id) = &request.assigned_driver {
                if request.rejected_drivers.contains(driver_id) {
                    return Err(InvariantViolation::AssignedDriverRejected(key.clone()));
                }
                let live = matches!(request.status, RideStatus::Offered | RideStatus::Assigned);
                if live && !self.drivers.contains_key(driver_id) {
                    return Err(InvariantViolation::UnknownDriver(
                        key.clone(),
                        driver_id.clone(),
                    ));
                }
            }
            if !self.bounds.contains(request.dropoff_location) {
                return Err(InvariantViolation::OutOfBounds(format!(
                    "dropoff for rider {} at {}",
                    key, request.dropoff_location
                )));
            }
        }

        Ok(())
    }
}
