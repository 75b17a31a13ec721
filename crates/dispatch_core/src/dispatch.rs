//! Dispatch engine: candidate selection and the offer/accept/reject protocol.
//!
//! A request moves `pending → offered` when the nearest eligible driver is
//! reserved, then `offered → assigned` on acceptance. A rejection releases the
//! driver, records it in the request's rejected set, and offers the next
//! candidate. When nobody is left the request ends `failed`.
//!
//! Offers never expire on their own. A caller that never answers an offer
//! leaves both the request and the driver reserved.

use log::{debug, info};
use serde::Serialize;

use crate::ecs::{DriverId, DriverStatus, RidePhase, RideRequest, RideStatus, RiderId};
use crate::error::DispatchError;
use crate::matching::{Candidate, CandidateRanking};
use crate::spatial::Location;
use crate::telemetry::DispatchTelemetry;
use crate::world::WorldState;

/// Outcome of a dispatch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchResult {
    /// A driver is reserved and must accept or reject.
    Offered {
        rider_id: RiderId,
        driver_id: DriverId,
        distance: f64,
    },
    /// The offered driver accepted; the ride is now driven by ticks.
    Assigned { rider_id: RiderId, driver_id: DriverId },
    /// Terminal: nobody is left to offer. The request is `failed`.
    NoDriverAvailable { rider_id: RiderId },
}

impl DispatchResult {
    pub fn rider_id(&self) -> &RiderId {
        match self {
            Self::Offered { rider_id, .. }
            | Self::Assigned { rider_id, .. }
            | Self::NoDriverAvailable { rider_id } => rider_id,
        }
    }

    /// The driver holding the offer or assignment, if any.
    pub fn driver_id(&self) -> Option<&DriverId> {
        match self {
            Self::Offered { driver_id, .. } | Self::Assigned { driver_id, .. } => Some(driver_id),
            Self::NoDriverAvailable { .. } => None,
        }
    }
}

pub type DispatchOutcome = Result<DispatchResult, DispatchError>;

/// Borrowed view over everything a dispatch operation touches.
pub struct DispatchEngine<'a> {
    pub state: &'a mut WorldState,
    pub ranking: &'a dyn CandidateRanking,
    pub telemetry: &'a mut DispatchTelemetry,
    /// Current tick, stamped on request timing.
    pub now: u64,
}

impl<'a> DispatchEngine<'a> {
    pub fn new(
        state: &'a mut WorldState,
        ranking: &'a dyn CandidateRanking,
        telemetry: &'a mut DispatchTelemetry,
        now: u64,
    ) -> Self {
        Self {
            state,
            ranking,
            telemetry,
            now,
        }
    }

    /// Creates a request for `rider_id` and offers it to the nearest available driver.
    pub fn request_ride(&mut self, rider_id: &RiderId, dropoff: Location) -> DispatchOutcome {
        let pickup = self
            .state
            .rider(rider_id)
            .map(|rider| rider.pickup_location)
            .ok_or_else(|| DispatchError::RiderNotFound(rider_id.clone()))?;
        if self.state.active_request(rider_id).is_some() {
            return Err(DispatchError::RiderAlreadyRequesting(rider_id.clone()));
        }
        self.state.ensure_in_bounds(dropoff)?;

        debug!("rider {rider_id} requested a ride from {pickup} to {dropoff}");
        self.state
            .insert_ride_request(RideRequest::new(rider_id.clone(), pickup, dropoff, self.now));
        self.offer_next(rider_id)
    }

    /// Applies a driver's answer to the pending offer for `rider_id`.
    pub fn respond_to_offer(
        &mut self,
        rider_id: &RiderId,
        driver_id: &DriverId,
        accepted: bool,
    ) -> DispatchOutcome {
        let request = self
            .state
            .ride_request(rider_id)
            .ok_or_else(|| DispatchError::RideRequestNotFound(rider_id.clone()))?;
        if request.status != RideStatus::Offered || request.assigned_driver.as_ref() != Some(driver_id)
        {
            return Err(DispatchError::StaleOffer {
                rider_id: rider_id.clone(),
                driver_id: driver_id.clone(),
            });
        }

        if accepted {
            self.accept(rider_id, driver_id)
        } else {
            self.reject(rider_id, driver_id)
        }
    }

    /// Ranked candidates the request would be offered to next, nearest first.
    ///
    /// Empty for unknown or terminal requests.
    pub fn candidates(&self, rider_id: &RiderId) -> Vec<Candidate> {
        let Some(request) = self.state.active_request(rider_id) else {
            return Vec::new();
        };
        self.ranking.rank(
            request.pickup_location,
            &mut self
                .state
                .drivers()
                .filter(|driver| driver.is_available())
                .filter(|driver| !request.rejected_drivers.contains(&driver.id)),
        )
    }

    fn accept(&mut self, rider_id: &RiderId, driver_id: &DriverId) -> DispatchOutcome {
        let now = self.now;
        if let Some(driver) = self.state.driver_mut(driver_id) {
            driver.status = DriverStatus::Busy;
        }
        if let Some(request) = self.state.ride_request_mut(rider_id) {
            request.status = RideStatus::Assigned;
            request.current_phase = Some(RidePhase::ToPickup);
            request.timing.assigned_at = Some(now);
        }
        self.telemetry.rides_assigned += 1;
        info!("driver {driver_id} accepted the ride for rider {rider_id}");
        Ok(DispatchResult::Assigned {
            rider_id: rider_id.clone(),
            driver_id: driver_id.clone(),
        })
    }

    fn reject(&mut self, rider_id: &RiderId, driver_id: &DriverId) -> DispatchOutcome {
        if let Some(driver) = self.state.driver_mut(driver_id) {
            driver.status = DriverStatus::Available;
        }
        if let Some(request) = self.state.ride_request_mut(rider_id) {
            request.rejected_drivers.insert(driver_id.clone());
            request.assigned_driver = None;
            request.status = RideStatus::Pending;
        }
        self.telemetry.offers_rejected += 1;
        debug!("driver {driver_id} rejected the ride for rider {rider_id}");
        self.offer_next(rider_id)
    }

    /// Reserves the best remaining candidate, or fails the request when none is left.
    fn offer_next(&mut self, rider_id: &RiderId) -> DispatchOutcome {
        let candidate = {
            let request = self
                .state
                .ride_request(rider_id)
                .ok_or_else(|| DispatchError::RideRequestNotFound(rider_id.clone()))?;
            self.ranking.best(
                request.pickup_location,
                &mut self
                    .state
                    .drivers()
                    .filter(|driver| driver.is_available())
                    .filter(|driver| !request.rejected_drivers.contains(&driver.id)),
            )
        };

        let Some(candidate) = candidate else {
            if let Some(request) = self.state.ride_request_mut(rider_id) {
                request.status = RideStatus::Failed;
                request.assigned_driver = None;
                request.current_phase = None;
            }
            self.telemetry.requests_failed += 1;
            info!("no driver available for rider {rider_id}; request failed");
            return Ok(DispatchResult::NoDriverAvailable {
                rider_id: rider_id.clone(),
            });
        };

        if let Some(driver) = self.state.driver_mut(&candidate.driver_id) {
            driver.status = DriverStatus::Offered;
        }
        if let Some(request) = self.state.ride_request_mut(rider_id) {
            request.status = RideStatus::Offered;
            request.assigned_driver = Some(candidate.driver_id.clone());
        }
        self.telemetry.offers_made += 1;
        debug!(
            "offered ride for rider {rider_id} to driver {} at distance {:.2}",
            candidate.driver_id, candidate.distance
        );
        Ok(DispatchResult::Offered {
            rider_id: rider_id.clone(),
            driver_id: candidate.driver_id,
            distance: candidate.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{NearestRanking, RankingMetric};
    use crate::spatial::GridBounds;

    struct Fixture {
        state: WorldState,
        ranking: NearestRanking,
        telemetry: DispatchTelemetry,
    }

    impl Fixture {
        fn new(drivers: &[(&str, i32, i32)], riders: &[(&str, i32, i32)]) -> Self {
            let mut state = WorldState::new(GridBounds::default());
            for (id, x, y) in drivers {
                state
                    .register_driver(DriverId::from(*id), Location::new(*x, *y))
                    .expect("register driver");
            }
            for (id, x, y) in riders {
                state
                    .register_rider(RiderId::from(*id), Location::new(*x, *y))
                    .expect("register rider");
            }
            Self {
                state,
                ranking: NearestRanking::new(RankingMetric::Euclidean),
                telemetry: DispatchTelemetry::default(),
            }
        }

        fn engine(&mut self) -> DispatchEngine<'_> {
            DispatchEngine::new(&mut self.state, &self.ranking, &mut self.telemetry, 0)
        }

        fn driver_status(&self, id: &str) -> DriverStatus {
            self.state
                .driver(&DriverId::from(id))
                .expect("driver exists")
                .status
        }

        fn request(&self, rider: &str) -> &RideRequest {
            self.state
                .ride_request(&RiderId::from(rider))
                .expect("request exists")
        }
    }

    fn rider(id: &str) -> RiderId {
        RiderId::from(id)
    }

    fn driver(id: &str) -> DriverId {
        DriverId::from(id)
    }

    #[test]
    fn offers_nearest_driver_and_reserves_it() {
        let mut fx = Fixture::new(&[("far", 9, 9), ("near", 2, 2)], &[("r1", 1, 1)]);
        let result = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(5, 5))
            .expect("request ride");

        assert_eq!(result.driver_id(), Some(&driver("near")));
        assert_eq!(fx.driver_status("near"), DriverStatus::Offered);
        assert_eq!(fx.driver_status("far"), DriverStatus::Available);
        let request = fx.request("r1");
        assert_eq!(request.status, RideStatus::Offered);
        assert_eq!(request.assigned_driver, Some(driver("near")));
        assert_eq!(request.current_phase, None);
        assert_eq!(fx.state.check_invariants(), Ok(()));
    }

    #[test]
    fn accept_assigns_and_starts_pickup_phase() {
        let mut fx = Fixture::new(&[("d1", 0, 0)], &[("r1", 1, 1)]);
        fx.engine()
            .request_ride(&rider("r1"), Location::new(5, 5))
            .expect("request ride");
        let result = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), true)
            .expect("accept");

        assert_eq!(
            result,
            DispatchResult::Assigned {
                rider_id: rider("r1"),
                driver_id: driver("d1"),
            }
        );
        assert_eq!(fx.driver_status("d1"), DriverStatus::Busy);
        assert_eq!(fx.request("r1").current_phase, Some(RidePhase::ToPickup));
        assert_eq!(fx.request("r1").timing.assigned_at, Some(0));
        assert_eq!(fx.telemetry.rides_assigned, 1);
        assert_eq!(fx.state.check_invariants(), Ok(()));
    }

    #[test]
    fn rejection_moves_to_next_candidate_and_never_revisits() {
        let mut fx = Fixture::new(
            &[("d1", 0, 0), ("d2", 0, 2), ("d3", 0, 3)],
            &[("r1", 0, 1)],
        );
        let first = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("request ride");
        assert_eq!(first.driver_id(), Some(&driver("d1")));

        let second = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), false)
            .expect("reject d1");
        assert_eq!(second.driver_id(), Some(&driver("d2")));
        assert_eq!(fx.driver_status("d1"), DriverStatus::Available);

        let third = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d2"), false)
            .expect("reject d2");
        assert_eq!(third.driver_id(), Some(&driver("d3")));

        let request = fx.request("r1");
        assert!(request.rejected_drivers.contains(&driver("d1")));
        assert!(request.rejected_drivers.contains(&driver("d2")));
        assert_eq!(request.assigned_driver, Some(driver("d3")));
        assert_eq!(fx.state.check_invariants(), Ok(()));
    }

    #[test]
    fn exhausting_candidates_fails_and_releases_drivers() {
        let mut fx = Fixture::new(&[("d1", 0, 0), ("d2", 1, 1)], &[("r1", 0, 1)]);
        fx.engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("request ride");
        fx.engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), false)
            .expect("reject d1");
        let result = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d2"), false)
            .expect("reject d2");

        assert_eq!(result, DispatchResult::NoDriverAvailable { rider_id: rider("r1") });
        assert_eq!(fx.request("r1").status, RideStatus::Failed);
        assert_eq!(fx.request("r1").assigned_driver, None);
        assert_eq!(fx.driver_status("d1"), DriverStatus::Available);
        assert_eq!(fx.driver_status("d2"), DriverStatus::Available);
        assert_eq!(fx.telemetry.requests_failed, 1);
        assert_eq!(fx.telemetry.offers_rejected, 2);
        assert_eq!(fx.state.check_invariants(), Ok(()));
    }

    #[test]
    fn no_available_driver_fails_immediately() {
        let mut fx = Fixture::new(&[], &[("r1", 0, 1)]);
        let result = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(3, 3))
            .expect("request ride");
        assert_eq!(result, DispatchResult::NoDriverAvailable { rider_id: rider("r1") });
        assert_eq!(fx.request("r1").status, RideStatus::Failed);
    }

    #[test]
    fn failed_request_can_be_retried_with_fresh_rejected_set() {
        let mut fx = Fixture::new(&[("d1", 0, 0)], &[("r1", 0, 1)]);
        fx.engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("request ride");
        fx.engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), false)
            .expect("reject d1");
        assert_eq!(fx.request("r1").status, RideStatus::Failed);

        let retry = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("retry");
        assert_eq!(retry.driver_id(), Some(&driver("d1")));
        assert!(fx.request("r1").rejected_drivers.is_empty());
        assert_eq!(fx.state.ride_history().len(), 1);
        assert_eq!(fx.state.ride_history()[0].status, RideStatus::Failed);
    }

    #[test]
    fn precondition_failures_leave_world_untouched() {
        let mut fx = Fixture::new(&[("d1", 0, 0)], &[("r1", 0, 1)]);

        let err = fx
            .engine()
            .request_ride(&rider("ghost"), Location::new(3, 3))
            .expect_err("unknown rider");
        assert_eq!(err, DispatchError::RiderNotFound(rider("ghost")));

        let err = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(3, 300))
            .expect_err("dropoff out of bounds");
        assert!(matches!(err, DispatchError::OutOfBounds { .. }));
        assert!(fx.state.ride_request(&rider("r1")).is_none());
        assert_eq!(fx.driver_status("d1"), DriverStatus::Available);

        fx.engine()
            .request_ride(&rider("r1"), Location::new(3, 3))
            .expect("request ride");
        let err = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(4, 4))
            .expect_err("already requesting");
        assert_eq!(err, DispatchError::RiderAlreadyRequesting(rider("r1")));
        assert_eq!(fx.request("r1").dropoff_location, Location::new(3, 3));
    }

    #[test]
    fn mismatched_response_is_stale() {
        let mut fx = Fixture::new(&[("d1", 0, 0), ("d2", 5, 5)], &[("r1", 0, 1)]);
        fx.engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("request ride");

        let err = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d2"), true)
            .expect_err("d2 holds no offer");
        assert_eq!(err.kind(), crate::error::ErrorKind::StaleOffer);
        assert_eq!(fx.driver_status("d2"), DriverStatus::Available);

        fx.engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), true)
            .expect("accept");
        let err = fx
            .engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), false)
            .expect_err("offer already resolved");
        assert_eq!(err.kind(), crate::error::ErrorKind::StaleOffer);
        assert_eq!(fx.driver_status("d1"), DriverStatus::Busy);

        let err = fx
            .engine()
            .respond_to_offer(&rider("nobody"), &driver("d1"), true)
            .expect_err("no request");
        assert_eq!(err, DispatchError::RideRequestNotFound(rider("nobody")));
    }

    #[test]
    fn offered_driver_is_not_offered_to_a_second_rider() {
        let mut fx = Fixture::new(&[("d1", 0, 0), ("d2", 8, 8)], &[("r1", 0, 1), ("r2", 1, 0)]);
        let first = fx
            .engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("r1 request");
        let second = fx
            .engine()
            .request_ride(&rider("r2"), Location::new(9, 9))
            .expect("r2 request");
        assert_eq!(first.driver_id(), Some(&driver("d1")));
        assert_eq!(second.driver_id(), Some(&driver("d2")));
        assert_eq!(fx.state.check_invariants(), Ok(()));
    }

    #[test]
    fn candidates_exclude_rejected_and_reserved_drivers() {
        let mut fx = Fixture::new(
            &[("d1", 0, 0), ("d2", 0, 2), ("d3", 0, 5)],
            &[("r1", 0, 1)],
        );
        fx.engine()
            .request_ride(&rider("r1"), Location::new(9, 9))
            .expect("request ride");
        fx.engine()
            .respond_to_offer(&rider("r1"), &driver("d1"), false)
            .expect("reject d1");

        let candidates = fx.engine().candidates(&rider("r1"));
        let ids: Vec<&str> = candidates.iter().map(|c| c.driver_id.as_str()).collect();
        assert_eq!(ids, vec!["d3"]);
    }
}
