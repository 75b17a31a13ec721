//! Error types returned by world and dispatch operations.
//!
//! Every operation validates before it mutates, so an `Err` always means the
//! world was left untouched.

use thiserror::Error;

use crate::ecs::{DriverId, RiderId};
use crate::spatial::{GridBounds, Location};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("driver {0} is already registered")]
    DriverIdConflict(DriverId),

    #[error("rider {0} is already registered")]
    RiderIdConflict(RiderId),

    #[error("location {location} is outside the grid [0, {max})", max = .bounds.max())]
    OutOfBounds { location: Location, bounds: GridBounds },

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error("rider {0} not found")]
    RiderNotFound(RiderId),

    #[error("no ride request found for rider {0}")]
    RideRequestNotFound(RiderId),

    #[error("driver {0} is reserved by a ride and cannot be changed")]
    DriverBusy(DriverId),

    #[error("rider {0} already has a ride in progress")]
    RiderAlreadyRequesting(RiderId),

    #[error("rider {0} has an active ride request")]
    RiderHasActiveRequest(RiderId),

    #[error("driver {driver_id} does not hold the pending offer for rider {rider_id}")]
    StaleOffer { rider_id: RiderId, driver_id: DriverId },
}

impl DispatchError {
    /// Collapses the id-specific variants into the coarse error kinds callers report.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DriverIdConflict(_) | Self::RiderIdConflict(_) => ErrorKind::IdConflict,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::DriverNotFound(_) | Self::RiderNotFound(_) | Self::RideRequestNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::DriverBusy(_) => ErrorKind::DriverBusy,
            Self::RiderAlreadyRequesting(_) => ErrorKind::RiderAlreadyRequesting,
            Self::RiderHasActiveRequest(_) => ErrorKind::RiderHasActiveRequest,
            Self::StaleOffer { .. } => ErrorKind::StaleOffer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IdConflict,
    NotFound,
    OutOfBounds,
    DriverBusy,
    RiderAlreadyRequesting,
    RiderHasActiveRequest,
    StaleOffer,
}

/// A broken world invariant, reported by [`crate::world::WorldState::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("driver {driver_id} is {status:?} but is referenced by {holders} matching request(s)")]
    DriverStatusMismatch {
        driver_id: DriverId,
        status: crate::ecs::DriverStatus,
        holders: usize,
    },

    #[error("request for rider {0} references unknown driver {1}")]
    UnknownDriver(RiderId, DriverId),

    #[error("request for rider {0} lists its assigned driver as rejected")]
    AssignedDriverRejected(RiderId),

    #[error("{0} is outside the grid")]
    OutOfBounds(String),

    #[error("request keyed {key} belongs to rider {rider_id}")]
    MismatchedKey { key: RiderId, rider_id: RiderId },
}
