use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spatial::Location;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(DriverId);
string_id!(RiderId);

/// Ride requests are keyed by the rider that issued them.
pub type RideRequestId = RiderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    /// Reserved for a pending offer; not a candidate for any other request.
    Offered,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub location: Location,
    pub status: DriverStatus,
}

impl Driver {
    pub fn new(id: DriverId, location: Location) -> Self {
        Self {
            id,
            location,
            status: DriverStatus::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    /// Where the rider is waiting. Moves to the dropoff when a ride completes.
    pub pickup_location: Location,
}

impl Rider {
    pub fn new(id: RiderId, pickup_location: Location) -> Self {
        Self { id, pickup_location }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Created, no driver selected yet.
    Pending,
    /// A driver holds a reservation and must accept or reject.
    Offered,
    /// The driver accepted; the tick processor drives the ride.
    Assigned,
    Failed,
    Completed,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Failed | RideStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RidePhase {
    ToPickup,
    ToDropoff,
}

/// Tick numbers at which a request passed each lifecycle milestone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideTiming {
    pub requested_at: u64,
    pub assigned_at: Option<u64>,
    pub picked_up_at: Option<u64>,
    pub completed_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: RideRequestId,
    pub rider_id: RiderId,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub assigned_driver: Option<DriverId>,
    pub status: RideStatus,
    /// Only meaningful while `status` is [`RideStatus::Assigned`].
    pub current_phase: Option<RidePhase>,
    pub rejected_drivers: BTreeSet<DriverId>,
    pub timing: RideTiming,
}

impl RideRequest {
    pub fn new(
        rider_id: RiderId,
        pickup_location: Location,
        dropoff_location: Location,
        requested_at: u64,
    ) -> Self {
        Self {
            id: rider_id.clone(),
            rider_id,
            pickup_location,
            dropoff_location,
            assigned_driver: None,
            status: RideStatus::Pending,
            current_phase: None,
            rejected_drivers: BTreeSet::new(),
            timing: RideTiming {
                requested_at,
                ..RideTiming::default()
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Cell the assigned driver is currently heading for.
    pub fn target(&self) -> Option<Location> {
        match (self.status, self.current_phase) {
            (RideStatus::Assigned, Some(RidePhase::ToPickup)) => Some(self.pickup_location),
            (RideStatus::Assigned, Some(RidePhase::ToDropoff)) => Some(self.dropoff_location),
            _ => None,
        }
    }
}
