//! Ride dispatch on a discrete grid.
//!
//! Drivers and riders occupy grid cells. A ride request is offered to the
//! nearest available driver, who accepts or rejects; rejections move the offer
//! down the ranked candidate list until someone accepts or nobody is left.
//! Explicit ticks then move each assigned driver one cell at a time to pickup
//! and on to dropoff.
//!
//! | Module              | Contents                                            |
//! |---------------------|-----------------------------------------------------|
//! | [`spatial`]         | `Location`, `GridBounds`, distances, stepping       |
//! | [`ecs`]             | `Driver`, `Rider`, `RideRequest` and their statuses |
//! | [`world`]           | `WorldState`, registration, invariant audit         |
//! | [`matching`]        | candidate ranking                                   |
//! | [`dispatch`]        | offer/accept/reject protocol                        |
//! | [`systems`]         | tick processing                                     |
//! | [`runner`]          | `DispatchSimulation`, `SharedSimulation`            |
//! | [`scenario`]        | JSON scenarios and seeded random scenarios          |
//! | [`telemetry`]       | counters, completed rides, snapshots                |
//! | [`telemetry_export`]| CSV export                                          |

pub mod clock;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod logging;
pub mod matching;
pub mod runner;
pub mod scenario;
pub mod spatial;
pub mod systems;
pub mod telemetry;
pub mod telemetry_export;
pub mod world;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use dispatch::{DispatchOutcome, DispatchResult};
pub use ecs::{Driver, DriverId, DriverStatus, RidePhase, RideRequest, RideStatus, Rider, RiderId};
pub use error::{DispatchError, ErrorKind};
pub use runner::{DispatchSimulation, SharedSimulation};
pub use spatial::{GridBounds, Location, GRID_MAX};
pub use systems::movement::TickSummary;
pub use telemetry::WorldSnapshot;
