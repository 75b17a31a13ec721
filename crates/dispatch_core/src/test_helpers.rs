//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across test files.

use bevy_ecs::prelude::World;

use crate::matching::RankingMetric;
use crate::runner::{initialize_world, DispatchSimulation};
use crate::spatial::{GridBounds, Location};

/// Pickup used by the canonical two-driver scenario.
pub const TEST_PICKUP: Location = Location::new(0, 1);

/// Dropoff used by the canonical two-driver scenario.
pub const TEST_DROPOFF: Location = Location::new(9, 9);

/// Builds a simulation on the default grid with the given placements.
///
/// # Panics
///
/// Panics if any placement is rejected (duplicate id or out of bounds).
pub fn simulation_with(
    drivers: &[(&str, i32, i32)],
    riders: &[(&str, i32, i32)],
) -> DispatchSimulation {
    let mut sim = DispatchSimulation::default();
    for (id, x, y) in drivers {
        sim.register_driver(*id, Location::new(*x, *y))
            .expect("test driver placement should be valid");
    }
    for (id, x, y) in riders {
        sim.register_rider(*id, Location::new(*x, *y))
            .expect("test rider placement should be valid");
    }
    sim
}

/// D1 at (0,0), D2 at (1,1), rider R at [`TEST_PICKUP`]. Both drivers are one cell away.
pub fn two_driver_simulation() -> DispatchSimulation {
    simulation_with(&[("D1", 0, 0), ("D2", 1, 1)], &[("R", TEST_PICKUP.x, TEST_PICKUP.y)])
}

/// Create a basic test world with the default grid and ranking.
///
/// For tests that drive systems directly instead of through [`DispatchSimulation`].
pub fn create_test_world() -> World {
    let mut world = World::new();
    initialize_world(&mut world, GridBounds::default(), RankingMetric::default());
    world
}

/// Asserts every world invariant holds.
///
/// # Panics
///
/// Panics with the first violation found.
pub fn assert_consistent(sim: &DispatchSimulation) {
    if let Err(violation) = sim.state().check_invariants() {
        panic!("world invariant violated: {violation}");
    }
}
