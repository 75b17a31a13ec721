#![allow(dead_code)]

use dispatch_core::matching::RankingMetric;
use dispatch_core::spatial::{GridBounds, Location, GRID_MAX};
use dispatch_core::DispatchSimulation;

/// Builder configuration for reproducible test simulations.
#[derive(Clone, Debug)]
pub struct TestWorldConfig {
    pub grid_max: i32,
    pub ranking: RankingMetric,
    pub drivers: Vec<(String, Location)>,
    pub riders: Vec<(String, Location)>,
}

impl Default for TestWorldConfig {
    fn default() -> Self {
        Self {
            grid_max: GRID_MAX,
            ranking: RankingMetric::Euclidean,
            drivers: Vec::new(),
            riders: Vec::new(),
        }
    }
}

/// Helper that builds a [`DispatchSimulation`] with placements already registered.
#[derive(Debug, Default)]
pub struct TestWorldBuilder {
    config: TestWorldConfig,
}

impl TestWorldBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the exclusive grid bound.
    pub fn with_grid_max(mut self, grid_max: i32) -> Self {
        self.config.grid_max = grid_max;
        self
    }

    /// Choose the candidate ranking metric.
    pub fn with_ranking(mut self, ranking: RankingMetric) -> Self {
        self.config.ranking = ranking;
        self
    }

    /// Place an available driver.
    pub fn with_driver(mut self, id: &str, x: i32, y: i32) -> Self {
        self.config.drivers.push((id.to_owned(), Location::new(x, y)));
        self
    }

    /// Place a rider.
    pub fn with_rider(mut self, id: &str, x: i32, y: i32) -> Self {
        self.config.riders.push((id.to_owned(), Location::new(x, y)));
        self
    }

    /// Build the simulation with the configured placements.
    pub fn build(self) -> DispatchSimulation {
        let TestWorldConfig {
            grid_max,
            ranking,
            drivers,
            riders,
        } = self.config;

        let mut sim = DispatchSimulation::new(GridBounds::new(grid_max), ranking);
        for (id, location) in drivers {
            sim.register_driver(id, location).expect("driver placement");
        }
        for (id, location) in riders {
            sim.register_rider(id, location).expect("rider placement");
        }
        sim
    }
}
