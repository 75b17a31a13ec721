use serde::{Deserialize, Serialize};

use crate::matching::RankingMetric;
use crate::spatial::{GridBounds, Location, GRID_MAX};

/// A driver or rider placed before the first command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub fn new(id: impl Into<String>, x: i32, y: i32) -> Self {
        Self { id: id.into(), x, y }
    }

    pub fn location(&self) -> Location {
        Location::new(self.x, self.y)
    }
}

/// One scripted step, applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScenarioCommand {
    RegisterDriver { id: String, x: i32, y: i32 },
    RemoveDriver { id: String },
    RelocateDriver { id: String, x: i32, y: i32 },
    RegisterRider { id: String, x: i32, y: i32 },
    RemoveRider { id: String },
    RequestRide { rider_id: String, x: i32, y: i32 },
    RespondToOffer {
        rider_id: String,
        driver_id: String,
        accepted: bool,
    },
    /// Accepts whatever offer is pending for the rider.
    AcceptOffer { rider_id: String },
    /// Rejects whatever offer is pending for the rider.
    RejectOffer { rider_id: String },
    Tick {
        #[serde(default = "one")]
        count: usize,
    },
    /// Ticks until no ride is assigned, bounded by `max_ticks`.
    RunUntilIdle {
        #[serde(default = "default_max_ticks")]
        max_ticks: usize,
    },
}

fn one() -> usize {
    1
}

fn default_max_ticks() -> usize {
    10_000
}

fn default_grid_max() -> i32 {
    GRID_MAX
}

/// Scenario configuration, usually loaded from JSON.
///
/// ```json
/// {
///   "grid_max": 100,
///   "ranking": "euclidean",
///   "drivers": [{ "id": "d1", "x": 0, "y": 0 }],
///   "riders": [{ "id": "r1", "x": 0, "y": 1 }],
///   "commands": [
///     { "command": "request_ride", "rider_id": "r1", "x": 9, "y": 9 },
///     { "command": "accept_offer", "rider_id": "r1" },
///     { "command": "run_until_idle" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioParams {
    #[serde(default = "default_grid_max")]
    pub grid_max: i32,
    #[serde(default)]
    pub ranking: RankingMetric,
    #[serde(default)]
    pub drivers: Vec<Placement>,
    #[serde(default)]
    pub riders: Vec<Placement>,
    #[serde(default)]
    pub commands: Vec<ScenarioCommand>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            grid_max: GRID_MAX,
            ranking: RankingMetric::default(),
            drivers: Vec::new(),
            riders: Vec::new(),
            commands: Vec::new(),
        }
    }
}

impl ScenarioParams {
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_max)
    }

    pub fn with_grid_max(mut self, grid_max: i32) -> Self {
        self.grid_max = grid_max;
        self
    }

    pub fn with_ranking(mut self, ranking: RankingMetric) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn with_driver(mut self, id: impl Into<String>, x: i32, y: i32) -> Self {
        self.drivers.push(Placement::new(id, x, y));
        self
    }

    pub fn with_rider(mut self, id: impl Into<String>, x: i32, y: i32) -> Self {
        self.riders.push(Placement::new(id, x, y));
        self
    }

    pub fn with_command(mut self, command: ScenarioCommand) -> Self {
        self.commands.push(command);
        self
    }
}
