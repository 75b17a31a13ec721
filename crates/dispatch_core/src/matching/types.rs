use serde::{Deserialize, Serialize};

use crate::ecs::DriverId;

/// Distance measure used to rank drivers against a pickup location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Grid-step distance (4-neighbour moves).
    Manhattan,
}

/// A driver eligible for an offer, with its distance to the pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub driver_id: DriverId,
    pub distance: f64,
}
