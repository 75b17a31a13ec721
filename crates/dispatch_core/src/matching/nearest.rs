use crate::ecs::{Driver, DriverId};
use crate::spatial::Location;

use super::algorithm::CandidateRanking;
use super::types::{Candidate, RankingMetric};

/// Nearest-first ranking with id tie-break.
///
/// Distances are compared as exact integers (squared Euclidean or Manhattan
/// steps), so two drivers at the same distance always tie and the smaller id
/// wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestRanking {
    pub metric: RankingMetric,
}

impl NearestRanking {
    pub fn new(metric: RankingMetric) -> Self {
        Self { metric }
    }

    fn sort_key(&self, pickup: Location, location: Location) -> i64 {
        match self.metric {
            RankingMetric::Euclidean => pickup.distance_squared(location),
            RankingMetric::Manhattan => pickup.manhattan_distance(location),
        }
    }

    fn distance(&self, pickup: Location, location: Location) -> f64 {
        match self.metric {
            RankingMetric::Euclidean => pickup.euclidean_distance(location),
            RankingMetric::Manhattan => pickup.manhattan_distance(location) as f64,
        }
    }

    fn to_candidate(&self, pickup: Location, driver: &Driver) -> Candidate {
        Candidate {
            driver_id: driver.id.clone(),
            distance: self.distance(pickup, driver.location),
        }
    }
}

impl CandidateRanking for NearestRanking {
    fn rank<'a>(
        &self,
        pickup: Location,
        drivers: &mut dyn Iterator<Item = &'a Driver>,
    ) -> Vec<Candidate> {
        let mut keyed: Vec<(i64, &DriverId, &Driver)> = drivers
            .map(|driver| (self.sort_key(pickup, driver.location), &driver.id, driver))
            .collect();
        keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        keyed
            .into_iter()
            .map(|(_, _, driver)| self.to_candidate(pickup, driver))
            .collect()
    }

    fn best<'a>(
        &self,
        pickup: Location,
        drivers: &mut dyn Iterator<Item = &'a Driver>,
    ) -> Option<Candidate> {
        drivers
            .min_by(|a, b| {
                (self.sort_key(pickup, a.location), &a.id)
                    .cmp(&(self.sort_key(pickup, b.location), &b.id))
            })
            .map(|driver| self.to_candidate(pickup, driver))
    }

    fn name(&self) -> &'static str {
        match self.metric {
            RankingMetric::Euclidean => "nearest-euclidean",
            RankingMetric::Manhattan => "nearest-manhattan",
        }
    }
}
