pub mod algorithm;
pub mod nearest;
pub mod types;

use bevy_ecs::prelude::Resource;

pub use algorithm::CandidateRanking;
pub use nearest::NearestRanking;
pub use types::{Candidate, RankingMetric};

/// Resource wrapper for the candidate ranking trait object.
#[derive(Resource)]
pub struct CandidateRankingResource(pub Box<dyn CandidateRanking>);

impl CandidateRankingResource {
    pub fn new(ranking: Box<dyn CandidateRanking>) -> Self {
        Self(ranking)
    }

    pub fn for_metric(metric: RankingMetric) -> Self {
        Self::new(Box::new(NearestRanking::new(metric)))
    }
}

impl Default for CandidateRankingResource {
    fn default() -> Self {
        Self::for_metric(RankingMetric::default())
    }
}

impl std::ops::Deref for CandidateRankingResource {
    type Target = dyn CandidateRanking;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
