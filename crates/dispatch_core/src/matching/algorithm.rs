use crate::ecs::Driver;
use crate::spatial::Location;

use super::types::Candidate;

/// Orders eligible drivers for a pickup location.
///
/// Implementations decide the distance measure only. Eligibility (status
/// `available`, not previously rejected) is filtered by the caller, and ties
/// must always fall back to ascending driver id so dispatch stays
/// deterministic.
pub trait CandidateRanking: Send + Sync {
    /// Ranks `drivers` nearest-first for a pickup at `pickup`.
    fn rank<'a>(
        &self,
        pickup: Location,
        drivers: &mut dyn Iterator<Item = &'a Driver>,
    ) -> Vec<Candidate>;

    /// The best candidate, if any.
    ///
    /// The default ranks everything and takes the head; implementations may
    /// override with a single pass.
    fn best<'a>(
        &self,
        pickup: Location,
        drivers: &mut dyn Iterator<Item = &'a Driver>,
    ) -> Option<Candidate> {
        self.rank(pickup, drivers).into_iter().next()
    }

    fn name(&self) -> &'static str;
}

