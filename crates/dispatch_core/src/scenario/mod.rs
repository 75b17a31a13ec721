//! Scenario setup: initial placements plus a scripted command list.
//!
//! Scenarios are plain JSON documents so runs can be reproduced from a file,
//! or generated from a seed with [random_scenario].

mod build;
mod params;

pub use build::{
    apply_command, build_simulation, load_scenario, pending_offer, random_scenario, run_scenario,
    RandomScenarioConfig, ScenarioError, ScenarioRun, StepOutcome, StepRecord,
};
pub use params::{Placement, ScenarioCommand, ScenarioParams};
