use std::fs;
use std::path::Path;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::DispatchResult;
use crate::ecs::{DriverId, RideStatus, RiderId};
use crate::error::DispatchError;
use crate::runner::DispatchSimulation;
use crate::scenario::params::{ScenarioCommand, ScenarioParams};
use crate::spatial::Location;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to place {what}: {source}")]
    Placement {
        what: String,
        #[source]
        source: DispatchError,
    },
}

/// Result of one scripted command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Dispatched { result: DispatchResult },
    Ticked { ticks: usize, completed: Vec<RiderId> },
    Rejected { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub command: ScenarioCommand,
    pub outcome: StepOutcome,
}

/// A finished scenario: the simulation in its final state plus the step log.
pub struct ScenarioRun {
    pub simulation: DispatchSimulation,
    pub steps: Vec<StepRecord>,
}

impl ScenarioRun {
    pub fn rejected_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Rejected { .. }))
    }
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioParams, ScenarioError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Creates a simulation with the scenario's grid, ranking, and initial placements.
pub fn build_simulation(params: &ScenarioParams) -> Result<DispatchSimulation, ScenarioError> {
    let mut simulation = DispatchSimulation::new(params.bounds(), params.ranking);
    for driver in &params.drivers {
        simulation
            .register_driver(driver.id.as_str(), driver.location())
            .map_err(|source| ScenarioError::Placement {
                what: format!("driver {}", driver.id),
                source,
            })?;
    }
    for rider in &params.riders {
        simulation
            .register_rider(rider.id.as_str(), rider.location())
            .map_err(|source| ScenarioError::Placement {
                what: format!("rider {}", rider.id),
                source,
            })?;
    }
    info!(
        "built scenario: {} drivers, {} riders, grid {}",
        params.drivers.len(),
        params.riders.len(),
        params.grid_max
    );
    Ok(simulation)
}

/// Builds the scenario and applies every command in order.
///
/// Commands the world refuses (stale offers, busy drivers, ...) are recorded as
/// [`StepOutcome::Rejected`] and do not stop the run.
pub fn run_scenario(params: &ScenarioParams) -> Result<ScenarioRun, ScenarioError> {
    let mut simulation = build_simulation(params)?;
    let steps = params
        .commands
        .iter()
        .enumerate()
        .map(|(index, command)| {
            let outcome = apply_command(&mut simulation, command);
            debug!("step {index}: {command:?} -> {outcome:?}");
            StepRecord {
                index,
                command: command.clone(),
                outcome,
            }
        })
        .collect();
    Ok(ScenarioRun { simulation, steps })
}

pub fn apply_command(simulation: &mut DispatchSimulation, command: &ScenarioCommand) -> StepOutcome {
    let applied = |result: Result<(), DispatchError>| match result {
        Ok(()) => StepOutcome::Applied,
        Err(err) => StepOutcome::Rejected {
            error: err.to_string(),
        },
    };
    let dispatched = |result: Result<DispatchResult, DispatchError>| match result {
        Ok(result) => StepOutcome::Dispatched { result },
        Err(err) => StepOutcome::Rejected {
            error: err.to_string(),
        },
    };

    match command {
        ScenarioCommand::RegisterDriver { id, x, y } => {
            applied(simulation.register_driver(id.as_str(), Location::new(*x, *y)))
        }
        ScenarioCommand::RemoveDriver { id } => applied(simulation.remove_driver(id.as_str())),
        ScenarioCommand::RelocateDriver { id, x, y } => {
            applied(simulation.relocate_driver(id.as_str(), Location::new(*x, *y)))
        }
        ScenarioCommand::RegisterRider { id, x, y } => {
            applied(simulation.register_rider(id.as_str(), Location::new(*x, *y)))
        }
        ScenarioCommand::RemoveRider { id } => applied(simulation.remove_rider(id.as_str())),
        ScenarioCommand::RequestRide { rider_id, x, y } => {
            dispatched(simulation.request_ride(rider_id.as_str(), Location::new(*x, *y)))
        }
        ScenarioCommand::RespondToOffer {
            rider_id,
            driver_id,
            accepted,
        } => dispatched(simulation.respond_to_offer(
            rider_id.as_str(),
            driver_id.as_str(),
            *accepted,
        )),
        ScenarioCommand::AcceptOffer { rider_id } => {
            respond_to_pending(simulation, rider_id, true, dispatched)
        }
        ScenarioCommand::RejectOffer { rider_id } => {
            respond_to_pending(simulation, rider_id, false, dispatched)
        }
        ScenarioCommand::Tick { count } => {
            let summaries = simulation.run_ticks(*count);
            StepOutcome::Ticked {
                ticks: summaries.len(),
                completed: summaries.into_iter().flat_map(|s| s.completed).collect(),
            }
        }
        ScenarioCommand::RunUntilIdle { max_ticks } => {
            let before = simulation.telemetry().rides_completed();
            let ticks = simulation.run_until_idle(*max_ticks);
            let completed = simulation.telemetry().completed_rides[before..]
                .iter()
                .map(|record| record.rider_id.clone())
                .collect();
            StepOutcome::Ticked { ticks, completed }
        }
    }
}

fn respond_to_pending(
    simulation: &mut DispatchSimulation,
    rider_id: &str,
    accepted: bool,
    dispatched: impl Fn(Result<DispatchResult, DispatchError>) -> StepOutcome,
) -> StepOutcome {
    match pending_offer(simulation, rider_id) {
        Some(driver_id) => dispatched(simulation.respond_to_offer(rider_id, driver_id, accepted)),
        None => StepOutcome::Rejected {
            error: format!("rider {rider_id} has no pending offer"),
        },
    }
}

/// Driver currently holding the offer for `rider_id`.
pub fn pending_offer(simulation: &DispatchSimulation, rider_id: &str) -> Option<DriverId> {
    simulation
        .state()
        .active_request(&RiderId::from(rider_id))
        .filter(|request| request.status == RideStatus::Offered)
        .and_then(|request| request.assigned_driver.clone())
}

/// Knobs for [`random_scenario`].
#[derive(Debug, Clone, Copy)]
pub struct RandomScenarioConfig {
    pub seed: u64,
    pub num_drivers: usize,
    pub num_riders: usize,
    pub grid_max: i32,
    /// Probability that the first offer for a rider is rejected.
    pub reject_probability: f64,
    /// Upper bound on ticks run between consecutive ride requests.
    pub max_ticks_between_requests: usize,
}

impl Default for RandomScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_drivers: 20,
            num_riders: 50,
            grid_max: crate::spatial::GRID_MAX,
            reject_probability: 0.2,
            max_ticks_between_requests: 3,
        }
    }
}

impl RandomScenarioConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_counts(mut self, num_drivers: usize, num_riders: usize) -> Self {
        self.num_drivers = num_drivers;
        self.num_riders = num_riders;
        self
    }
}

/// Builds a reproducible scenario: same config, same commands.
pub fn random_scenario(config: RandomScenarioConfig) -> ScenarioParams {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let max = config.grid_max.max(1);
    let mut params = ScenarioParams::default().with_grid_max(max);

    for i in 0..config.num_drivers {
        let (x, y) = (rng.gen_range(0..max), rng.gen_range(0..max));
        params = params.with_driver(format!("d{i}"), x, y);
    }
    for i in 0..config.num_riders {
        let (x, y) = (rng.gen_range(0..max), rng.gen_range(0..max));
        params = params.with_rider(format!("r{i}"), x, y);
    }

    let reject_probability = config.reject_probability.clamp(0.0, 1.0);
    for i in 0..config.num_riders {
        let rider_id = format!("r{i}");
        params = params.with_command(ScenarioCommand::RequestRide {
            rider_id: rider_id.clone(),
            x: rng.gen_range(0..max),
            y: rng.gen_range(0..max),
        });
        if rng.gen_bool(reject_probability) {
            params = params.with_command(ScenarioCommand::RejectOffer {
                rider_id: rider_id.clone(),
            });
        }
        params = params.with_command(ScenarioCommand::AcceptOffer { rider_id });
        if config.max_ticks_between_requests > 0 {
            let count = rng.gen_range(0..=config.max_ticks_between_requests);
            if count > 0 {
                params = params.with_command(ScenarioCommand::Tick { count });
            }
        }
    }
    params.with_command(ScenarioCommand::RunUntilIdle {
        max_ticks: (max as usize) * 4 + 10,
    })
}
