//! Simulation runner: owns the ECS world and routes commands into it.
//!
//! Registration, dispatch, and snapshots act on the [WorldState] resource
//! directly. Ticks run through the schedule built by [tick_schedule]. Every
//! mutating method takes `&mut self`, so a [DispatchSimulation] has exactly one
//! writer; [SharedSimulation] extends that to multiple threads by holding a
//! mutex for the full duration of each operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy_ecs::prelude::{Mut, Schedule, World};
use log::{debug, warn};

use crate::clock::TickClock;
use crate::dispatch::{DispatchEngine, DispatchOutcome};
use crate::ecs::{DriverId, RiderId};
use crate::error::DispatchError;
use crate::matching::{Candidate, CandidateRankingResource, RankingMetric};
use crate::spatial::{GridBounds, Location};
use crate::systems::movement::{movement_system, LastTickSummary, TickSummary};
use crate::telemetry::{DispatchTelemetry, WorldSnapshot};
use crate::world::WorldState;

/// Builds the tick schedule.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(movement_system);
    schedule
}

/// Inserts every resource the dispatch commands and tick schedule expect.
pub fn initialize_world(world: &mut World, bounds: GridBounds, metric: RankingMetric) {
    world.insert_resource(WorldState::new(bounds));
    world.insert_resource(TickClock::default());
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(LastTickSummary::default());
    world.insert_resource(CandidateRankingResource::for_metric(metric));
}

pub struct DispatchSimulation {
    world: World,
    schedule: Schedule,
}

impl Default for DispatchSimulation {
    fn default() -> Self {
        Self::new(GridBounds::default(), RankingMetric::default())
    }
}

impl DispatchSimulation {
    pub fn new(bounds: GridBounds, metric: RankingMetric) -> Self {
        let mut world = World::new();
        initialize_world(&mut world, bounds, metric);
        debug!(
            "dispatch simulation on a {max}x{max} grid, ranking {}",
            world.resource::<CandidateRankingResource>().name(),
            max = bounds.max()
        );
        Self {
            world,
            schedule: tick_schedule(),
        }
    }

    pub fn register_driver(
        &mut self,
        id: impl Into<DriverId>,
        location: Location,
    ) -> Result<(), DispatchError> {
        let result = self.state_mut().register_driver(id.into(), location);
        log_rejection("register driver", &result);
        result
    }

    pub fn remove_driver(&mut self, id: impl Into<DriverId>) -> Result<(), DispatchError> {
        let result = self.state_mut().remove_driver(&id.into()).map(drop);
        log_rejection("remove driver", &result);
        result
    }

    pub fn relocate_driver(
        &mut self,
        id: impl Into<DriverId>,
        location: Location,
    ) -> Result<(), DispatchError> {
        let result = self.state_mut().relocate_driver(&id.into(), location);
        log_rejection("relocate driver", &result);
        result
    }

    pub fn register_rider(
        &mut self,
        id: impl Into<RiderId>,
        location: Location,
    ) -> Result<(), DispatchError> {
        let result = self.state_mut().register_rider(id.into(), location);
        log_rejection("register rider", &result);
        result
    }

    pub fn remove_rider(&mut self, id: impl Into<RiderId>) -> Result<(), DispatchError> {
        let result = self.state_mut().remove_rider(&id.into()).map(drop);
        log_rejection("remove rider", &result);
        result
    }

    pub fn request_ride(&mut self, rider_id: impl Into<RiderId>, dropoff: Location) -> DispatchOutcome {
        let rider_id = rider_id.into();
        let result = self.with_engine(|engine| engine.request_ride(&rider_id, dropoff));
        log_rejection("request ride", &result);
        result
    }

    pub fn respond_to_offer(
        &mut self,
        rider_id: impl Into<RiderId>,
        driver_id: impl Into<DriverId>,
        accepted: bool,
    ) -> DispatchOutcome {
        let rider_id = rider_id.into();
        let driver_id = driver_id.into();
        let result =
            self.with_engine(|engine| engine.respond_to_offer(&rider_id, &driver_id, accepted));
        log_rejection("respond to offer", &result);
        result
    }

    /// Candidates the rider's active request would be offered to next.
    pub fn candidates(&mut self, rider_id: impl Into<RiderId>) -> Vec<Candidate> {
        let rider_id = rider_id.into();
        self.with_engine(|engine| engine.candidates(&rider_id))
    }

    pub fn tick(&mut self) -> TickSummary {
        self.schedule.run(&mut self.world);
        self.world.resource::<LastTickSummary>().0.clone()
    }

    /// Runs `count` ticks and returns their summaries in order.
    pub fn run_ticks(&mut self, count: usize) -> Vec<TickSummary> {
        (0..count).map(|_| self.tick()).collect()
    }

    /// Ticks until no ride is assigned or `max_ticks` is reached. Returns the ticks run.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.has_active_rides() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn has_active_rides(&self) -> bool {
        !self.state().assigned_request_ids().is_empty()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.state(), self.tick_count())
    }

    pub fn tick_count(&self) -> u64 {
        self.world.resource::<TickClock>().now()
    }

    pub fn state(&self) -> &WorldState {
        self.world.resource::<WorldState>()
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        self.world.resource::<DispatchTelemetry>()
    }

    pub fn bounds(&self) -> GridBounds {
        self.state().bounds()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn state_mut(&mut self) -> Mut<'_, WorldState> {
        self.world.resource_mut::<WorldState>()
    }

    fn with_engine<T>(&mut self, f: impl FnOnce(&mut DispatchEngine<'_>) -> T) -> T {
        let now = self.tick_count();
        self.world
            .resource_scope(|world, mut telemetry: Mut<DispatchTelemetry>| {
                world.resource_scope(|world, mut state: Mut<WorldState>| {
                    let ranking = world.resource::<CandidateRankingResource>();
                    let mut engine =
                        DispatchEngine::new(&mut state, &**ranking, &mut telemetry, now);
                    f(&mut engine)
                })
            })
    }
}

fn log_rejection<T>(operation: &str, result: &Result<T, DispatchError>) {
    if let Err(err) = result {
        warn!("{operation} rejected: {err}");
    }
}

/// Thread-safe handle that serializes every operation on one simulation.
#[derive(Clone, Default)]
pub struct SharedSimulation {
    inner: Arc<Mutex<DispatchSimulation>>,
}

impl SharedSimulation {
    pub fn new(simulation: DispatchSimulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulation)),
        }
    }

    /// Runs `f` with exclusive access for its whole duration.
    pub fn with<T>(&self, f: impl FnOnce(&mut DispatchSimulation) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn request_ride(&self, rider_id: impl Into<RiderId>, dropoff: Location) -> DispatchOutcome {
        self.lock().request_ride(rider_id, dropoff)
    }

    pub fn respond_to_offer(
        &self,
        rider_id: impl Into<RiderId>,
        driver_id: impl Into<DriverId>,
        accepted: bool,
    ) -> DispatchOutcome {
        self.lock().respond_to_offer(rider_id, driver_id, accepted)
    }

    pub fn tick(&self) -> TickSummary {
        self.lock().tick()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.lock().snapshot()
    }

    // Every operation validates before mutating, so a panic mid-operation
    // cannot leave a half-applied change behind the poisoned lock.
    fn lock(&self) -> MutexGuard<'_, DispatchSimulation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
