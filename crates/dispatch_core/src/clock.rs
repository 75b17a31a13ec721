use bevy_ecs::prelude::Resource;

/// Discrete simulation time. Advances only when a tick is explicitly run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Resource)]
pub struct TickClock {
    now: u64,
}

impl TickClock {
    /// Number of ticks processed so far.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Moves to the next tick and returns its number.
    pub fn advance(&mut self) -> u64 {
        self.now += 1;
        self.now
    }
}
