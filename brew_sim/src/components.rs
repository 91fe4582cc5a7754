use bevy::prelude::*;

/// Marker for actors that have died. Dead actors are skipped by the sober-up pass.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

/// Marker for actors that cannot be affected by status changes.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Invulnerable;

/// Sleep phase reported by the host's bed/somnolence module.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepState {
    #[default]
    Awake,
    NoddingOff,
    /// Deep sleep; an actor in slumber wakes up fully sober.
    Slumber,
    WakingUp,
}

impl SleepState {
    pub fn is_slumber(self) -> bool {
        matches!(self, SleepState::Slumber)
    }
}

/// Seconds elapsed since the previous simulation tick, supplied by the host.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct TickDelta(pub f32);

impl Default for TickDelta {
    fn default() -> Self {
        Self(1.0 / 30.0)
    }
}

impl TickDelta {
    pub fn seconds(self) -> f32 {
        self.0.max(0.0)
    }
}

/// Tracks total simulation ticks elapsed.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 = tick.0.wrapping_add(1);
}
