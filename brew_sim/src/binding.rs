//! Attaching intoxication state to actors as they (re)enter the simulation.

use bevy::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::intoxication::Intoxication;

/// The host finished loading an actor, either freshly joined or after a relocation.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorReady {
    pub actor: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The actor had no state yet and received a sober one.
    Attached,
    /// The actor already carried state; its timers were zeroed.
    TimersReset,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    #[error("actor {0:?} no longer exists")]
    ActorMissing(Entity),
}

/// Make sure `actor` carries intoxication state.
pub fn ensure_intoxication(world: &mut World, actor: Entity) -> Result<BindOutcome, BindError> {
    let mut entity = world
        .get_entity_mut(actor)
        .ok_or(BindError::ActorMissing(actor))?;

    if let Some(mut state) = entity.get_mut::<Intoxication>() {
        state.reset_timers();
        return Ok(BindOutcome::TimersReset);
    }

    entity.insert(Intoxication::default());
    Ok(BindOutcome::Attached)
}

/// Bind every actor reported ready since the last run.
pub fn bind_ready_actors(world: &mut World) {
    let ready: Vec<Entity> = match world.get_resource_mut::<Events<ActorReady>>() {
        Some(mut events) => events.drain().map(|event| event.actor).collect(),
        None => return,
    };

    for actor in ready {
        match ensure_intoxication(world, actor) {
            Ok(outcome) => {
                debug!(target: "brewery::bind", actor = ?actor, outcome = ?outcome, "actor.bound");
            }
            Err(err) => {
                warn!(target: "brewery::bind", error = %err, "actor.bind_failed");
            }
        }
    }
}
