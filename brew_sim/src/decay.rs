//! Sober-up pass: per-tick intoxication decay, tier effects and camera pulses.

use std::sync::Arc;

use bevy::prelude::*;
use tracing::debug;

use crate::{
    components::{Dead, Invulnerable, SleepState, TickDelta},
    config::{BreweryConfig, BreweryConfigHandle},
    effects::{ActiveEffects, EffectController},
    intoxication::{Intoxication, TierTable, MAX_LEVEL},
};

/// Nominal period of the drunk camera shake.
pub const PULSE_DURATION: f32 = 2.0;
/// Lead applied so consecutive pulses overlap instead of leaving gaps.
pub const PULSE_LEAD: f32 = 0.5;

/// Camera shake request for an actor's client. Zero intensity cancels the shake.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CameraPulse {
    pub actor: Entity,
    pub intensity: f32,
}

/// An actor finished drinking `item_id`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DrinkConsumed {
    pub actor: Entity,
    pub item_id: String,
}

/// Debug override of an actor's level.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SetIntoxication {
    pub actor: Entity,
    pub level: f32,
}

/// What a single tick decided for one actor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayTick {
    pub decayed: bool,
    pub slumbered: bool,
    pub pulse: Option<f32>,
}

impl DecayTick {
    pub fn needs_tier_update(&self) -> bool {
        self.decayed || self.slumbered
    }
}

/// Effect changes made by a tier re-evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierTransition {
    pub removed: Vec<String>,
    pub applied: Option<String>,
}

impl TierTransition {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.applied.is_none()
    }
}

/// Decay rules compiled from [`BreweryConfig`].
#[derive(Debug, Clone)]
pub struct DecayEngine {
    tick_rate: f32,
    per_tick: f32,
    pulse_min: f32,
    pulse_max: f32,
    tiers: TierTable,
}

impl DecayEngine {
    pub fn from_config(config: &BreweryConfig) -> Self {
        Self {
            tick_rate: config.sober_tick_rate,
            per_tick: config.sober_up_per_tick,
            pulse_min: config.camera_effect_min,
            pulse_max: config.camera_effect_max,
            tiers: config.tier_table(),
        }
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Advance timers and level by `delta` seconds.
    ///
    /// Sober actors accrue nothing. Deep sleep zeroes the level and replaces any
    /// pulse computed this tick with a cancel.
    pub fn advance(
        &self,
        state: &mut Intoxication,
        delta: f32,
        sleep: Option<SleepState>,
    ) -> DecayTick {
        let mut tick = DecayTick::default();
        if state.is_sober() {
            return tick;
        }
        let delta = delta.max(0.0);

        if state.add_decay_elapsed(delta) > self.tick_rate {
            state.clear_decay_elapsed();
            state.decrease(self.per_tick);
            tick.decayed = true;
        }

        if state.add_pulse_elapsed(delta) > PULSE_DURATION - PULSE_LEAD - delta {
            state.clear_pulse_elapsed();
            tick.pulse = Some(self.pulse_intensity(state.level()));
        }

        if sleep.is_some_and(SleepState::is_slumber) {
            state.set_level(0.0);
            tick.slumbered = true;
            tick.pulse = Some(0.0);
        }

        tick
    }

    pub fn pulse_intensity(&self, level: f32) -> f32 {
        let t = (level / MAX_LEVEL).clamp(0.0, 1.0);
        self.pulse_min + (self.pulse_max - self.pulse_min) * t
    }

    /// Bring the actor's drink effects in line with `level`.
    ///
    /// Does nothing when the resolved tier's effect is already active.
    pub fn apply_tier<C: EffectController + ?Sized>(
        &self,
        level: f32,
        controller: &mut C,
    ) -> TierTransition {
        let mut transition = TierTransition::default();
        let target = self.tiers.resolve(level);

        if let Some(tier) = target {
            if controller.has_active_effect(&tier.effect_id) {
                return transition;
            }
        }

        for effect_id in controller.active_effect_ids() {
            if self.tiers.is_drink_effect(&effect_id) {
                controller.remove_effect(&effect_id);
                transition.removed.push(effect_id);
            }
        }

        if let Some(tier) = target {
            controller.add_effect(&tier.effect_id);
            transition.applied = Some(tier.effect_id.clone());
        }

        transition
    }
}

/// Shared decay engine, rebuilt whenever the brewery config is replaced.
#[derive(Resource, Debug, Clone)]
pub struct DecayEngineHandle(pub Arc<DecayEngine>);

impl DecayEngineHandle {
    pub fn from_config(config: &BreweryConfig) -> Self {
        Self(Arc::new(DecayEngine::from_config(config)))
    }

    pub fn get(&self) -> Arc<DecayEngine> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, engine: Arc<DecayEngine>) {
        self.0 = engine;
    }
}

fn retier(
    engine: &DecayEngine,
    actor: Entity,
    level: f32,
    effects: Option<Mut<ActiveEffects>>,
) {
    let Some(mut effects) = effects else {
        return;
    };
    let transition = engine.apply_tier(level, &mut *effects);
    if !transition.is_noop() {
        debug!(
            target: "brewery::decay",
            actor = ?actor,
            intoxication = level,
            removed = transition.removed.len(),
            applied = transition.applied.as_deref().unwrap_or("none"),
            "tier.changed"
        );
    }
}

type SoberUpFilter = (Without<Dead>, Without<Invulnerable>);

/// Decay every eligible actor by one tick.
pub fn sober_up(
    engine: Res<DecayEngineHandle>,
    delta: Res<TickDelta>,
    mut actors: Query<
        (
            Entity,
            &mut Intoxication,
            Option<&mut ActiveEffects>,
            Option<&SleepState>,
        ),
        SoberUpFilter,
    >,
    mut pulses: EventWriter<CameraPulse>,
) {
    let engine = engine.get();
    let delta = delta.seconds();
    for (actor, mut state, effects, sleep) in actors.iter_mut() {
        let tick = engine.advance(&mut state, delta, sleep.copied());
        if tick.needs_tier_update() {
            retier(&engine, actor, state.level(), effects);
        }
        if tick.slumbered {
            debug!(target: "brewery::decay", actor = ?actor, "sleep.sobered");
        }
        if let Some(intensity) = tick.pulse {
            pulses.send(CameraPulse { actor, intensity });
        }
    }
}

/// Raise levels for finished drinks and shake the drinker's camera right away.
pub fn consume_drinks(
    engine: Res<DecayEngineHandle>,
    config: Res<BreweryConfigHandle>,
    mut drinks: EventReader<DrinkConsumed>,
    mut actors: Query<(&mut Intoxication, Option<&mut ActiveEffects>), SoberUpFilter>,
    mut pulses: EventWriter<CameraPulse>,
) {
    let engine = engine.get();
    let config = config.get();
    for drink in drinks.read() {
        let Ok((mut state, effects)) = actors.get_mut(drink.actor) else {
            debug!(
                target: "brewery::decay",
                actor = ?drink.actor,
                item = %drink.item_id,
                "drink.skipped=ineligible_actor"
            );
            continue;
        };
        let amount = config.drink_value(&drink.item_id);
        if amount <= 0.0 {
            debug!(
                target: "brewery::decay",
                item = %drink.item_id,
                "drink.unknown"
            );
        }
        state.increase(amount);
        retier(&engine, drink.actor, state.level(), effects);
        pulses.send(CameraPulse {
            actor: drink.actor,
            intensity: engine.pulse_intensity(state.level()),
        });
    }
}

/// Apply debug level overrides.
pub fn apply_intoxication_overrides(
    engine: Res<DecayEngineHandle>,
    mut overrides: EventReader<SetIntoxication>,
    mut actors: Query<(&mut Intoxication, Option<&mut ActiveEffects>)>,
) {
    let engine = engine.get();
    for request in overrides.read() {
        let Ok((mut state, effects)) = actors.get_mut(request.actor) else {
            continue;
        };
        state.set_level(request.level);
        retier(&engine, request.actor, state.level(), effects);
    }
}

/// Fully sober actors the moment they die.
pub fn sober_on_death(
    engine: Res<DecayEngineHandle>,
    mut fallen: Query<(Entity, &mut Intoxication, Option<&mut ActiveEffects>), Added<Dead>>,
) {
    let engine = engine.get();
    for (actor, mut state, effects) in fallen.iter_mut() {
        state.set_level(0.0);
        state.reset_timers();
        retier(&engine, actor, 0.0, effects);
    }
}

/// Rebuild the decay engine after the brewery config changed.
pub fn refresh_decay_engine(
    config: Res<BreweryConfigHandle>,
    mut engine: ResMut<DecayEngineHandle>,
) {
    if config.is_changed() && !config.is_added() {
        engine.replace(Arc::new(DecayEngine::from_config(&config.get())));
        tracing::info!(target: "brewery::config", "decay_engine.rebuilt");
    }
}
