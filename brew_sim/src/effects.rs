use bevy::prelude::Component;

/// Status effect currently running on an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    effect_id: String,
}

impl ActiveEffect {
    pub fn new(effect_id: impl Into<String>) -> Self {
        Self {
            effect_id: effect_id.into(),
        }
    }

    pub fn effect_id(&self) -> &str {
        &self.effect_id
    }
}

/// Host-side controller for an actor's persistent status effects.
pub trait EffectController {
    fn active_effect_ids(&self) -> Vec<String>;

    fn has_active_effect(&self, effect_id: &str) -> bool {
        self.active_effect_ids().iter().any(|id| id == effect_id)
    }

    fn add_effect(&mut self, effect_id: &str);

    fn remove_effect(&mut self, effect_id: &str);
}

/// Effects attached to an actor entity.
#[derive(Component, Debug, Clone, Default)]
pub struct ActiveEffects {
    effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl EffectController for ActiveEffects {
    fn active_effect_ids(&self) -> Vec<String> {
        self.effects
            .iter()
            .map(|effect| effect.effect_id().to_string())
            .collect()
    }

    fn has_active_effect(&self, effect_id: &str) -> bool {
        self.effects
            .iter()
            .any(|effect| effect.effect_id() == effect_id)
    }

    fn add_effect(&mut self, effect_id: &str) {
        if !self.has_active_effect(effect_id) {
            self.effects.push(ActiveEffect::new(effect_id));
        }
    }

    fn remove_effect(&mut self, effect_id: &str) {
        self.effects.retain(|effect| effect.effect_id() != effect_id);
    }
}
