use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

/// Upper bound for an actor's intoxication level.
pub const MAX_LEVEL: f32 = 100.0;

/// Per-actor intoxication state.
///
/// The level is clamped to `[0, MAX_LEVEL]` on every write. The two timers
/// accumulate tick deltas while the actor is intoxicated and are zeroed when
/// the decay step or the camera pulse they drive fires.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Intoxication {
    level: f32,
    decay_elapsed: f32,
    pulse_elapsed: f32,
}

impl Intoxication {
    pub fn with_level(level: f32) -> Self {
        let mut state = Self::default();
        state.set_level(level);
        state
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn decay_elapsed(&self) -> f32 {
        self.decay_elapsed
    }

    pub fn pulse_elapsed(&self) -> f32 {
        self.pulse_elapsed
    }

    pub fn is_sober(&self) -> bool {
        self.level <= 0.0
    }

    pub fn set_level(&mut self, value: f32) {
        // NaN would slip through clamp; treat it as sober.
        self.level = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, MAX_LEVEL)
        };
    }

    pub fn increase(&mut self, amount: f32) {
        self.set_level(self.level + amount);
    }

    pub fn decrease(&mut self, amount: f32) {
        self.set_level(self.level - amount);
    }

    pub(crate) fn add_decay_elapsed(&mut self, delta: f32) -> f32 {
        self.decay_elapsed += delta.max(0.0);
        self.decay_elapsed
    }

    pub(crate) fn add_pulse_elapsed(&mut self, delta: f32) -> f32 {
        self.pulse_elapsed += delta.max(0.0);
        self.pulse_elapsed
    }

    pub(crate) fn clear_decay_elapsed(&mut self) {
        self.decay_elapsed = 0.0;
    }

    pub(crate) fn clear_pulse_elapsed(&mut self) {
        self.pulse_elapsed = 0.0;
    }

    /// Zero both timers while keeping the level.
    pub fn reset_timers(&mut self) {
        self.decay_elapsed = 0.0;
        self.pulse_elapsed = 0.0;
    }

    /// Copy carried across a relocation: the level survives, elapsed time
    /// does not, so nothing fires on the first tick after the move.
    pub fn rebound(&self) -> Self {
        Self {
            level: self.level,
            decay_elapsed: 0.0,
            pulse_elapsed: 0.0,
        }
    }

    pub fn to_record(&self) -> IntoxicationRecord {
        IntoxicationRecord { level: self.level }
    }

    pub fn from_record(record: &IntoxicationRecord) -> Self {
        Self::with_level(record.level)
    }
}

/// Persisted form of [`Intoxication`]. Timers are transient and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntoxicationRecord {
    pub level: f32,
}

/// A named intoxication bracket and the persistent effect it grants.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub threshold: f32,
    pub effect_id: String,
}

impl Tier {
    pub fn new(threshold: f32, effect_id: impl Into<String>) -> Self {
        Self {
            threshold,
            effect_id: effect_id.into(),
        }
    }
}

/// Tiers ordered by descending threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { tiers }
    }

    /// First tier (highest threshold) whose threshold is at or below `level`.
    pub fn resolve(&self, level: f32) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.threshold <= level)
    }

    /// Position of the resolved tier counted from the most sober bracket;
    /// `0` means no tier.
    pub fn rank(&self, level: f32) -> usize {
        match self.tiers.iter().position(|tier| tier.threshold <= level) {
            Some(index) => self.tiers.len() - index,
            None => 0,
        }
    }

    /// Whether `effect_id` belongs to one of the tiers.
    pub fn is_drink_effect(&self, effect_id: &str) -> bool {
        self.tiers.iter().any(|tier| tier.effect_id == effect_id)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_table() -> TierTable {
        TierTable::new(vec![
            Tier::new(1.0, "Brewery_Drink_Effect_Sober"),
            Tier::new(15.0, "Brewery_Drink_Effect_Little_Drunk"),
            Tier::new(40.0, "Brewery_Drink_Effect_Drunk"),
            Tier::new(70.0, "Brewery_Drink_Effect_Very_Drunk"),
        ])
    }

    #[test]
    fn level_stays_clamped_through_mixed_updates() {
        let mut state = Intoxication::default();
        let steps = [35.0, 80.0, -7.5, 250.0, -400.0, 12.25, -0.5, 99.0, 3.0];
        for (idx, step) in steps.iter().enumerate() {
            if idx % 2 == 0 {
                state.increase(*step);
            } else {
                state.decrease(*step);
            }
            assert!(
                (0.0..=MAX_LEVEL).contains(&state.level()),
                "level {} escaped bounds after step {}",
                state.level(),
                idx
            );
        }
        state.set_level(f32::NAN);
        assert_eq!(state.level(), 0.0);
        state.set_level(1_000.0);
        assert_eq!(state.level(), MAX_LEVEL);
    }

    #[test]
    fn rebound_keeps_level_and_zeroes_timers() {
        let mut state = Intoxication::with_level(50.0);
        state.add_decay_elapsed(0.8);
        state.add_pulse_elapsed(1.5);

        let moved = state.rebound();
        assert_eq!(moved.level(), 50.0);
        assert_eq!(moved.decay_elapsed(), 0.0);
        assert_eq!(moved.pulse_elapsed(), 0.0);

        state.reset_timers();
        assert_eq!(state, moved);
    }

    #[test]
    fn record_restores_without_timers() {
        let mut state = Intoxication::with_level(42.5);
        state.add_pulse_elapsed(0.3);
        let json = serde_json::to_string(&state.to_record()).expect("record serializes");
        let record: IntoxicationRecord = serde_json::from_str(&json).expect("record parses");
        let restored = Intoxication::from_record(&record);
        assert_eq!(restored.level(), 42.5);
        assert_eq!(restored.pulse_elapsed(), 0.0);
    }

    #[test]
    fn tiers_sorted_descending_and_resolve_highest_match() {
        let table = reference_table();
        let thresholds: Vec<f32> = table.tiers().iter().map(|t| t.threshold).collect();
        assert_eq!(thresholds, vec![70.0, 40.0, 15.0, 1.0]);

        assert!(table.resolve(0.0).is_none());
        assert!(table.resolve(0.99).is_none());
        assert_eq!(
            table.resolve(1.0).map(|t| t.effect_id.as_str()),
            Some("Brewery_Drink_Effect_Sober")
        );
        assert_eq!(
            table.resolve(39.9).map(|t| t.effect_id.as_str()),
            Some("Brewery_Drink_Effect_Little_Drunk")
        );
        assert_eq!(
            table.resolve(MAX_LEVEL).map(|t| t.effect_id.as_str()),
            Some("Brewery_Drink_Effect_Very_Drunk")
        );
    }

    #[test]
    fn higher_level_never_resolves_a_more_sober_tier() {
        let table = reference_table();
        let mut previous = 0;
        let mut level = 0.0_f32;
        while level <= MAX_LEVEL {
            let rank = table.rank(level);
            assert!(rank >= previous, "rank dropped at level {}", level);
            previous = rank;
            level += 0.25;
        }
        assert_eq!(previous, 4);
    }

    #[test]
    fn drink_effect_membership_follows_table() {
        let table = reference_table();
        assert!(table.is_drink_effect("Brewery_Drink_Effect_Drunk"));
        assert!(!table.is_drink_effect("Regeneration"));
    }
}
