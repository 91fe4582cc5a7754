//! Configuration for intoxication decay, tiers and drink strengths.
//!
//! Loaded from `brewery_config.json` with support for an environment variable override.

use std::{
    collections::HashMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::intoxication::{Tier, TierTable};

pub const BUILTIN_BREWERY_CONFIG: &str = include_str!("data/brewery_config.json");

/// Root configuration for the brewery simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreweryConfig {
    pub sober_tick_rate: f32,
    pub sober_up_per_tick: f32,
    pub camera_effect_min: f32,
    pub camera_effect_max: f32,
    pub tiers: Vec<TierConfig>,
    pub drink_values: HashMap<String, f32>,
    pub fluid_refill_enabled: bool,
}

impl Default for BreweryConfig {
    fn default() -> Self {
        Self {
            sober_tick_rate: 1.0,
            sober_up_per_tick: 0.1,
            camera_effect_min: 0.0,
            camera_effect_max: 0.012,
            tiers: default_tiers(),
            drink_values: default_drink_values(),
            fluid_refill_enabled: false,
        }
    }
}

fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig::new(1.0, "Brewery_Drink_Effect_Sober"),
        TierConfig::new(15.0, "Brewery_Drink_Effect_Little_Drunk"),
        TierConfig::new(40.0, "Brewery_Drink_Effect_Drunk"),
        TierConfig::new(70.0, "Brewery_Drink_Effect_Very_Drunk"),
    ]
}

fn default_drink_values() -> HashMap<String, f32> {
    [
        ("Brewery_Ale_Mug", 5.5),
        ("Brewery_Beer_Mug", 9.3),
        ("Brewery_Berry_Cider_Mug", 5.0),
        ("Brewery_Caramel_Beer_Mug", 6.0),
        ("Brewery_Chili_Beer_Mug", 7.3),
        ("Brewery_Cider_Mug", 6.3),
        ("Brewery_Kvas_Mug", 1.4),
        ("Brewery_Pumpkin_Beer_Mug", 7.2),
        ("Brewery_Vodka_Mug", 16.0),
        ("Brewery_Wine_Mug", 7.5),
    ]
    .into_iter()
    .map(|(id, value)| (id.to_string(), value))
    .collect()
}

impl BreweryConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_BREWERY_CONFIG)
                .expect("builtin brewery config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, BreweryConfigError> {
        let config: BreweryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, BreweryConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| BreweryConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), BreweryConfigError> {
        if !(self.sober_tick_rate.is_finite() && self.sober_tick_rate > 0.0) {
            return Err(BreweryConfigError::InvalidTickRate(self.sober_tick_rate));
        }
        if !(self.sober_up_per_tick.is_finite() && self.sober_up_per_tick >= 0.0) {
            return Err(BreweryConfigError::InvalidDecay(self.sober_up_per_tick));
        }
        if !(self.camera_effect_min.is_finite() && self.camera_effect_max.is_finite()) {
            return Err(BreweryConfigError::InvalidPulseRange {
                min: self.camera_effect_min,
                max: self.camera_effect_max,
            });
        }
        for tier in &self.tiers {
            if tier.effect.trim().is_empty() {
                return Err(BreweryConfigError::EmptyTierEffect {
                    threshold: tier.threshold,
                });
            }
            if !tier.threshold.is_finite() {
                return Err(BreweryConfigError::InvalidTierThreshold {
                    effect: tier.effect.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn tier_table(&self) -> TierTable {
        TierTable::new(
            self.tiers
                .iter()
                .map(|tier| Tier::new(tier.threshold, tier.effect.clone()))
                .collect(),
        )
    }

    /// Intoxication granted by one serving of `item_id`; unknown drinks give nothing.
    pub fn drink_value(&self, item_id: &str) -> f32 {
        self.drink_values.get(item_id).copied().unwrap_or(0.0)
    }
}

/// One intoxication bracket as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    pub threshold: f32,
    pub effect: String,
}

impl TierConfig {
    pub fn new(threshold: f32, effect: impl Into<String>) -> Self {
        Self {
            threshold,
            effect: effect.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BreweryConfigError {
    #[error("failed to parse brewery config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read brewery config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sober_tick_rate must be a positive number of seconds, got {0}")]
    InvalidTickRate(f32),
    #[error("sober_up_per_tick must be non-negative, got {0}")]
    InvalidDecay(f32),
    #[error("camera effect bounds must be finite, got {min}..{max}")]
    InvalidPulseRange { min: f32, max: f32 },
    #[error("tier at threshold {threshold} has no effect id")]
    EmptyTierEffect { threshold: f32 },
    #[error("tier '{effect}' has a non-finite threshold")]
    InvalidTierThreshold { effect: String },
}

/// Handle for accessing the brewery configuration.
#[derive(Resource, Debug, Clone)]
pub struct BreweryConfigHandle(pub Arc<BreweryConfig>);

impl BreweryConfigHandle {
    pub fn new(config: Arc<BreweryConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<BreweryConfig> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, config: Arc<BreweryConfig>) {
        self.0 = config;
    }
}

/// Resolve a config file from an override env var, falling back to the bundled copy.
pub(crate) fn config_candidates(env_key: &str, file_name: &str) -> Vec<PathBuf> {
    match env::var(env_key).ok().map(PathBuf::from) {
        Some(path) => vec![path],
        None => vec![PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("src/data")
            .join(file_name)],
    }
}

/// Load brewery configuration from environment or default path.
pub fn load_brewery_config_from_env() -> (Arc<BreweryConfig>, Option<PathBuf>) {
    for path in config_candidates("BREWERY_CONFIG_PATH", "brewery_config.json") {
        match BreweryConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "brewery::config",
                    path = %path.display(),
                    "brewery_config.loaded=file"
                );
                return (Arc::new(config), Some(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "brewery::config",
                    path = %path.display(),
                    error = %err,
                    "brewery_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "brewery::config", "brewery_config.loaded=builtin");
    (BreweryConfig::builtin(), None)
}
