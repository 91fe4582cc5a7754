//! Refill states: which tiles fill a container, into what, and what the tile becomes.
//!
//! The JSON form is compiled once into a [`RefillTable`] with sorted id lists and reverse
//! indexes. Reloading builds a new table and swaps it into the [`RefillTableHandle`].

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::config::config_candidates;
use crate::tiles::{BlockId, FluidId};

pub const BUILTIN_REFILL_STATES: &str = include_str!("data/refill_states.json");

/// Sentinel meaning "use the produced item's natural maximum durability".
pub const NATURAL_DURABILITY: f64 = -1.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefillStatesConfig {
    pub states: BTreeMap<String, RefillStateConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefillStateConfig {
    #[serde(default)]
    pub allowed_blocks: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_fluids: Vec<String>,
    #[serde(default)]
    pub transform_block: Option<String>,
    #[serde(default)]
    pub transform_fluid: Option<String>,
    #[serde(default = "natural_durability")]
    pub durability: f64,
}

fn natural_durability() -> f64 {
    NATURAL_DURABILITY
}

/// Compiled form of one refill state.
#[derive(Debug, Clone, PartialEq)]
pub struct RefillEntry {
    pub allowed_blocks: BTreeSet<BlockId>,
    pub allowed_fluids: BTreeSet<FluidId>,
    pub transform_block: Option<BlockId>,
    pub transform_fluid: Option<FluidId>,
    pub target_durability: f64,
}

impl RefillEntry {
    /// Durability a freshly produced unit should carry, if the state overrides it.
    pub fn durability_override(&self) -> Option<f64> {
        (self.target_durability >= 0.0).then_some(self.target_durability)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RefillTable {
    entries: BTreeMap<String, RefillEntry>,
    allowed_block_ids: Vec<BlockId>,
    allowed_fluid_ids: Vec<FluidId>,
    block_to_state: HashMap<BlockId, String>,
    fluid_to_state: HashMap<FluidId, String>,
}

impl RefillTable {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_REFILL_STATES)
                .expect("builtin refill states should compile"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, RefillConfigError> {
        let config: RefillStatesConfig = serde_json::from_str(json)?;
        Self::compile(&config)
    }

    pub fn from_file(path: &Path) -> Result<Self, RefillConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| RefillConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn compile(config: &RefillStatesConfig) -> Result<Self, RefillConfigError> {
        let mut table = RefillTable::default();

        for (state, raw) in &config.states {
            let blocks = match raw.allowed_blocks.as_deref() {
                Some(blocks) if !blocks.is_empty() => blocks,
                _ => {
                    return Err(RefillConfigError::MissingAllowedBlocks {
                        state: state.clone(),
                    })
                }
            };

            let mut entry = RefillEntry {
                allowed_blocks: BTreeSet::new(),
                allowed_fluids: BTreeSet::new(),
                transform_block: raw.transform_block.as_deref().map(BlockId::new),
                transform_fluid: raw.transform_fluid.as_deref().map(FluidId::new),
                target_durability: raw.durability,
            };

            for raw_block in blocks {
                let block = BlockId::new(raw_block.trim());
                if block.as_str().is_empty() {
                    return Err(RefillConfigError::EmptyIdentifier {
                        state: state.clone(),
                    });
                }
                if let Some(existing) = table.block_to_state.get(&block) {
                    if existing != state {
                        return Err(RefillConfigError::DuplicateBlock {
                            block: block.to_string(),
                            first: existing.clone(),
                            second: state.clone(),
                        });
                    }
                }
                table.block_to_state.insert(block.clone(), state.clone());
                entry.allowed_blocks.insert(block);
            }

            for raw_fluid in &raw.allowed_fluids {
                let fluid = FluidId::new(raw_fluid.trim());
                if fluid.as_str().is_empty() {
                    return Err(RefillConfigError::EmptyIdentifier {
                        state: state.clone(),
                    });
                }
                if let Some(existing) = table.fluid_to_state.get(&fluid) {
                    if existing != state {
                        return Err(RefillConfigError::DuplicateFluid {
                            fluid: fluid.to_string(),
                            first: existing.clone(),
                            second: state.clone(),
                        });
                    }
                }
                table.fluid_to_state.insert(fluid.clone(), state.clone());
                entry.allowed_fluids.insert(fluid);
            }

            table.entries.insert(state.clone(), entry);
        }

        table.allowed_block_ids = table.block_to_state.keys().cloned().collect();
        table.allowed_block_ids.sort();
        table.allowed_fluid_ids = table.fluid_to_state.keys().cloned().collect();
        table.allowed_fluid_ids.sort();

        Ok(table)
    }

    pub fn entry(&self, state: &str) -> Option<&RefillEntry> {
        self.entries.get(state)
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn allowed_block_ids(&self) -> &[BlockId] {
        &self.allowed_block_ids
    }

    pub fn allowed_fluid_ids(&self) -> &[FluidId] {
        &self.allowed_fluid_ids
    }

    pub fn allows_block(&self, block: &BlockId) -> bool {
        self.allowed_block_ids.binary_search(block).is_ok()
    }

    pub fn allows_fluid(&self, fluid: &FluidId) -> bool {
        self.allowed_fluid_ids.binary_search(fluid).is_ok()
    }

    pub fn state_for_block(&self, block: &BlockId) -> Option<&str> {
        self.block_to_state.get(block).map(String::as_str)
    }

    pub fn state_for_fluid(&self, fluid: &FluidId) -> Option<&str> {
        self.fluid_to_state.get(fluid).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum RefillConfigError {
    #[error("failed to parse refill states: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read refill states from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refill state '{state}' must list at least one allowed block")]
    MissingAllowedBlocks { state: String },
    #[error("refill state '{state}' contains an empty identifier")]
    EmptyIdentifier { state: String },
    #[error("block '{block}' is routed to both '{first}' and '{second}'")]
    DuplicateBlock {
        block: String,
        first: String,
        second: String,
    },
    #[error("fluid '{fluid}' is routed to both '{first}' and '{second}'")]
    DuplicateFluid {
        fluid: String,
        first: String,
        second: String,
    },
}

/// Shared handle to the compiled refill table.
#[derive(Resource, Debug, Clone)]
pub struct RefillTableHandle(pub Arc<RefillTable>);

impl RefillTableHandle {
    pub fn new(table: Arc<RefillTable>) -> Self {
        Self(table)
    }

    pub fn get(&self) -> Arc<RefillTable> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, table: Arc<RefillTable>) {
        self.0 = table;
    }

    /// Compile `path` and swap it in. The current table stays in place on error.
    pub fn reload_from(&mut self, path: &Path) -> Result<(), RefillConfigError> {
        let table = RefillTable::from_file(path)?;
        tracing::info!(
            target: "brewery::config",
            path = %path.display(),
            states = table.len(),
            "refill_states.reloaded"
        );
        self.replace(Arc::new(table));
        Ok(())
    }
}

pub fn load_refill_table_from_env() -> Arc<RefillTable> {
    for path in config_candidates("BREWERY_REFILL_STATES_PATH", "refill_states.json") {
        match RefillTable::from_file(&path) {
            Ok(table) => {
                tracing::info!(
                    target: "brewery::config",
                    path = %path.display(),
                    states = table.len(),
                    "refill_states.loaded=file"
                );
                return Arc::new(table);
            }
            Err(err) => {
                tracing::warn!(
                    target: "brewery::config",
                    path = %path.display(),
                    error = %err,
                    "refill_states.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "brewery::config", "refill_states.loaded=builtin");
    RefillTable::builtin()
}
