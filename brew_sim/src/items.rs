//! Item definitions: per-state variants, durability and tags.

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::config::config_candidates;
use crate::inventory::ItemStack;

pub const BUILTIN_ITEM_CATALOG: &str = include_str!("data/item_catalog.json");

/// Item registry queries needed to resolve a refill.
pub trait ItemVariants {
    /// Item that `item_id` turns into for the refill state `state`.
    fn variant_for_state(&self, item_id: &str, state: &str) -> Option<String>;

    fn max_durability(&self, item_id: &str) -> f64;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemDefinition {
    pub max_durability: f64,
    pub states: HashMap<String, String>,
    pub tags: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemCatalog {
    pub items: BTreeMap<String, ItemDefinition>,
}

impl ItemCatalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_ITEM_CATALOG).expect("builtin item catalog should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ItemCatalogError> {
        let catalog: ItemCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, ItemCatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| ItemCatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ItemCatalogError> {
        for (id, definition) in &self.items {
            for (state, variant) in &definition.states {
                if !self.items.contains_key(variant) {
                    return Err(ItemCatalogError::UnknownVariant {
                        item: id.clone(),
                        state: state.clone(),
                        variant: variant.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn definition(&self, item_id: &str) -> Option<&ItemDefinition> {
        self.items.get(item_id)
    }

    /// One unit of `item_id` at its natural durability.
    pub fn stack(&self, item_id: &str, quantity: u32) -> ItemStack {
        ItemStack::new(item_id, quantity, self.max_durability(item_id))
    }

    pub fn has_tag(&self, item_id: &str, key: &str, tag: &str) -> bool {
        self.definition(item_id)
            .and_then(|definition| definition.tags.get(key))
            .is_some_and(|values| values.iter().any(|value| value == tag))
    }

    pub fn tag_values(&self, item_id: &str) -> impl Iterator<Item = &str> {
        self.definition(item_id)
            .into_iter()
            .flat_map(|definition| definition.tags.values())
            .flatten()
            .map(String::as_str)
    }
}

impl ItemVariants for ItemCatalog {
    fn variant_for_state(&self, item_id: &str, state: &str) -> Option<String> {
        self.definition(item_id)
            .and_then(|definition| definition.states.get(state))
            .cloned()
    }

    fn max_durability(&self, item_id: &str) -> f64 {
        self.definition(item_id)
            .map(|definition| definition.max_durability)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Error)]
pub enum ItemCatalogError {
    #[error("failed to parse item catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read item catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("item '{item}' maps state '{state}' to unknown item '{variant}'")]
    UnknownVariant {
        item: String,
        state: String,
        variant: String,
    },
}

#[derive(Resource, Debug, Clone)]
pub struct ItemCatalogHandle(pub Arc<ItemCatalog>);

impl ItemCatalogHandle {
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self(catalog)
    }

    pub fn get(&self) -> Arc<ItemCatalog> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, catalog: Arc<ItemCatalog>) {
        self.0 = catalog;
    }
}

pub fn load_item_catalog_from_env() -> Arc<ItemCatalog> {
    for path in config_candidates("BREWERY_ITEM_CATALOG_PATH", "item_catalog.json") {
        match ItemCatalog::from_file(&path) {
            Ok(catalog) => {
                tracing::info!(
                    target: "brewery::config",
                    path = %path.display(),
                    items = catalog.items.len(),
                    "item_catalog.loaded=file"
                );
                return Arc::new(catalog);
            }
            Err(err) => {
                tracing::warn!(
                    target: "brewery::config",
                    path = %path.display(),
                    error = %err,
                    "item_catalog.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "brewery::config", "item_catalog.loaded=builtin");
    ItemCatalog::builtin()
}
