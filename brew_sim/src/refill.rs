//! Container refill: turn a held container into its filled variant from a targeted tile.

use bevy::{math::IVec3, prelude::*};
use thiserror::Error;
use tracing::{debug, warn};

use crate::components::Dead;
use crate::config::BreweryConfigHandle;
use crate::inventory::{Inventory, ItemStack, SlotTransactions, StorePlacement};
use crate::items::{ItemCatalogHandle, ItemVariants};
use crate::refill_config::{RefillEntry, RefillTable, RefillTableHandle};
use crate::tiles::{TileGrid, TileStorage};

/// Which layer of the targeted tile a refill reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefillResource {
    #[default]
    Block,
    /// Off unless `fluid_refill_enabled` is set; hosts decide whether it runs after a failed
    /// block attempt or on its own.
    Fluid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillRequest {
    /// Slot holding the container.
    pub slot: usize,
    pub target: IVec3,
    pub resource: RefillResource,
}

/// Where the produced unit went after a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducedPlacement {
    HeldSlot,
    Inventory(usize),
    Dropped,
}

impl From<StorePlacement> for ProducedPlacement {
    fn from(placement: StorePlacement) -> Self {
        match placement {
            StorePlacement::Slot(slot) => ProducedPlacement::Inventory(slot),
            StorePlacement::Dropped => ProducedPlacement::Dropped,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    /// Same item, durability raised in place.
    ToppedUp { item_id: String, durability: f64 },
    /// One unit consumed and replaced by its filled variant.
    Swapped {
        consumed: String,
        produced: String,
        placement: ProducedPlacement,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefillOutcome {
    pub state: String,
    pub item: ItemChange,
    pub world_transformed: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RefillFailure {
    #[error("actor {actor:?} has no inventory or is dead")]
    ActorUnavailable { actor: Entity },
    #[error("{resource:?} refills are disabled")]
    ResourceDisabled { resource: RefillResource },
    #[error("no {resource:?} at {position:?}")]
    TileUnavailable {
        position: IVec3,
        resource: RefillResource,
    },
    #[error("'{id}' is not a refill source")]
    TileNotAllowed { id: String },
    #[error("'{id}' does not route to a known refill state")]
    UnknownState { id: String },
    #[error("slot {slot} holds nothing to refill")]
    EmptyHand { slot: usize },
    #[error("'{item}' has no variant for state '{state}'")]
    NoVariantForState { item: String, state: String },
    #[error("'{item}' is already at {durability} (target {target})")]
    NothingToTopUp {
        item: String,
        durability: f64,
        target: f64,
    },
    #[error("inventory slot {slot} rejected the change")]
    TransactionConflict { slot: usize },
    #[error("tile at {position:?} rejected the transform after the item change committed")]
    WorldWriteConflict {
        position: IVec3,
        committed: ItemChange,
    },
}

/// Stateless refill resolver over a compiled table and an item registry.
pub struct RefillEngine<'a, V: ItemVariants + ?Sized> {
    table: &'a RefillTable,
    items: &'a V,
    fluid_enabled: bool,
}

impl<'a, V: ItemVariants + ?Sized> RefillEngine<'a, V> {
    pub fn new(table: &'a RefillTable, items: &'a V, fluid_enabled: bool) -> Self {
        Self {
            table,
            items,
            fluid_enabled,
        }
    }

    /// Resolve one refill attempt, committing item and tile writes as it goes.
    ///
    /// Checks run before any write, so every failure up to the item transaction leaves the
    /// inventory and the tile untouched. A rejected tile transform is reported after the item
    /// change has already been committed.
    pub fn attempt<S, T>(
        &self,
        request: &RefillRequest,
        slots: &mut S,
        tiles: &mut T,
    ) -> Result<RefillOutcome, RefillFailure>
    where
        S: SlotTransactions + ?Sized,
        T: TileStorage + ?Sized,
    {
        if request.resource == RefillResource::Fluid && !self.fluid_enabled {
            return Err(RefillFailure::ResourceDisabled {
                resource: request.resource,
            });
        }

        let state = self.resolve_state(request, tiles)?;
        let entry = self
            .table
            .entry(&state)
            .ok_or_else(|| RefillFailure::UnknownState { id: state.clone() })?;

        let held = slots
            .slot(request.slot)
            .cloned()
            .ok_or(RefillFailure::EmptyHand { slot: request.slot })?;
        let variant = self
            .items
            .variant_for_state(&held.item_id, &state)
            .ok_or_else(|| RefillFailure::NoVariantForState {
                item: held.item_id.clone(),
                state: state.clone(),
            })?;

        let item = if variant == held.item_id {
            top_up(request.slot, &held, entry, slots)?
        } else {
            self.swap(request.slot, &held, variant, entry, slots)?
        };

        let world_transformed = transform_tile(request, entry, tiles, &item)?;

        Ok(RefillOutcome {
            state,
            item,
            world_transformed,
        })
    }

    fn resolve_state<T: TileStorage + ?Sized>(
        &self,
        request: &RefillRequest,
        tiles: &T,
    ) -> Result<String, RefillFailure> {
        let unavailable = RefillFailure::TileUnavailable {
            position: request.target,
            resource: request.resource,
        };
        let (id, state) = match request.resource {
            RefillResource::Block => {
                let block = tiles.block_at(request.target).ok_or(unavailable)?;
                if !self.table.allows_block(&block) {
                    return Err(RefillFailure::TileNotAllowed {
                        id: block.to_string(),
                    });
                }
                let state = self.table.state_for_block(&block).map(str::to_owned);
                (block.to_string(), state)
            }
            RefillResource::Fluid => {
                let fluid = tiles.fluid_at(request.target).ok_or(unavailable)?;
                if !self.table.allows_fluid(&fluid) {
                    return Err(RefillFailure::TileNotAllowed {
                        id: fluid.to_string(),
                    });
                }
                let state = self.table.state_for_fluid(&fluid).map(str::to_owned);
                (fluid.to_string(), state)
            }
        };
        state.ok_or(RefillFailure::UnknownState { id })
    }

    fn swap<S: SlotTransactions + ?Sized>(
        &self,
        slot: usize,
        held: &ItemStack,
        variant: String,
        entry: &RefillEntry,
        slots: &mut S,
    ) -> Result<ItemChange, RefillFailure> {
        if !slots.remove_from_slot(slot, held, 1) {
            return Err(RefillFailure::TransactionConflict { slot });
        }

        let natural = self.items.max_durability(&variant);
        let produced = ItemStack::new(variant.clone(), 1, natural)
            .with_durability(entry.durability_override().unwrap_or(natural));

        let placement = if held.quantity == 1 {
            if !slots.set_slot(slot, produced) {
                return Err(RefillFailure::TransactionConflict { slot });
            }
            ProducedPlacement::HeldSlot
        } else {
            slots.add_or_drop(produced).into()
        };

        Ok(ItemChange::Swapped {
            consumed: held.item_id.clone(),
            produced: variant,
            placement,
        })
    }
}

fn top_up<S: SlotTransactions + ?Sized>(
    slot: usize,
    held: &ItemStack,
    entry: &RefillEntry,
    slots: &mut S,
) -> Result<ItemChange, RefillFailure> {
    let target = entry.target_durability.max(held.max_durability);
    if target <= held.durability {
        return Err(RefillFailure::NothingToTopUp {
            item: held.item_id.clone(),
            durability: held.durability,
            target,
        });
    }
    if !slots.set_slot(slot, held.clone().with_durability(target)) {
        return Err(RefillFailure::TransactionConflict { slot });
    }
    Ok(ItemChange::ToppedUp {
        item_id: held.item_id.clone(),
        durability: target,
    })
}

fn transform_tile<T: TileStorage + ?Sized>(
    request: &RefillRequest,
    entry: &RefillEntry,
    tiles: &mut T,
    committed: &ItemChange,
) -> Result<bool, RefillFailure> {
    let written = match request.resource {
        RefillResource::Block => match &entry.transform_block {
            Some(block) => tiles.set_block(request.target, block),
            None => return Ok(false),
        },
        RefillResource::Fluid => match &entry.transform_fluid {
            Some(fluid) => tiles.set_fluid(request.target, fluid),
            None => return Ok(false),
        },
    };

    if !written {
        return Err(RefillFailure::WorldWriteConflict {
            position: request.target,
            committed: committed.clone(),
        });
    }
    tiles.notify_block_changed(request.target);
    Ok(true)
}

/// An actor used a container on a tile.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillAttempt {
    pub actor: Entity,
    pub slot: usize,
    pub target: IVec3,
    pub resource: RefillResource,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct RefillResolved {
    pub actor: Entity,
    pub result: Result<RefillOutcome, RefillFailure>,
}

pub fn resolve_refill_attempts(
    mut attempts: EventReader<RefillAttempt>,
    mut resolved: EventWriter<RefillResolved>,
    table: Res<RefillTableHandle>,
    catalog: Res<ItemCatalogHandle>,
    config: Res<BreweryConfigHandle>,
    mut grid: ResMut<TileGrid>,
    mut inventories: Query<&mut Inventory, Without<Dead>>,
) {
    if attempts.is_empty() {
        return;
    }

    let table = table.get();
    let catalog = catalog.get();
    let engine = RefillEngine::new(&table, catalog.as_ref(), config.0.fluid_refill_enabled);

    for attempt in attempts.read() {
        let Ok(mut inventory) = inventories.get_mut(attempt.actor) else {
            warn!(
                target: "brewery::refill",
                actor = ?attempt.actor,
                "refill.no_inventory"
            );
            resolved.send(RefillResolved {
                actor: attempt.actor,
                result: Err(RefillFailure::ActorUnavailable {
                    actor: attempt.actor,
                }),
            });
            continue;
        };

        let request = RefillRequest {
            slot: attempt.slot,
            target: attempt.target,
            resource: attempt.resource,
        };
        let result = engine.attempt(&request, &mut *inventory, &mut *grid);
        match &result {
            Ok(outcome) => debug!(
                target: "brewery::refill",
                actor = ?attempt.actor,
                state = %outcome.state,
                world_transformed = outcome.world_transformed,
                "refill.succeeded"
            ),
            Err(failure) => debug!(
                target: "brewery::refill",
                actor = ?attempt.actor,
                reason = %failure,
                "refill.failed"
            ),
        }
        resolved.send(RefillResolved {
            actor: attempt.actor,
            result,
        });
    }
}
