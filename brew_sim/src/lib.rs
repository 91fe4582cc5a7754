//! Core simulation crate for the brewery prototype.
//!
//! Tracks per-actor intoxication (decay, tiers, camera pulses) and resolves container
//! refills against the tile grid. Every turn runs once when [`run_turn`] is invoked.

pub mod binding;
mod components;
pub mod config;
pub mod decay;
mod effects;
mod intoxication;
pub mod inventory;
pub mod items;
pub mod placement;
pub mod refill;
pub mod refill_config;
pub mod tiles;

use bevy::prelude::*;

pub use binding::{ensure_intoxication, ActorReady, BindError, BindOutcome};
pub use components::{Dead, Invulnerable, SimulationTick, SleepState, TickDelta};
pub use config::{load_brewery_config_from_env, BreweryConfig, BreweryConfigHandle};
pub use decay::{CameraPulse, DecayEngine, DecayEngineHandle, DrinkConsumed, SetIntoxication};
pub use effects::{ActiveEffect, ActiveEffects, EffectController};
pub use intoxication::{Intoxication, IntoxicationRecord, Tier, TierTable, MAX_LEVEL};
pub use inventory::{DroppedItem, Inventory, ItemStack, SlotTransactions};
pub use items::{load_item_catalog_from_env, ItemCatalog, ItemCatalogHandle, ItemVariants};
pub use placement::{BlockPlacementRequest, BlockPlacementVerdict, PlacementVerdict};
pub use refill::{
    RefillAttempt, RefillEngine, RefillFailure, RefillOutcome, RefillRequest, RefillResolved,
    RefillResource,
};
pub use refill_config::{load_refill_table_from_env, RefillTable, RefillTableHandle};
pub use tiles::{BlockId, FluidId, TileChanged, TileGrid, TileStorage};

/// Hotbar size given to actors spawned through [`spawn_actor`].
pub const DEFAULT_HOTBAR_SLOTS: usize = 9;
pub const DEFAULT_STORAGE_SLOTS: usize = 27;

/// Construct a Bevy [`App`] configured with the brewery tick pipeline.
pub fn build_headless_app() -> App {
    let mut app = App::new();

    let (config, _) = load_brewery_config_from_env();
    let engine = DecayEngineHandle::from_config(&config);

    app.insert_resource(BreweryConfigHandle::new(config))
        .insert_resource(engine)
        .insert_resource(RefillTableHandle::new(load_refill_table_from_env()))
        .insert_resource(ItemCatalogHandle::new(load_item_catalog_from_env()))
        .insert_resource(TickDelta::default())
        .insert_resource(SimulationTick::default())
        .insert_resource(TileGrid::default())
        .add_plugins(MinimalPlugins)
        .add_event::<ActorReady>()
        .add_event::<CameraPulse>()
        .add_event::<DrinkConsumed>()
        .add_event::<SetIntoxication>()
        .add_event::<RefillAttempt>()
        .add_event::<RefillResolved>()
        .add_event::<BlockPlacementRequest>()
        .add_event::<BlockPlacementVerdict>()
        .add_event::<TileChanged>()
        .add_systems(
            Update,
            (
                binding::bind_ready_actors,
                decay::refresh_decay_engine,
                decay::apply_intoxication_overrides,
                decay::consume_drinks,
                decay::sober_on_death,
                decay::sober_up,
                refill::resolve_refill_attempts,
                placement::guard_block_placement,
                inventory::spawn_dropped_items,
                tiles::publish_tile_updates,
                components::advance_tick,
            )
                .chain(),
        );

    app
}

/// Execute a single simulation tick.
///
/// Each call processes the chained systems configured in [`build_headless_app`]
/// (binding → overrides → drinks → death → decay → refills → placement → world updates).
pub fn run_turn(app: &mut App) {
    app.update();
}

/// Spawn an actor with an empty inventory and effect holder, and announce it as ready.
///
/// The intoxication state is attached on the next turn.
pub fn spawn_actor(app: &mut App) -> Entity {
    let actor = app
        .world
        .spawn((
            Inventory::new(DEFAULT_HOTBAR_SLOTS, DEFAULT_STORAGE_SLOTS),
            ActiveEffects::default(),
            SleepState::default(),
        ))
        .id();
    app.world.send_event(ActorReady { actor });
    actor
}
