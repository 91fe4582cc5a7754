mod common;

use bevy::prelude::{App, Entity, IVec3};
use brew_sim::inventory::DroppedItem;
use brew_sim::placement::PlacementVerdict;
use brew_sim::refill::{ItemChange, ProducedPlacement};
use brew_sim::{
    build_headless_app, run_turn, spawn_actor, BlockId, BlockPlacementRequest,
    BlockPlacementVerdict, FluidId, Inventory, ItemCatalogHandle, ItemStack, RefillAttempt,
    RefillFailure, RefillResolved, RefillResource, RefillTableHandle, SlotTransactions,
    TileChanged, TileGrid, TileStorage,
};

const WELL: IVec3 = IVec3::new(4, 70, -2);
const KEG: IVec3 = IVec3::new(5, 70, -2);
const POND: IVec3 = IVec3::new(6, 69, -2);

fn setup(inventory: Inventory) -> (App, Entity) {
    common::ensure_test_config();
    let mut app = build_headless_app();
    let actor = spawn_actor(&mut app);
    app.world.entity_mut(actor).insert(inventory);
    {
        let mut grid = app.world.resource_mut::<TileGrid>();
        grid.place_block(WELL, BlockId::new("Test_Well"));
        grid.place_block(KEG, BlockId::new("Test_Keg_Full"));
        grid.place_fluid(POND, FluidId::new("Water_Source"), 8);
    }
    run_turn(&mut app);
    (app, actor)
}

fn empty_mugs(app: &App, quantity: u32) -> ItemStack {
    app.world
        .resource::<ItemCatalogHandle>()
        .get()
        .stack("Test_Mug_Empty", quantity)
}

fn refill(app: &mut App, actor: Entity, target: IVec3, resource: RefillResource) -> RefillResolved {
    app.world.send_event(RefillAttempt {
        actor,
        slot: 0,
        target,
        resource,
    });
    run_turn(app);
    common::buffered_events::<RefillResolved>(app)
        .into_iter()
        .filter(|resolved| resolved.actor == actor)
        .last()
        .expect("attempt resolved")
}

fn slot(app: &App, actor: Entity, index: usize) -> Option<ItemStack> {
    app.world
        .get::<Inventory>(actor)
        .and_then(|inventory| inventory.slot(index).cloned())
}

#[test]
fn empty_mug_fills_at_the_well() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 1);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    let resolved = refill(&mut app, actor, WELL, RefillResource::Block);
    let outcome = resolved.result.expect("refill succeeds");

    assert_eq!(outcome.state, "Water");
    assert!(!outcome.world_transformed);
    let held = slot(&app, actor, 0).expect("filled mug");
    assert_eq!(held.item_id, "Test_Water_Mug");
    assert_eq!(held.durability, 10.0);
    assert_eq!(
        app.world.resource::<TileGrid>().block_at(WELL),
        Some(BlockId::new("Test_Well"))
    );
}

#[test]
fn half_full_mug_is_topped_up() {
    let half = ItemStack::new("Test_Water_Mug", 1, 10.0).with_durability(5.0);
    let (mut app, actor) = setup(Inventory::new(9, 0).with_item(0, half));

    let outcome = refill(&mut app, actor, WELL, RefillResource::Block)
        .result
        .expect("top-up succeeds");

    assert_eq!(
        outcome.item,
        ItemChange::ToppedUp {
            item_id: "Test_Water_Mug".into(),
            durability: 10.0
        }
    );
    assert_eq!(slot(&app, actor, 0).map(|s| s.durability), Some(10.0));
}

#[test]
fn keg_refill_from_a_stack_empties_the_keg() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 3);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    let outcome = refill(&mut app, actor, KEG, RefillResource::Block)
        .result
        .expect("keg refill succeeds");

    assert_eq!(
        outcome.item,
        ItemChange::Swapped {
            consumed: "Test_Mug_Empty".into(),
            produced: "Brewery_Beer_Mug".into(),
            placement: ProducedPlacement::Inventory(1),
        }
    );
    assert!(outcome.world_transformed);
    assert_eq!(slot(&app, actor, 0).map(|s| s.quantity), Some(2));
    let beer = slot(&app, actor, 1).expect("beer stored");
    assert_eq!(beer.durability, 4.0);
    assert_eq!(
        app.world.resource::<TileGrid>().block_at(KEG),
        Some(BlockId::new("Test_Keg_Empty"))
    );
    assert!(common::buffered_events::<TileChanged>(&app)
        .iter()
        .any(|change| change.position == KEG));

    // The keg is spent: a second attempt is rejected without touching the mugs.
    let failure = refill(&mut app, actor, KEG, RefillResource::Block)
        .result
        .expect_err("empty keg is not a source");
    assert_eq!(
        failure,
        RefillFailure::TileNotAllowed {
            id: "Test_Keg_Empty".into()
        }
    );
    assert_eq!(slot(&app, actor, 0).map(|s| s.quantity), Some(2));
}

#[test]
fn overflow_is_dropped_into_the_world() {
    let (mut app, actor) = setup(Inventory::new(1, 0));
    let mugs = empty_mugs(&app, 2);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    let outcome = refill(&mut app, actor, WELL, RefillResource::Block)
        .result
        .expect("refill succeeds");
    assert!(matches!(
        outcome.item,
        ItemChange::Swapped {
            placement: ProducedPlacement::Dropped,
            ..
        }
    ));

    let mut dropped = app.world.query::<&DroppedItem>();
    let items: Vec<_> = dropped.iter(&app.world).collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].owner, actor);
    assert_eq!(items[0].stack.item_id, "Test_Water_Mug");
}

#[test]
fn repeated_refills_from_a_stack_share_one_slot() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 3);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    for _ in 0..2 {
        let outcome = refill(&mut app, actor, WELL, RefillResource::Block)
            .result
            .expect("refill succeeds");
        assert!(matches!(
            outcome.item,
            ItemChange::Swapped {
                placement: ProducedPlacement::Inventory(1),
                ..
            }
        ));
    }

    assert_eq!(slot(&app, actor, 0).map(|s| s.quantity), Some(1));
    let filled = slot(&app, actor, 1).expect("filled mugs");
    assert_eq!(filled.item_id, "Test_Water_Mug");
    assert_eq!(filled.quantity, 2);
    assert!(slot(&app, actor, 2).is_none());
}

#[test]
fn attempt_without_inventory_is_answered() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    app.world.entity_mut(actor).remove::<Inventory>();

    let failure = refill(&mut app, actor, WELL, RefillResource::Block)
        .result
        .expect_err("no inventory to refill from");
    assert_eq!(failure, RefillFailure::ActorUnavailable { actor });
    assert_eq!(
        common::buffered_events::<RefillResolved>(&app)
            .iter()
            .filter(|resolved| resolved.actor == actor)
            .count(),
        1
    );
}

#[test]
fn protected_keg_fails_after_the_mug_is_filled() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 1);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);
    app.world.resource_mut::<TileGrid>().protect(KEG);

    let failure = refill(&mut app, actor, KEG, RefillResource::Block)
        .result
        .expect_err("keg write rejected");

    assert!(matches!(failure, RefillFailure::WorldWriteConflict { .. }));
    assert_eq!(
        slot(&app, actor, 0).map(|s| s.item_id),
        Some("Brewery_Beer_Mug".to_string())
    );
    assert_eq!(
        app.world.resource::<TileGrid>().block_at(KEG),
        Some(BlockId::new("Test_Keg_Full"))
    );
}

#[test]
fn fluid_source_fills_when_enabled() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 1);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    let outcome = refill(&mut app, actor, POND, RefillResource::Fluid)
        .result
        .expect("fluid refill succeeds");
    assert_eq!(outcome.state, "Water");
    assert_eq!(
        slot(&app, actor, 0).map(|s| s.item_id),
        Some("Test_Water_Mug".to_string())
    );
}

#[test]
fn reloaded_table_takes_effect_next_turn() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let mugs = empty_mugs(&app, 1);
    app.world
        .get_mut::<Inventory>(actor)
        .expect("inventory")
        .set_slot(0, mugs);

    let replacement = brew_sim::RefillTable::from_json_str(
        r#"{"states": {"Beer": {"allowed_blocks": ["Test_Well"]}}}"#,
    )
    .expect("replacement compiles");
    app.world
        .resource_mut::<RefillTableHandle>()
        .replace(std::sync::Arc::new(replacement));

    let outcome = refill(&mut app, actor, WELL, RefillResource::Block)
        .result
        .expect("well now pours beer");
    assert_eq!(outcome.state, "Beer");
}

#[test]
fn half_drunk_beer_cannot_be_placed() {
    let (mut app, actor) = setup(Inventory::new(9, 0));
    let half = ItemStack::new("Brewery_Beer_Mug", 1, 4.0).with_durability(1.0);
    app.world.send_event(BlockPlacementRequest {
        actor,
        position: IVec3::new(0, 65, 0),
        held: half,
    });
    app.world.send_event(BlockPlacementRequest {
        actor,
        position: IVec3::new(1, 65, 0),
        held: ItemStack::new("Brewery_Beer_Mug", 1, 4.0),
    });
    run_turn(&mut app);

    let verdicts: Vec<PlacementVerdict> = common::buffered_events::<BlockPlacementVerdict>(&app)
        .into_iter()
        .map(|verdict| verdict.verdict)
        .collect();
    assert_eq!(
        verdicts,
        vec![
            PlacementVerdict::CancelPartiallyConsumed,
            PlacementVerdict::Allow
        ]
    );
}
