mod common;

use std::sync::Arc;

use brew_sim::{
    build_headless_app, ensure_intoxication, run_turn, spawn_actor, ActiveEffects, BindOutcome,
    BreweryConfig, BreweryConfigHandle, CameraPulse, Dead, DrinkConsumed, EffectController,
    Intoxication, IntoxicationRecord, SetIntoxication, SleepState, TickDelta,
};
use bevy::prelude::{App, Entity};

fn ready_actor() -> (App, Entity) {
    common::ensure_test_config();
    let mut app = build_headless_app();
    let actor = spawn_actor(&mut app);
    run_turn(&mut app);
    (app, actor)
}

fn level(app: &App, actor: Entity) -> f32 {
    app.world
        .get::<Intoxication>(actor)
        .map(Intoxication::level)
        .expect("actor carries intoxication")
}

fn effects(app: &App, actor: Entity) -> Vec<String> {
    app.world
        .get::<ActiveEffects>(actor)
        .map(|effects| effects.active_effect_ids())
        .unwrap_or_default()
}

#[test]
fn ready_actor_starts_sober() {
    let (app, actor) = ready_actor();
    assert_eq!(level(&app, actor), 0.0);
    assert!(effects(&app, actor).is_empty());
}

#[test]
fn drink_raises_level_applies_tier_and_shakes_camera() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(DrinkConsumed {
        actor,
        item_id: "Brewery_Vodka_Mug".into(),
    });
    run_turn(&mut app);

    assert!((level(&app, actor) - 16.0).abs() < 1e-4);
    assert_eq!(effects(&app, actor), vec!["Brewery_Drink_Effect_Little_Drunk"]);
    let pulses = common::buffered_events::<CameraPulse>(&app);
    assert!(pulses
        .iter()
        .any(|pulse| pulse.actor == actor && pulse.intensity > 0.0));
}

#[test]
fn unknown_drink_changes_nothing() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(DrinkConsumed {
        actor,
        item_id: "Brewery_Mystery_Mug".into(),
    });
    run_turn(&mut app);
    assert_eq!(level(&app, actor), 0.0);
}

#[test]
fn level_decays_once_per_elapsed_second() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(SetIntoxication { actor, level: 1.0 });
    run_turn(&mut app);
    assert_eq!(effects(&app, actor), vec!["Brewery_Drink_Effect_Sober"]);

    app.world.insert_resource(TickDelta(1.1));
    run_turn(&mut app);

    let state = app.world.get::<Intoxication>(actor).expect("state");
    assert!((state.level() - 0.9).abs() < 1e-5);
    assert_eq!(state.decay_elapsed(), 0.0);
    // 0.9 is below every tier threshold.
    assert!(effects(&app, actor).is_empty());
}

#[test]
fn deep_sleep_sobers_and_cancels_the_pulse() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(SetIntoxication { actor, level: 55.0 });
    run_turn(&mut app);
    assert_eq!(effects(&app, actor), vec!["Brewery_Drink_Effect_Drunk"]);

    app.world.entity_mut(actor).insert(SleepState::Slumber);
    run_turn(&mut app);

    assert_eq!(level(&app, actor), 0.0);
    assert!(effects(&app, actor).is_empty());
    let last = common::buffered_events::<CameraPulse>(&app)
        .into_iter()
        .filter(|pulse| pulse.actor == actor)
        .last()
        .expect("cancel pulse sent");
    assert_eq!(last.intensity, 0.0);
}

#[test]
fn death_sobers_and_freezes_the_actor() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(SetIntoxication { actor, level: 80.0 });
    run_turn(&mut app);
    assert_eq!(effects(&app, actor), vec!["Brewery_Drink_Effect_Very_Drunk"]);

    app.world.entity_mut(actor).insert(Dead);
    run_turn(&mut app);
    assert_eq!(level(&app, actor), 0.0);
    assert!(effects(&app, actor).is_empty());

    app.world.send_event(DrinkConsumed {
        actor,
        item_id: "Brewery_Beer_Mug".into(),
    });
    run_turn(&mut app);
    assert_eq!(level(&app, actor), 0.0);
}

#[test]
fn rebind_keeps_level_and_zeroes_timers() {
    let (mut app, actor) = ready_actor();
    app.world.send_event(SetIntoxication { actor, level: 30.0 });
    for _ in 0..10 {
        run_turn(&mut app);
    }
    assert!(app.world.get::<Intoxication>(actor).expect("state").decay_elapsed() > 0.0);

    let outcome = ensure_intoxication(&mut app.world, actor).expect("actor exists");
    assert_eq!(outcome, BindOutcome::TimersReset);
    let state = app.world.get::<Intoxication>(actor).expect("state");
    assert_eq!(state.level(), 30.0);
    assert_eq!(state.decay_elapsed(), 0.0);
    assert_eq!(state.pulse_elapsed(), 0.0);
}

#[test]
fn persisted_record_restores_level_only() -> anyhow::Result<()> {
    let (mut app, actor) = ready_actor();
    app.world.send_event(SetIntoxication { actor, level: 42.5 });
    run_turn(&mut app);

    let record = app.world.get::<Intoxication>(actor).expect("state").to_record();
    let json = serde_json::to_string(&record)?;
    let restored = Intoxication::from_record(&serde_json::from_str::<IntoxicationRecord>(&json)?);

    assert_eq!(restored.level(), 42.5);
    assert_eq!(restored.decay_elapsed(), 0.0);
    assert_eq!(restored.pulse_elapsed(), 0.0);
    Ok(())
}

#[test]
fn replaced_config_retiers_on_the_next_turn() -> anyhow::Result<()> {
    let (mut app, actor) = ready_actor();
    let custom =
        BreweryConfig::from_json_str(r#"{"tiers":[{"threshold":5.0,"effect":"Custom_Tier"}]}"#)?;
    app.world
        .resource_mut::<BreweryConfigHandle>()
        .replace(Arc::new(custom));
    app.world.send_event(SetIntoxication { actor, level: 10.0 });
    run_turn(&mut app);

    assert_eq!(effects(&app, actor), vec!["Custom_Tier"]);
    Ok(())
}
