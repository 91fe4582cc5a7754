use std::io::{self, BufRead};
use std::thread;

use bevy::app::Update;
use bevy::math::IVec3;
use bevy::prelude::{App, Entity, EventReader};
use brew_runtime::{parse_command_line, CommandPayload, ResourceToken, SleepDirective};
use crossbeam_channel::{unbounded, Receiver};
use tracing::{info, warn};

use brew_sim::{
    build_headless_app, run_turn, spawn_actor, ActiveEffects, ActorReady, BlockId, CameraPulse,
    Dead, DrinkConsumed, EffectController, Intoxication, Inventory, ItemCatalogHandle,
    RefillAttempt, RefillResolved, RefillResource, SetIntoxication, SimulationTick, SleepState,
    SlotTransactions, TickDelta, TileGrid,
};

const DEMO_WELL: IVec3 = IVec3::new(0, 64, 0);
const DEMO_KEG: IVec3 = IVec3::new(1, 64, 0);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut app = build_headless_app();
    app.add_systems(Update, report_events);

    let actor = seed_demo_world(&mut app);
    let command_rx = spawn_stdin_listener();

    info!(
        target: "brewery::console",
        actor = actor.to_bits(),
        "brewery console ready"
    );

    while let Ok(line) = command_rx.recv() {
        match parse_command_line(&line) {
            Ok(command) => apply_command(&mut app, command),
            Err(err) => warn!(target: "brewery::console", error = %err, "command.rejected"),
        }
    }
}

fn spawn_stdin_listener() -> Receiver<String> {
    let (sender, receiver) = unbounded::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

/// One actor holding empty mugs, next to a well and a beer keg.
fn seed_demo_world(app: &mut App) -> Entity {
    let actor = spawn_actor(app);
    let mugs = app
        .world
        .resource::<ItemCatalogHandle>()
        .get()
        .stack("Brewery_Mug_Empty", 4);
    if let Some(mut inventory) = app.world.get_mut::<Inventory>(actor) {
        inventory.set_slot(0, mugs);
    }

    {
        let mut grid = app.world.resource_mut::<TileGrid>();
        grid.place_block(DEMO_WELL, BlockId::new("Brewery_Water_Well"));
        grid.place_block(DEMO_KEG, BlockId::new("Brewery_Beer_Keg_Full"));
    }

    run_turn(app);
    actor
}

fn apply_command(app: &mut App, command: CommandPayload) {
    let actor = match command.actor_bits() {
        Some(bits) => match resolve_actor(app, bits) {
            Some(actor) => Some(actor),
            None => {
                warn!(target: "brewery::console", actor = bits, "command.unknown_actor");
                return;
            }
        },
        None => None,
    };

    match (command, actor) {
        (CommandPayload::Tick { steps, delta }, _) => {
            if let Some(delta) = delta {
                app.world.insert_resource(TickDelta(delta));
            }
            for _ in 0..steps {
                run_turn(app);
            }
            let tick = app.world.resource::<SimulationTick>().0;
            info!(target: "brewery::console", steps, tick, "command.applied=tick");
        }
        (CommandPayload::SetLevel { level, .. }, Some(actor)) => {
            app.world.send_event(SetIntoxication { actor, level });
            info!(target: "brewery::console", intoxication = level, "command.queued=drunk");
        }
        (CommandPayload::Drink { item_id, .. }, Some(actor)) => {
            info!(target: "brewery::console", item = %item_id, "command.queued=drink");
            app.world.send_event(DrinkConsumed { actor, item_id });
        }
        (CommandPayload::Sleep { directive, .. }, Some(actor)) => {
            let state = match directive {
                SleepDirective::Awake => SleepState::Awake,
                SleepDirective::Slumber => SleepState::Slumber,
            };
            app.world.entity_mut(actor).insert(state);
            info!(target: "brewery::console", state = ?state, "command.applied=sleep");
        }
        (CommandPayload::Ready { .. }, Some(actor)) => {
            app.world.send_event(ActorReady { actor });
            info!(target: "brewery::console", "command.queued=ready");
        }
        (CommandPayload::Kill { .. }, Some(actor)) => {
            app.world.entity_mut(actor).insert(Dead);
            info!(target: "brewery::console", "command.applied=kill");
        }
        (
            CommandPayload::Refill {
                slot,
                position,
                resource,
                ..
            },
            Some(actor),
        ) => {
            let resource = match resource {
                ResourceToken::Block => RefillResource::Block,
                ResourceToken::Fluid => RefillResource::Fluid,
            };
            app.world.send_event(RefillAttempt {
                actor,
                slot: slot as usize,
                target: IVec3::from_array(position),
                resource,
            });
            info!(target: "brewery::console", slot, "command.queued=refill");
        }
        (CommandPayload::Status { .. }, Some(actor)) => print_status(app, actor),
        (command, None) => {
            warn!(target: "brewery::console", command = ?command, "command.missing_actor");
        }
    }
}

fn resolve_actor(app: &App, bits: u64) -> Option<Entity> {
    let entity = Entity::try_from_bits(bits).ok()?;
    app.world.get_entity(entity).map(|_| entity)
}

fn print_status(app: &App, actor: Entity) {
    let level = app.world.get::<Intoxication>(actor).map(Intoxication::level);
    let effects = app
        .world
        .get::<ActiveEffects>(actor)
        .map(|effects| effects.active_effect_ids())
        .unwrap_or_default();
    let held: Vec<String> = app
        .world
        .get::<Inventory>(actor)
        .map(|inventory| {
            inventory
                .stacks()
                .map(|(slot, stack)| {
                    format!(
                        "{slot}:{}x{}@{:.1}",
                        stack.item_id, stack.quantity, stack.durability
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    info!(
        target: "brewery::console",
        actor = actor.to_bits(),
        intoxication = ?level,
        effects = ?effects,
        inventory = ?held,
        dead = app.world.get::<Dead>(actor).is_some(),
        "status"
    );
}

fn report_events(mut pulses: EventReader<CameraPulse>, mut refills: EventReader<RefillResolved>) {
    for pulse in pulses.read() {
        info!(
            target: "brewery::console",
            actor = pulse.actor.to_bits(),
            intensity = pulse.intensity,
            "camera.pulse"
        );
    }
    for refill in refills.read() {
        match &refill.result {
            Ok(outcome) => info!(
                target: "brewery::console",
                actor = refill.actor.to_bits(),
                state = %outcome.state,
                item = ?outcome.item,
                world_transformed = outcome.world_transformed,
                "refill.ok"
            ),
            Err(failure) => info!(
                target: "brewery::console",
                actor = refill.actor.to_bits(),
                reason = %failure,
                "refill.failed"
            ),
        }
    }
}
