#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use bevy::prelude::{App, Event, Events};

static INIT: Once = Once::new();

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        for (key, file) in [
            ("BREWERY_CONFIG_PATH", "test_brewery_config.json"),
            ("BREWERY_REFILL_STATES_PATH", "test_refill_states.json"),
            ("BREWERY_ITEM_CATALOG_PATH", "test_item_catalog.json"),
        ] {
            let path = fixture(file);
            debug_assert!(path.exists(), "missing test fixture at {}", path.display());
            std::env::set_var(key, &path);
        }
    });
}

/// Every event of type `E` still buffered in the app.
pub fn buffered_events<E: Event + Clone>(app: &App) -> Vec<E> {
    let events = app.world.resource::<Events<E>>();
    let mut reader = events.get_reader();
    reader.read(events).cloned().collect()
}
