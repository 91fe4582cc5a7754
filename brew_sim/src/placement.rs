use bevy::{math::IVec3, prelude::*};
use tracing::debug;

use crate::inventory::ItemStack;
use crate::items::{ItemCatalog, ItemCatalogHandle};

const TELEPORTER_ITEM_IDS: [&str; 3] = ["hytale:teleporter", "hytale:portal_frame", "hytale:warp_stone"];
const TELEPORTER_KEYWORDS: [&str; 4] = ["teleporter", "portal", "warp", "fasttravel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementVerdict {
    Allow,
    /// A half-drunk mug would lose its remaining contents once placed.
    CancelPartiallyConsumed,
}

impl PlacementVerdict {
    pub fn is_cancelled(self) -> bool {
        !matches!(self, PlacementVerdict::Allow)
    }
}

pub fn is_teleporter_item(item_id: &str) -> bool {
    if TELEPORTER_ITEM_IDS.contains(&item_id) {
        return true;
    }
    let lowered = item_id.to_lowercase();
    TELEPORTER_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

pub fn has_brewery_tag(catalog: &ItemCatalog, item_id: &str) -> bool {
    catalog
        .tag_values(item_id)
        .any(|value| value.starts_with("Brewery"))
}

pub fn placement_verdict(stack: &ItemStack, catalog: &ItemCatalog) -> PlacementVerdict {
    if is_teleporter_item(&stack.item_id) || !has_brewery_tag(catalog, &stack.item_id) {
        return PlacementVerdict::Allow;
    }
    if catalog.has_tag(&stack.item_id, "Type", "Brewery_Drink") && stack.is_partially_consumed() {
        return PlacementVerdict::CancelPartiallyConsumed;
    }
    PlacementVerdict::Allow
}

/// An actor tries to place the item it holds as a block.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct BlockPlacementRequest {
    pub actor: Entity,
    pub position: IVec3,
    pub held: ItemStack,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlacementVerdict {
    pub actor: Entity,
    pub position: IVec3,
    pub verdict: PlacementVerdict,
}

pub fn guard_block_placement(
    mut requests: EventReader<BlockPlacementRequest>,
    mut verdicts: EventWriter<BlockPlacementVerdict>,
    catalog: Res<ItemCatalogHandle>,
) {
    for request in requests.read() {
        let verdict = placement_verdict(&request.held, &catalog.0);
        if verdict.is_cancelled() {
            debug!(
                target: "brewery::refill",
                actor = ?request.actor,
                item = %request.held.item_id,
                durability = request.held.durability,
                "placement.cancelled"
            );
        }
        verdicts.send(BlockPlacementVerdict {
            actor: request.actor,
            position: request.position,
            verdict,
        });
    }
}
