use std::collections::{HashMap, HashSet};
use std::fmt;

use bevy::{math::IVec3, prelude::*};
use serde::{Deserialize, Serialize};

/// Fluid level written when a tile is filled by a transform.
pub const FULL_FLUID_LEVEL: u8 = 8;

/// Block type identity as registered with the host's asset map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fluid type identity as registered with the host's asset map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FluidId(pub String);

impl FluidId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FluidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host block storage as seen by the refill engine.
///
/// Writes are individually atomic and report whether they were accepted.
pub trait TileStorage {
    fn block_at(&self, position: IVec3) -> Option<BlockId>;
    fn fluid_at(&self, position: IVec3) -> Option<FluidId>;
    fn set_block(&mut self, position: IVec3, block: &BlockId) -> bool;
    fn set_fluid(&mut self, position: IVec3, fluid: &FluidId) -> bool;
    fn notify_block_changed(&mut self, position: IVec3);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileContents {
    pub block: Option<BlockId>,
    pub fluid: Option<(FluidId, u8)>,
}

/// Sparse tile store with write protection and a queue of changed positions.
#[derive(Resource, Debug, Clone, Default)]
pub struct TileGrid {
    tiles: HashMap<IVec3, TileContents>,
    protected: HashSet<IVec3>,
    pending_updates: Vec<IVec3>,
}

impl TileGrid {
    pub fn place_block(&mut self, position: IVec3, block: BlockId) {
        self.tiles.entry(position).or_default().block = Some(block);
    }

    pub fn place_fluid(&mut self, position: IVec3, fluid: FluidId, level: u8) {
        self.tiles.entry(position).or_default().fluid = Some((fluid, level));
    }

    pub fn contents(&self, position: IVec3) -> Option<&TileContents> {
        self.tiles.get(&position)
    }

    /// Reject every write to `position`, as if another interaction held it.
    pub fn protect(&mut self, position: IVec3) {
        self.protected.insert(position);
    }

    pub fn unprotect(&mut self, position: IVec3) {
        self.protected.remove(&position);
    }

    pub fn drain_updates(&mut self) -> Vec<IVec3> {
        std::mem::take(&mut self.pending_updates)
    }

    pub fn pending_updates(&self) -> &[IVec3] {
        &self.pending_updates
    }
}

impl TileStorage for TileGrid {
    fn block_at(&self, position: IVec3) -> Option<BlockId> {
        self.tiles.get(&position).and_then(|tile| tile.block.clone())
    }

    fn fluid_at(&self, position: IVec3) -> Option<FluidId> {
        self.tiles
            .get(&position)
            .and_then(|tile| tile.fluid.as_ref().map(|(fluid, _)| fluid.clone()))
    }

    fn set_block(&mut self, position: IVec3, block: &BlockId) -> bool {
        if self.protected.contains(&position) {
            return false;
        }
        self.place_block(position, block.clone());
        true
    }

    fn set_fluid(&mut self, position: IVec3, fluid: &FluidId) -> bool {
        if self.protected.contains(&position) {
            return false;
        }
        self.place_fluid(position, fluid.clone(), FULL_FLUID_LEVEL);
        true
    }

    fn notify_block_changed(&mut self, position: IVec3) {
        if !self.pending_updates.contains(&position) {
            self.pending_updates.push(position);
        }
    }
}

/// A tile changed and downstream lighting/physics should recompute.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChanged {
    pub position: IVec3,
}

/// Publish queued tile changes as events.
pub fn publish_tile_updates(mut grid: ResMut<TileGrid>, mut changes: EventWriter<TileChanged>) {
    if grid.pending_updates().is_empty() {
        return;
    }
    for position in grid.drain_updates() {
        changes.send(TileChanged { position });
    }
}
