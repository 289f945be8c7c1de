//! Terrain queries consumed by the collision core.
//!
//! The terrain subsystem owns the world; collision only asks "what block is
//! here" and "how high is the ground". Smooth height is a separate capability
//! that some terrains provide and others don't.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Block types the collision core distinguishes between.
///
/// Air is represented by the absence of a block, never by a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Grass,
    Dirt,
    Stone,
    Sand,
    Snow,
    Wood,
    Leaves,
    Brick,
    Water,
    Lava,
}

impl BlockType {
    pub fn is_liquid(&self) -> bool {
        matches!(self, BlockType::Water | BlockType::Lava)
    }

    /// Blocks that stop a moving box
    pub fn is_solid(&self) -> bool {
        !self.is_liquid()
    }
}

/// Discrete block queries every terrain supports
pub trait VoxelTerrain {
    /// Block at integer cell (x, y, z), `None` for air or unloaded space
    fn block_type(&self, x: i32, y: i32, z: i32) -> Option<BlockType>;

    /// Discrete ground height of column (x, z)
    fn height(&self, x: i32, z: i32) -> i32;

    /// Smooth-height capability, if this terrain has one
    fn as_interpolated(&self) -> Option<&dyn InterpolatedTerrain> {
        None
    }
}

/// Terrains that can report a smooth, interpolated ground height
pub trait InterpolatedTerrain {
    fn interpolated_height(&self, x: f32, z: f32) -> Option<f32>;
}

/// Does cell (x, y, z) stop movement? Liquids and missing data do not.
pub fn is_solid_at<T: VoxelTerrain + ?Sized>(terrain: &T, x: i32, y: i32, z: i32) -> bool {
    terrain.block_type(x, y, z).is_some_and(|block| block.is_solid())
}

/// Ground height for non-physics callers (spawn placement, projectiles).
///
/// Prefers the terrain's smooth height and falls back to the discrete column
/// height when the capability is missing or has no data at (x, z).
pub fn ground_height<T: VoxelTerrain + ?Sized>(world_x: f32, world_z: f32, terrain: &T) -> f32 {
    if let Some(height) = terrain
        .as_interpolated()
        .and_then(|smooth| smooth.interpolated_height(world_x, world_z))
    {
        return height;
    }
    terrain.height(world_x.floor() as i32, world_z.floor() as i32) as f32
}

/// Terrain with nothing loaded yet: every cell is air
#[derive(Debug, Clone, Copy, Default)]
pub struct UnloadedTerrain;

impl VoxelTerrain for UnloadedTerrain {
    fn block_type(&self, _x: i32, _y: i32, _z: i32) -> Option<BlockType> {
        None
    }

    fn height(&self, _x: i32, _z: i32) -> i32 {
        0
    }
}

/// In-memory block store for tools, tests and the demo world.
///
/// Each column keeps the sorted heights of its solid blocks, so column heights
/// stay current in O(log n) as blocks are set and cleared.
#[derive(Resource, Debug, Clone, Default)]
pub struct SparseVoxelTerrain {
    blocks: HashMap<IVec3, BlockType>,
    solid_columns: HashMap<IVec2, BTreeSet<i32>>,
}

impl SparseVoxelTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block(&mut self, cell: IVec3, block: BlockType) {
        let previous = self.blocks.insert(cell, block);
        if block.is_solid() {
            self.solid_columns
                .entry(IVec2::new(cell.x, cell.z))
                .or_default()
                .insert(cell.y);
        } else if previous.is_some_and(|b| b.is_solid()) {
            self.forget_solid(cell);
        }
    }

    pub fn clear_block(&mut self, cell: IVec3) -> Option<BlockType> {
        let removed = self.blocks.remove(&cell)?;
        if removed.is_solid() {
            self.forget_solid(cell);
        }
        Some(removed)
    }

    fn forget_solid(&mut self, cell: IVec3) {
        let column = IVec2::new(cell.x, cell.z);
        if let Some(heights) = self.solid_columns.get_mut(&column) {
            heights.remove(&cell.y);
            if heights.is_empty() {
                self.solid_columns.remove(&column);
            }
        }
    }

    /// Fill every cell in the inclusive box `min..=max`
    pub fn fill(&mut self, min: IVec3, max: IVec3, block: BlockType) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_block(IVec3::new(x, y, z), block);
                }
            }
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl VoxelTerrain for SparseVoxelTerrain {
    fn block_type(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        self.blocks.get(&IVec3::new(x, y, z)).copied()
    }

    fn height(&self, x: i32, z: i32) -> i32 {
        self.solid_columns
            .get(&IVec2::new(x, z))
            .and_then(|heights| heights.last())
            .map_or(0, |top| top + 1)
    }
}
