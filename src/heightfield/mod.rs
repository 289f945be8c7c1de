//! Heightfield Collision Provider
//!
//! World-space queries over the per-chunk heightmap cache:
//! - World → chunk + local coordinate conversion
//! - Heightfield vs voxel column classification (point or whole footprint)
//! - Bilinear ground height
//! - Forward slope probing and the steepness rule
//!
//! Missing chunks, heightmaps and masks are never errors: a column with no
//! mask is heightfield ground, and a point with no heightmap has no height.

pub mod cache;

use bevy::prelude::*;

pub use cache::{ChunkCache, ChunkColumns, ChunkDataError};

use crate::aabb::Aabb;
use crate::config::CollisionConfig;
use crate::constants::{
    CHUNK_SIZE, FOOTPRINT_INFLATION, HEIGHTMAP_STRIDE, LOCAL_COORD_EPSILON, MAX_WALKABLE_SLOPE,
    MIN_DIRECTION_LENGTH, SLOPE_PROBE_DISTANCE,
};

/// A world position split into its chunk and the offset inside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkCoords {
    pub chunk: IVec2,
    /// Fractional offset from the chunk's minimum corner, nominally in [0, N)
    pub local: Vec2,
}

/// Read-side view of the heightfield chunk cache used by collision
#[derive(Debug, Clone)]
pub struct HeightfieldProvider {
    cache: ChunkCache,
    max_walkable_slope: f32,
    slope_probe_distance: f32,
    footprint_inflation: f32,
}

impl HeightfieldProvider {
    pub fn new(cache: ChunkCache) -> Self {
        Self {
            cache,
            max_walkable_slope: MAX_WALKABLE_SLOPE,
            slope_probe_distance: SLOPE_PROBE_DISTANCE,
            footprint_inflation: FOOTPRINT_INFLATION,
        }
    }

    pub fn with_config(cache: ChunkCache, config: &CollisionConfig) -> Self {
        let mut provider = Self::new(cache);
        provider.apply_config(config);
        provider
    }

    /// Pick up new slope and footprint tuning
    pub fn apply_config(&mut self, config: &CollisionConfig) {
        self.max_walkable_slope = config.max_walkable_slope;
        self.slope_probe_distance = config.slope_probe_distance;
        self.footprint_inflation = config.footprint_inflation;
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Between-frame writes (streaming, destruction)
    pub fn cache_mut(&mut self) -> &mut ChunkCache {
        &mut self.cache
    }

    pub fn get_chunk_coords(&self, world_x: f32, world_z: f32) -> ChunkCoords {
        let size = CHUNK_SIZE as f32;
        let chunk_x = (world_x / size).floor() as i32;
        let chunk_z = (world_z / size).floor() as i32;
        ChunkCoords {
            chunk: IVec2::new(chunk_x, chunk_z),
            local: Vec2::new(
                world_x - chunk_x as f32 * size,
                world_z - chunk_z as f32 * size,
            ),
        }
    }

    /// Is the single column under (x, z) heightfield ground?
    fn column_is_heightfield(&self, world_x: f32, world_z: f32) -> bool {
        if !world_x.is_finite() || !world_z.is_finite() {
            return true;
        }
        let coords = self.get_chunk_coords(world_x, world_z);
        let Some(columns) = self.cache.get(coords.chunk) else {
            return true;
        };
        let cell_x = local_cell(coords.local.x);
        let cell_z = local_cell(coords.local.y);
        match columns.is_voxel_cell(cell_x, cell_z) {
            Some(voxel) => !voxel,
            None => true,
        }
    }

    /// Should collision at (x, z) use the heightfield?
    ///
    /// With an AABB, the point and all four (inflated) footprint corners must
    /// be over heightfield columns; one voxel column anywhere under the
    /// footprint sends the whole entity to the voxel path.
    pub fn should_use_heightfield(&self, world_x: f32, world_z: f32, aabb: Option<&Aabb>) -> bool {
        if !self.column_is_heightfield(world_x, world_z) {
            return false;
        }
        match aabb {
            Some(aabb) => aabb
                .footprint_corners(self.footprint_inflation)
                .iter()
                .all(|corner| self.column_is_heightfield(corner.x, corner.y)),
            None => true,
        }
    }

    /// Bilinearly interpolated ground height, `None` without chunk data
    pub fn get_interpolated_height(&self, world_x: f32, world_z: f32) -> Option<f32> {
        if !world_x.is_finite() || !world_z.is_finite() {
            return None;
        }
        let coords = self.get_chunk_coords(world_x, world_z);
        let heightmap = self.cache.get(coords.chunk)?.heightmap()?;

        let max_local = CHUNK_SIZE as f32 - LOCAL_COORD_EPSILON;
        let lx = coords.local.x.clamp(0.0, max_local);
        let lz = coords.local.y.clamp(0.0, max_local);

        let x0 = lx.floor() as usize;
        let z0 = lz.floor() as usize;
        let fx = lx - x0 as f32;
        let fz = lz - z0 as f32;

        let h00 = heightmap[z0 * HEIGHTMAP_STRIDE + x0];
        let h10 = heightmap[z0 * HEIGHTMAP_STRIDE + x0 + 1];
        let h01 = heightmap[(z0 + 1) * HEIGHTMAP_STRIDE + x0];
        let h11 = heightmap[(z0 + 1) * HEIGHTMAP_STRIDE + x0 + 1];

        let h0 = h00 + fx * (h10 - h00);
        let h1 = h01 + fx * (h11 - h01);
        Some(h0 + fz * (h1 - h0))
    }

    /// Rise over run along (dir_x, dir_z), probed a short distance ahead.
    /// Zero for a degenerate direction or missing height data.
    pub fn get_slope_in_direction(&self, world_x: f32, world_z: f32, dir_x: f32, dir_z: f32) -> f32 {
        let length = (dir_x * dir_x + dir_z * dir_z).sqrt();
        if !(length > MIN_DIRECTION_LENGTH) {
            return 0.0;
        }
        let probe = self.slope_probe_distance;
        let ahead_x = world_x + dir_x / length * probe;
        let ahead_z = world_z + dir_z / length * probe;

        match (
            self.get_interpolated_height(world_x, world_z),
            self.get_interpolated_height(ahead_x, ahead_z),
        ) {
            (Some(here), Some(ahead)) => (ahead - here) / probe,
            _ => 0.0,
        }
    }

    /// Uphill slopes steeper than the walkable limit block movement
    pub fn is_slope_too_steep(&self, slope: f32) -> bool {
        slope > self.max_walkable_slope
    }
}

/// Mask cell index for a local coordinate, clamped into the chunk
fn local_cell(local: f32) -> usize {
    (local.floor().max(0.0) as usize).min(CHUNK_SIZE - 1)
}
