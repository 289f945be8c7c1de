//! Hybrid Terrain Collision
//!
//! One entry point per entity per frame. The dispatcher looks at the entity's
//! whole footprint and hands the frame to exactly one resolver:
//! - `heightfield`: smooth ground, slope blocking, boundary fallback
//! - `voxel`: swept AABB against block occupancy plus a ground probe
//!
//! With no heightfield provider registered every entity takes the voxel path.

pub mod heightfield;
pub mod sweep;
pub mod voxel;

use bevy::prelude::*;

pub use heightfield::resolve_heightfield;
pub use sweep::{sweep, Axis, ContactInfo, SweepResult};
pub use voxel::{probe_ground, resolve_voxel};

use crate::body::{CollisionResult, PhysicsBody};
use crate::config::CollisionConfig;
use crate::heightfield::{ChunkCache, HeightfieldProvider};
use crate::terrain::VoxelTerrain;

/// Owns the collision tuning and the (optional) heightfield provider
#[derive(Resource, Debug, Default)]
pub struct CollisionSystem {
    config: CollisionConfig,
    heightfield: Option<HeightfieldProvider>,
}

impl CollisionSystem {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            heightfield: None,
        }
    }

    /// Register the heightfield provider once the terrain subsystem has a cache
    pub fn init_heightfield(&mut self, cache: ChunkCache) {
        let chunks = cache.len();
        let provider = HeightfieldProvider::with_config(cache, &self.config);
        if self.heightfield.replace(provider).is_some() {
            info!(chunks, "heightfield provider replaced");
        } else {
            info!(chunks, "heightfield collision enabled");
        }
    }

    /// `None` means voxel-only collision
    pub fn heightfield_provider(&self) -> Option<&HeightfieldProvider> {
        self.heightfield.as_ref()
    }

    pub fn heightfield_provider_mut(&mut self) -> Option<&mut HeightfieldProvider> {
        self.heightfield.as_mut()
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CollisionConfig) {
        if let Some(provider) = self.heightfield.as_mut() {
            provider.apply_config(&config);
        }
        self.config = config;
    }

    /// Resolve one frame of motion for `body`.
    ///
    /// Mutates position, velocity, `on_ground` and the visual translation in
    /// place. Must run at most once per body per frame: gravity and damping
    /// are applied inside.
    pub fn resolve_entity_collision<T: VoxelTerrain + ?Sized>(
        &self,
        body: &mut PhysicsBody,
        terrain: &T,
        dt: f32,
    ) -> CollisionResult {
        let aabb = body.positioned_aabb();

        match self.heightfield.as_ref() {
            Some(provider) if provider.should_use_heightfield(body.position.x, body.position.z, Some(&aabb)) => {
                resolve_heightfield(body, provider, terrain, dt, &self.config)
            }
            Some(_) => {
                trace!(x = body.position.x, z = body.position.z, "footprint over voxel columns");
                resolve_voxel(body, terrain, dt, &self.config)
            }
            None => resolve_voxel(body, terrain, dt, &self.config),
        }
    }
}
