//! Tower Game - Hybrid Terrain Collision
//!
//! Moves every dynamic entity (players, mounts, mobs, projectiles) through a
//! world that is part smooth heightfield and part voxel grid:
//! - Per-entity, per-frame regime selection over the whole AABB footprint
//! - Swept AABB against voxel occupancy (no tunneling, slide along faces)
//! - Interpolated heightfield ground with slope blocking
//! - Boundary fallback from heightfield to voxel within the same frame
//! - Bevy plugin driving it all, with hot-reloadable tuning

pub mod aabb;
pub mod body;
pub mod collision;
pub mod config;
pub mod constants;
pub mod heightfield;
pub mod hotreload;
pub mod logging;
pub mod plugin;
pub mod terrain;

pub use aabb::{create_entity_aabb, create_hero_aabb, create_hero_on_foot_aabb, Aabb, BodyShape};
pub use body::{AxisFlags, CollisionFeedback, CollisionRegime, CollisionResult, PhysicsBody};
pub use collision::CollisionSystem;
pub use config::{CollisionConfig, ConfigError, DampingMode};
pub use heightfield::{ChunkCache, ChunkColumns, ChunkDataError, HeightfieldProvider};
pub use plugin::{TerrainCollisionPlugin, TerrainCollisionSet};
pub use terrain::{BlockType, InterpolatedTerrain, SparseVoxelTerrain, UnloadedTerrain, VoxelTerrain};
