//! Centralized collision constants.
//!
//! Tunable values also appear as defaults in [`crate::config::CollisionConfig`];
//! the constants here are the single source of truth for those defaults.

// =====================================================
// Chunk layout
// =====================================================

/// Chunk edge length in world units (and in voxel columns)
pub const CHUNK_SIZE: usize = 16;

/// Heightmap vertices per chunk edge (one more than cells)
pub const HEIGHTMAP_STRIDE: usize = CHUNK_SIZE + 1;

/// Heightmap length per chunk: (N+1)²
pub const HEIGHTMAP_LEN: usize = HEIGHTMAP_STRIDE * HEIGHTMAP_STRIDE;

/// Voxel mask length per chunk: N²
pub const VOXEL_MASK_LEN: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Local sample coordinates clamp to [0, CHUNK_SIZE - LOCAL_COORD_EPSILON]
pub const LOCAL_COORD_EPSILON: f32 = 1.0e-4;

// =====================================================
// Heightfield policing
// =====================================================

/// Rise/run above which uphill walking is blocked (~56°)
pub const MAX_WALKABLE_SLOPE: f32 = 1.5;

/// Forward distance of the slope probe
pub const SLOPE_PROBE_DISTANCE: f32 = 0.5;

/// Height above ground still counted as grounded when not rising
pub const GROUND_SNAP_MARGIN: f32 = 0.1;

/// Outward inflation of footprint corners during regime classification
pub const FOOTPRINT_INFLATION: f32 = 0.01;

/// Direction vectors shorter than this have no slope
pub const MIN_DIRECTION_LENGTH: f32 = 1.0e-6;

// =====================================================
// Motion
// =====================================================

/// Horizontal velocity multiplier applied once per frame
pub const HORIZONTAL_DAMPING: f32 = 0.9;

/// Frame rate the per-frame damping factor was tuned at
pub const DAMPING_REFERENCE_FPS: f32 = 60.0;

/// Falling speed clamp (units/s)
pub const MAX_FALL_SPEED: f32 = 50.0;

// =====================================================
// Voxel sweep
// =====================================================

/// Penetration depth still treated as touching a barrier face
pub const CONTACT_TOLERANCE: f32 = 1.0e-3;

/// Distance below the AABB base sampled by the ground probe
pub const GROUND_PROBE_DEPTH: f32 = 0.01;

/// Upper bound on contacts resolved by one sweep (one per axis)
pub const MAX_SWEEP_CONTACTS: usize = 3;
