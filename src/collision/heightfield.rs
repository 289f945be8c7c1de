//! Heightfield Collision Resolver
//!
//! O(1) resolution against interpolated ground height, with explicit slope
//! blocking (a heightfield has no faces to stop a walker) and a one-shot
//! hand-off to the voxel resolver when motion carries the footprint onto a
//! voxel column.

use bevy::prelude::*;

use super::voxel::{apply_gravity, apply_horizontal_damping, resolve_voxel};
use crate::body::{AxisFlags, CollisionRegime, CollisionResult, PhysicsBody};
use crate::config::CollisionConfig;
use crate::heightfield::HeightfieldProvider;
use crate::terrain::VoxelTerrain;

/// Resolve one frame of `body` motion against the heightfield
pub fn resolve_heightfield<T: VoxelTerrain + ?Sized>(
    body: &mut PhysicsBody,
    provider: &HeightfieldProvider,
    terrain: &T,
    dt: f32,
    config: &CollisionConfig,
) -> CollisionResult {
    let frame_start = (body.position, body.velocity);
    let mut collisions = AxisFlags::default();

    apply_gravity(body, dt, config);

    let mut dx = body.velocity.x * dt;
    let mut dz = body.velocity.z * dt;

    // Slope policing only applies to walking; a rising body passes over
    let walking = body.on_ground && body.velocity.y <= 0.0;
    if walking && (dx != 0.0 || dz != 0.0) {
        let slope = provider.get_slope_in_direction(body.position.x, body.position.z, dx, dz);
        if provider.is_slope_too_steep(slope) {
            trace!(slope, "uphill slope too steep, horizontal motion blocked");
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
            dx = 0.0;
            dz = 0.0;
            collisions.x = true;
            collisions.z = true;
        }
    }

    body.position.x += dx;
    body.position.z += dz;

    let aabb = body.positioned_aabb();
    if !provider.should_use_heightfield(body.position.x, body.position.z, Some(&aabb)) {
        trace!(
            x = body.position.x,
            z = body.position.z,
            "footprint crossed onto voxel columns, re-resolving frame with voxel sweep"
        );
        body.position = frame_start.0;
        body.velocity = frame_start.1;
        let mut result = resolve_voxel(body, terrain, dt, config);
        result.regime = CollisionRegime::BoundaryFallback;
        return result;
    }

    body.position.y += body.velocity.y * dt;

    let Some(ground) = provider.get_interpolated_height(body.position.x, body.position.z) else {
        // No height data: a void, keep falling
        body.on_ground = false;
        apply_horizontal_damping(body, dt, config);
        body.positioned_aabb();
        body.sync_visual();
        return CollisionResult {
            collisions,
            grounded: false,
            regime: CollisionRegime::Heightfield,
        };
    };

    let grounded = if body.position.y < ground {
        body.position.y = ground;
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
        collisions.y = true;
        true
    } else {
        body.position.y - ground <= config.ground_snap_margin && body.velocity.y <= 0.0
    };
    body.on_ground = grounded;

    apply_horizontal_damping(body, dt, config);
    body.positioned_aabb();
    body.sync_visual();

    CollisionResult {
        collisions,
        grounded,
        regime: CollisionRegime::Heightfield,
    }
}
