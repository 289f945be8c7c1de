//! Voxel Collision Resolver
//!
//! Exact resolution against block occupancy: swept AABB for the frame's
//! motion, then a ground probe under the footprint for contacts the sweep can
//! miss at a frame boundary.

use bevy::prelude::*;

use super::sweep::sweep;
use crate::aabb::Aabb;
use crate::body::{AxisFlags, CollisionRegime, CollisionResult, PhysicsBody};
use crate::config::CollisionConfig;
use crate::constants::{CONTACT_TOLERANCE, GROUND_PROBE_DEPTH};
use crate::terrain::{is_solid_at, VoxelTerrain};

/// Resolve one frame of `body` motion against the voxel grid
pub fn resolve_voxel<T: VoxelTerrain + ?Sized>(
    body: &mut PhysicsBody,
    terrain: &T,
    dt: f32,
    config: &CollisionConfig,
) -> CollisionResult {
    apply_gravity(body, dt, config);

    let mut aabb = body.positioned_aabb();
    let movement = body.velocity * dt;

    let result = sweep(|x, y, z| is_solid_at(terrain, x, y, z), &aabb, movement);
    aabb.translate(result.translation);
    *body.aabb_mut() = aabb;
    body.position = aabb.position();

    for (axis, blocked) in result.blocked_axes.iter().enumerate() {
        if *blocked {
            body.velocity[axis] = 0.0;
        }
    }

    let mut grounded = result.landed();
    if !grounded && probe_ground(&aabb, terrain) {
        trace!(
            x = body.position.x,
            y = body.position.y,
            z = body.position.z,
            "ground probe caught a contact the sweep missed"
        );
        grounded = true;
    }
    body.on_ground = grounded;

    apply_horizontal_damping(body, dt, config);
    body.sync_visual();

    CollisionResult {
        collisions: AxisFlags::from_array(result.blocked_axes),
        grounded,
        regime: CollisionRegime::Voxel,
    }
}

/// Is any column under the footprint solid one voxel below the base?
pub fn probe_ground<T: VoxelTerrain + ?Sized>(aabb: &Aabb, terrain: &T) -> bool {
    let y = (aabb.base().y - GROUND_PROBE_DEPTH).floor() as i32;
    let min_x = aabb.base().x.floor() as i32;
    let max_x = (aabb.max().x - CONTACT_TOLERANCE).floor() as i32;
    let min_z = aabb.base().z.floor() as i32;
    let max_z = (aabb.max().z - CONTACT_TOLERANCE).floor() as i32;

    (min_x..=max_x).any(|x| (min_z..=max_z).any(|z| is_solid_at(terrain, x, y, z)))
}

/// Integrate gravity into vertical velocity while airborne
pub(crate) fn apply_gravity(body: &mut PhysicsBody, dt: f32, config: &CollisionConfig) {
    if !body.on_ground {
        body.velocity.y = (body.velocity.y + body.gravity * dt).max(-config.max_fall_speed);
    }
}

pub(crate) fn apply_horizontal_damping(body: &mut PhysicsBody, dt: f32, config: &CollisionConfig) {
    let damping = config.damping_factor(dt);
    body.velocity.x *= damping;
    body.velocity.z *= damping;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aabb::BodyShape;
    use crate::terrain::{BlockType, SparseVoxelTerrain};

    const DT: f32 = 1.0 / 60.0;

    fn floor_at(y: i32) -> SparseVoxelTerrain {
        let mut terrain = SparseVoxelTerrain::new();
        terrain.fill(IVec3::new(-4, y, -4), IVec3::new(4, y, 4), BlockType::Stone);
        terrain
    }

    fn body_at(position: Vec3) -> PhysicsBody {
        PhysicsBody::new(position, BodyShape::new(0.5, 1.0, 0.5))
    }

    #[test]
    fn test_falling_body_lands_and_stops() {
        let terrain = floor_at(0);
        let mut body = body_at(Vec3::new(0.5, 1.05, 0.5)).with_velocity(Vec3::new(0.0, -6.0, 0.0));
        let result = resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());

        assert!(result.grounded);
        assert!(result.collisions.y);
        assert!(body.on_ground);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.position.y - 1.0).abs() < 1e-4);
        assert_eq!(result.regime, CollisionRegime::Voxel);
    }

    #[test]
    fn test_gravity_only_when_airborne() {
        let terrain = SparseVoxelTerrain::new();
        let config = CollisionConfig::default();

        let mut airborne = body_at(Vec3::new(0.5, 10.0, 0.5));
        resolve_voxel(&mut airborne, &terrain, DT, &config);
        assert!((airborne.velocity.y - airborne.gravity * DT).abs() < 1e-5);

        let mut grounded = body_at(Vec3::new(0.5, 10.0, 0.5)).grounded();
        resolve_voxel(&mut grounded, &terrain, DT, &config);
        assert_eq!(grounded.velocity.y, 0.0);
        // Nothing underneath: no longer grounded after the frame
        assert!(!grounded.on_ground);
    }

    #[test]
    fn test_fall_speed_clamped() {
        let terrain = SparseVoxelTerrain::new();
        let config = CollisionConfig::default();
        let mut body = body_at(Vec3::new(0.5, 500.0, 0.5)).with_velocity(Vec3::new(0.0, -49.9, 0.0));
        resolve_voxel(&mut body, &terrain, DT, &config);
        assert!((body.velocity.y + config.max_fall_speed).abs() < 1e-5);
    }

    #[test]
    fn test_probe_grounds_resting_body_without_sweep_contact() {
        // Grounded and still: no vertical movement, so the sweep sees nothing
        let terrain = floor_at(0);
        let mut body = body_at(Vec3::new(0.5, 1.0, 0.5)).grounded();
        let result = resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!(!result.collisions.y);
        assert!(result.grounded);
    }

    #[test]
    fn test_probe_skipped_when_sweep_landed() {
        let terrain = floor_at(0);
        let mut body = body_at(Vec3::new(0.5, 1.01, 0.5)).with_velocity(Vec3::new(0.0, -3.0, 0.0));
        let result = resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!(result.collisions.y);
        assert!(result.grounded);
    }

    #[test]
    fn test_probe_ignores_ground_more_than_a_voxel_down() {
        let terrain = floor_at(0);
        let mut aabb = Aabb::new(0.5, 1.0, 0.5, 0.0);
        aabb.set_position(0.5, 1.3, 0.5);
        assert!(!probe_ground(&aabb, &terrain));
        aabb.set_position(0.5, 1.0, 0.5);
        assert!(probe_ground(&aabb, &terrain));
    }

    #[test]
    fn test_probe_covers_whole_footprint() {
        let mut terrain = SparseVoxelTerrain::new();
        terrain.set_block(IVec3::new(1, 0, 1), BlockType::Stone);
        let mut aabb = Aabb::new(1.0, 1.0, 1.0, 0.0);
        aabb.set_position(0.9, 1.0, 0.9);
        assert!(probe_ground(&aabb, &terrain));
    }

    #[test]
    fn test_liquid_is_not_ground() {
        let mut terrain = SparseVoxelTerrain::new();
        terrain.fill(IVec3::new(-2, 0, -2), IVec3::new(2, 0, 2), BlockType::Water);
        let mut body = body_at(Vec3::new(0.5, 1.0, 0.5)).with_velocity(Vec3::new(0.0, -5.0, 0.0));
        let result = resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!(!result.grounded);
        assert!(body.position.y < 1.0);
    }

    #[test]
    fn test_horizontal_damping_per_frame() {
        let terrain = floor_at(0);
        let mut body = body_at(Vec3::new(0.5, 1.0, 0.5))
            .grounded()
            .with_velocity(Vec3::new(2.0, 0.0, -1.0));
        resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!((body.velocity.x - 1.8).abs() < 1e-5);
        assert!((body.velocity.z + 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_wall_contact_zeroes_velocity_axis() {
        let mut terrain = floor_at(0);
        terrain.fill(IVec3::new(2, 1, -4), IVec3::new(2, 3, 4), BlockType::Brick);
        let mut body = body_at(Vec3::new(1.70, 1.0, 0.5))
            .grounded()
            .with_velocity(Vec3::new(6.0, 0.0, 0.0));
        let result = resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!(result.collisions.x);
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.aabb().map_or(false, |aabb| aabb.max().x <= 2.0 + 1e-3));
    }

    #[test]
    fn test_visual_follows_body() {
        let terrain = floor_at(0);
        let mut body = PhysicsBody::new(Vec3::new(0.5, 1.0, 0.5), BodyShape::HERO).grounded();
        resolve_voxel(&mut body, &terrain, DT, &CollisionConfig::default());
        assert!((body.visual_translation.y - (body.position.y + BodyShape::HERO.ground_offset)).abs() < 1e-6);
    }
}
