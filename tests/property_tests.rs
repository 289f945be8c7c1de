//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - AABB: set_position → position round-trips exactly
//! - Sweep: a box never ends up inside a solid cell it started outside of
//! - Classification: regime queries are pure functions of the chunk data
//! - Heightfield: interpolated height stays within the cell's vertex range

use bevy::prelude::*;
use proptest::prelude::*;

use hybrid_collision::collision::{resolve_voxel, sweep};
use hybrid_collision::constants::{CONTACT_TOLERANCE, VOXEL_MASK_LEN};
use hybrid_collision::{
    Aabb, BlockType, BodyShape, ChunkCache, ChunkColumns, CollisionConfig, HeightfieldProvider,
    PhysicsBody, SparseVoxelTerrain,
};

// ============================================================
// AABB Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_aabb_position_round_trip(
        width in 0.05f32..10.0,
        height in 0.05f32..10.0,
        depth in 0.05f32..10.0,
        ground_offset in 0.0f32..1.0,
        x in -1.0e5f32..1.0e5,
        y in -1.0e5f32..1.0e5,
        z in -1.0e5f32..1.0e5,
    ) {
        let mut aabb = Aabb::new(width, height, depth, ground_offset);
        aabb.set_position(x, y, z);
        prop_assert_eq!(aabb.position(), Vec3::new(x, y, z));
    }

    #[test]
    fn prop_aabb_max_tracks_base(
        width in 0.05f32..10.0,
        x in -1000.0f32..1000.0,
        y in -1000.0f32..1000.0,
        z in -1000.0f32..1000.0,
    ) {
        let mut aabb = Aabb::new(width, width * 2.0, width, 0.0);
        aabb.set_position(x, y, z);
        let size = aabb.max() - aabb.base();
        prop_assert!((size - aabb.extent()).abs().max_element() < 1e-2);
        prop_assert_eq!(aabb.base().y, y);
    }
}

// ============================================================
// Sweep Properties
// ============================================================

const BLOCK: IVec3 = IVec3::ZERO;

fn box_at(size: Vec3, position: Vec3) -> Aabb {
    let mut aabb = Aabb::new(size.x, size.y, size.z, 0.0);
    aabb.set_position_vec(position);
    aabb
}

fn vec3_in(range: std::ops::Range<f32>) -> impl Strategy<Value = Vec3> {
    (range.clone(), range.clone(), range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_sweep_never_enters_solid_block(
        size in vec3_in(0.2..1.8),
        start in vec3_in(-4.0..4.0),
        movement in vec3_in(-6.0..6.0),
    ) {
        let mut aabb = box_at(size, start);
        prop_assume!(!aabb.overlaps_cell(BLOCK, 0.0));

        let result = sweep(|x, y, z| IVec3::new(x, y, z) == BLOCK, &aabb, movement);
        aabb.translate(result.translation);

        prop_assert!(
            !aabb.overlaps_cell(BLOCK, CONTACT_TOLERANCE),
            "ended inside the block: base={:?} max={:?}", aabb.base(), aabb.max()
        );
    }

    #[test]
    fn prop_block_ahead_stops_box_at_its_face(
        size in vec3_in(0.2..1.8),
        gap in 0.0f32..3.0,
        lateral in -0.4f32..0.4,
        speed in 0.0f32..20.0,
    ) {
        // Box centered on the block's y/z, `gap` short of its -x face, moving +x
        // fast enough to reach it
        let start = Vec3::new(-gap - size.x / 2.0, 0.5 - size.y / 2.0 + lateral * 0.5, 0.5 + lateral * 0.5);
        let mut aabb = box_at(size, start);
        let movement = Vec3::new(gap + 0.01 + speed, 0.0, 0.0);

        let result = sweep(|x, y, z| IVec3::new(x, y, z) == BLOCK, &aabb, movement);
        aabb.translate(result.translation);

        prop_assert!(result.blocked_axes[0]);
        prop_assert!(aabb.max().x <= CONTACT_TOLERANCE);
        prop_assert_eq!(result.remaining_movement.x, 0.0);
    }

    #[test]
    fn prop_voxel_resolver_never_penetrates(
        start in vec3_in(-3.0..3.0),
        velocity in vec3_in(-30.0..30.0),
        grounded in any::<bool>(),
    ) {
        let mut terrain = SparseVoxelTerrain::new();
        terrain.set_block(BLOCK, BlockType::Stone);

        let mut start_box = Aabb::from_shape(&BodyShape::MOB);
        start_box.set_position_vec(start);
        prop_assume!(!start_box.overlaps_cell(BLOCK, 0.0));

        let mut body = PhysicsBody::new(start, BodyShape::MOB).with_velocity(velocity);
        body.on_ground = grounded;
        resolve_voxel(&mut body, &terrain, 1.0 / 60.0, &CollisionConfig::default());

        let aabb = body.aabb().copied().unwrap();
        prop_assert!(!aabb.overlaps_cell(BLOCK, CONTACT_TOLERANCE));
    }
}

// ============================================================
// Classification Properties
// ============================================================

fn masked_provider(mask: Vec<bool>) -> HeightfieldProvider {
    let mask: Vec<u8> = mask.into_iter().map(u8::from).collect();
    let columns = ChunkColumns::flat(2.0).with_voxel_mask(mask).unwrap();
    let mut cache = ChunkCache::new();
    cache.insert(IVec2::ZERO, columns);
    HeightfieldProvider::new(cache)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_classification_is_pure(
        mask in proptest::collection::vec(any::<bool>(), VOXEL_MASK_LEN),
        x in -20.0f32..36.0,
        z in -20.0f32..36.0,
        width in 0.1f32..3.0,
    ) {
        let provider = masked_provider(mask);
        let mut aabb = Aabb::new(width, 1.0, width, 0.0);
        aabb.set_position(x, 0.0, z);

        let point = provider.should_use_heightfield(x, z, None);
        let footprint = provider.should_use_heightfield(x, z, Some(&aabb));
        for _ in 0..3 {
            prop_assert_eq!(provider.should_use_heightfield(x, z, None), point);
            prop_assert_eq!(provider.should_use_heightfield(x, z, Some(&aabb)), footprint);
        }
        // A footprint can only be stricter than its center point
        prop_assert!(!footprint || point);
    }

    #[test]
    fn prop_interpolated_height_within_cell_range(
        seed_heights in proptest::collection::vec(-50.0f32..50.0, 17 * 17),
        x in 0.0f32..16.0,
        z in 0.0f32..16.0,
    ) {
        let columns = ChunkColumns::new().with_heightmap(seed_heights.clone()).unwrap();
        let mut cache = ChunkCache::new();
        cache.insert(IVec2::ZERO, columns);
        let provider = HeightfieldProvider::new(cache);

        let h = provider.get_interpolated_height(x, z);
        prop_assert!(h.is_some());
        let h = h.unwrap_or_default();

        let x0 = (x.floor() as usize).min(15);
        let z0 = (z.floor() as usize).min(15);
        let corners = [
            seed_heights[z0 * 17 + x0],
            seed_heights[z0 * 17 + x0 + 1],
            seed_heights[(z0 + 1) * 17 + x0],
            seed_heights[(z0 + 1) * 17 + x0 + 1],
        ];
        let lo = corners.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = corners.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert!(h >= lo - 1e-3 && h <= hi + 1e-3, "h={h} outside [{lo}, {hi}]");
    }
}
