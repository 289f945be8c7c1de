use bevy::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hybrid_collision::collision::sweep;
use hybrid_collision::{
    Aabb, BlockType, BodyShape, ChunkCache, ChunkColumns, CollisionSystem, PhysicsBody,
    SparseVoxelTerrain,
};

const DT: f32 = 1.0 / 60.0;

fn hilly_chunk() -> ChunkColumns {
    ChunkColumns::from_fn(|x, z| 4.0 + (x as f32 * 0.4).sin() + (z as f32 * 0.3).cos())
}

fn voxel_floor() -> SparseVoxelTerrain {
    let mut terrain = SparseVoxelTerrain::new();
    terrain.fill(IVec3::new(0, 0, 0), IVec3::new(15, 3, 15), BlockType::Stone);
    terrain.fill(IVec3::new(10, 4, 0), IVec3::new(10, 6, 15), BlockType::Brick);
    terrain
}

fn bench_dispatch(c: &mut Criterion) {
    let terrain = voxel_floor();

    let mut heightfield = CollisionSystem::default();
    let mut cache = ChunkCache::new();
    cache.insert(IVec2::ZERO, hilly_chunk());
    heightfield.init_heightfield(cache);

    c.bench_function("resolve_heightfield_walking", |b| {
        b.iter(|| {
            let mut body = PhysicsBody::new(Vec3::new(6.0, 5.0, 6.0), BodyShape::MOB)
                .grounded()
                .with_velocity(Vec3::new(3.0, 0.0, 1.0));
            black_box(heightfield.resolve_entity_collision(&mut body, &terrain, black_box(DT)))
        })
    });

    let voxel_only = CollisionSystem::default();
    c.bench_function("resolve_voxel_into_wall", |b| {
        b.iter(|| {
            let mut body = PhysicsBody::new(Vec3::new(9.5, 4.0, 6.0), BodyShape::MOB)
                .grounded()
                .with_velocity(Vec3::new(8.0, 0.0, 2.0));
            black_box(voxel_only.resolve_entity_collision(&mut body, &terrain, black_box(DT)))
        })
    });

    c.bench_function("resolve_voxel_falling", |b| {
        b.iter(|| {
            let mut body = PhysicsBody::new(Vec3::new(6.0, 4.3, 6.0), BodyShape::HERO)
                .with_velocity(Vec3::new(0.0, -20.0, 0.0));
            black_box(voxel_only.resolve_entity_collision(&mut body, &terrain, black_box(DT)))
        })
    });
}

fn bench_sweep(c: &mut Criterion) {
    let terrain = voxel_floor();
    let mut aabb = Aabb::from_shape(&BodyShape::HERO);
    aabb.set_position(2.5, 4.0, 2.5);

    c.bench_function("sweep_long_diagonal", |b| {
        b.iter(|| {
            sweep(
                |x, y, z| hybrid_collision::terrain::is_solid_at(&terrain, x, y, z),
                black_box(&aabb),
                black_box(Vec3::new(9.0, -0.5, 6.0)),
            )
        })
    });
}

criterion_group!(benches, bench_dispatch, bench_sweep);
criterion_main!(benches);
