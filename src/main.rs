use anyhow::Context;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use hybrid_collision::constants::{CHUNK_SIZE, HEIGHTMAP_LEN, HEIGHTMAP_STRIDE};
use hybrid_collision::hotreload::CollisionConfigReloadPlugin;
use hybrid_collision::logging::{init_tracing, SimulationSpan, TracingConfig};
use hybrid_collision::{
    BlockType, BodyShape, ChunkCache, CollisionConfig, CollisionFeedback, CollisionRegime,
    CollisionSystem, PhysicsBody, SparseVoxelTerrain, TerrainCollisionPlugin, TerrainCollisionSet,
};

const WORLD_SEED: u64 = 0x7074_6f77_6572;
const MOB_COUNT: usize = 32;
const FRAMES: u32 = 600;
const FRAME_TIME: f64 = 1.0 / 60.0;

/// Ground level shared by the heightfield and the voxel floor
const BASE_HEIGHT: f32 = 4.0;

/// Constant horizontal drive, reapplied every frame like movement input
#[derive(Component)]
struct Wander(Vec2);

fn main() -> anyhow::Result<()> {
    init_tracing(&TracingConfig::default());

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => CollisionConfig::load(path)
            .with_context(|| format!("loading collision config {}", path.display()))?,
        None => CollisionConfig::default(),
    };

    let cache = build_heightfield().context("building demo heightfield")?;
    let terrain = build_voxels();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(FRAME_TIME)))
        .insert_resource(terrain)
        .add_plugins(TerrainCollisionPlugin::<SparseVoxelTerrain>::new(config))
        .add_systems(Update, drive_mobs.before(TerrainCollisionSet))
        .add_systems(Startup, spawn_mobs);

    if let Some(path) = config_path {
        app.add_plugins(CollisionConfigReloadPlugin::new(path));
    }

    app.world_mut()
        .resource_mut::<CollisionSystem>()
        .init_heightfield(cache);

    {
        let _span = SimulationSpan::enter("demo", FRAMES);
        for _ in 0..FRAMES {
            app.update();
        }
    }

    report(app.world_mut());
    Ok(())
}

/// Nine chunks around the origin: flat at `BASE_HEIGHT` with a ramp climbing
/// east of x = 16 (slope 0.4) and a cliff north of z = 32 (slope 2.0). The
/// middle of chunk (0, 0) is voxel-governed.
fn build_heightfield() -> anyhow::Result<ChunkCache> {
    let mut cache = ChunkCache::new();
    let size = CHUNK_SIZE as i32;

    for chunk_z in -1..=1 {
        for chunk_x in -1..=1 {
            let mut heightmap = Vec::with_capacity(HEIGHTMAP_LEN);
            for z in 0..HEIGHTMAP_STRIDE {
                for x in 0..HEIGHTMAP_STRIDE {
                    let world_x = (chunk_x * size + x as i32) as f32;
                    let world_z = (chunk_z * size + z as i32) as f32;
                    heightmap.push(surface_height(world_x, world_z));
                }
            }

            let voxel_mask = (chunk_x == 0 && chunk_z == 0).then(|| {
                let mut mask = vec![0u8; CHUNK_SIZE * CHUNK_SIZE];
                for z in 4..12 {
                    for x in 4..12 {
                        mask[z * CHUNK_SIZE + x] = 1;
                    }
                }
                mask
            });

            cache.publish(IVec2::new(chunk_x, chunk_z), Some(heightmap), voxel_mask)?;
        }
    }
    Ok(cache)
}

fn surface_height(world_x: f32, world_z: f32) -> f32 {
    let ramp = (world_x - 16.0).max(0.0) * 0.4;
    let cliff = (world_z - 32.0).max(0.0) * 2.0;
    BASE_HEIGHT + ramp + cliff
}

/// Floor under the whole demo area, a brick wall and a cave inside the voxel region
fn build_voxels() -> SparseVoxelTerrain {
    let mut terrain = SparseVoxelTerrain::new();
    let floor_top = BASE_HEIGHT as i32 - 1;
    terrain.fill(IVec3::new(-16, 0, -16), IVec3::new(47, floor_top, 47), BlockType::Stone);

    // Wall across the voxel region
    terrain.fill(IVec3::new(9, 4, 4), IVec3::new(9, 6, 9), BlockType::Brick);
    // Cave: pillars holding a roof
    terrain.fill(IVec3::new(5, 4, 5), IVec3::new(5, 6, 5), BlockType::Wood);
    terrain.fill(IVec3::new(5, 4, 10), IVec3::new(5, 6, 10), BlockType::Wood);
    terrain.fill(IVec3::new(4, 7, 4), IVec3::new(8, 7, 11), BlockType::Stone);
    // Pond
    terrain.fill(IVec3::new(10, 3, 10), IVec3::new(11, 3, 11), BlockType::Water);
    terrain
}

fn spawn_mobs(mut commands: Commands) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(WORLD_SEED);

    for _ in 0..MOB_COUNT {
        let position = Vec3::new(rng.gen_range(-12.0..28.0), BASE_HEIGHT + rng.gen_range(0.5..6.0), rng.gen_range(-12.0..28.0));
        let heading = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = rng.gen_range(1.5..5.0);

        commands.spawn((
            PhysicsBody::new(position, BodyShape::MOB),
            Wander(Vec2::new(heading.cos(), heading.sin()) * speed),
            CollisionFeedback::default(),
            Transform::from_translation(position),
        ));
    }
}

/// Walk in a straight line, turning back at the edge of the loaded chunks
fn drive_mobs(mut query: Query<(&mut PhysicsBody, &mut Wander)>) {
    const EDGE_MIN: f32 = -14.0;
    const EDGE_MAX: f32 = 30.0;

    for (mut body, mut wander) in &mut query {
        if (body.position.x < EDGE_MIN && wander.0.x < 0.0) || (body.position.x > EDGE_MAX && wander.0.x > 0.0) {
            wander.0.x = -wander.0.x;
        }
        if (body.position.z < EDGE_MIN && wander.0.y < 0.0) || (body.position.z > EDGE_MAX && wander.0.y > 0.0) {
            wander.0.y = -wander.0.y;
        }
        body.velocity.x = wander.0.x;
        body.velocity.z = wander.0.y;
    }
}

fn report(world: &mut World) {
    let mut per_regime: HashMap<CollisionRegime, usize> = HashMap::new();
    let mut query = world.query::<(Entity, &PhysicsBody, &CollisionFeedback)>();

    for (entity, body, feedback) in query.iter(world) {
        let Some(result) = feedback.0 else {
            continue;
        };
        *per_regime.entry(result.regime).or_default() += 1;
        info!(
            ?entity,
            x = body.position.x,
            y = body.position.y,
            z = body.position.z,
            grounded = result.grounded,
            regime = ?result.regime,
            "mob settled"
        );
    }

    let blocks = world.resource::<SparseVoxelTerrain>().block_count();
    info!(
        frames = FRAMES,
        blocks,
        heightfield = per_regime.get(&CollisionRegime::Heightfield).copied().unwrap_or(0),
        voxel = per_regime.get(&CollisionRegime::Voxel).copied().unwrap_or(0),
        boundary = per_regime.get(&CollisionRegime::BoundaryFallback).copied().unwrap_or(0),
        "demo finished"
    );
}
