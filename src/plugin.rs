use bevy::prelude::*;
use std::marker::PhantomData;

use crate::body::{CollisionFeedback, PhysicsBody};
use crate::collision::CollisionSystem;
use crate::config::CollisionConfig;
use crate::terrain::{UnloadedTerrain, VoxelTerrain};

/// Per-frame terrain collision for every `PhysicsBody`, against terrain
/// resource `T`.
///
/// Inserts a [`CollisionSystem`] built from `config` unless the app already
/// has one. Register the heightfield through that resource once the terrain
/// subsystem has published its chunk cache.
pub struct TerrainCollisionPlugin<T> {
    pub config: CollisionConfig,
    _terrain: PhantomData<fn() -> T>,
}

impl<T> TerrainCollisionPlugin<T> {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            _terrain: PhantomData,
        }
    }
}

impl<T> Default for TerrainCollisionPlugin<T> {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

/// Ordering label so gameplay systems can set velocity before resolution
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TerrainCollisionSet;

impl<T: VoxelTerrain + Resource> Plugin for TerrainCollisionPlugin<T> {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<CollisionSystem>() {
            app.insert_resource(CollisionSystem::new(self.config.clone()));
        }
        app.add_systems(
            Update,
            (resolve_terrain_collisions::<T>, sync_visual_transforms)
                .chain()
                .in_set(TerrainCollisionSet),
        );
    }
}

/// Resolve every body once against the terrain.
///
/// Until the `T` resource exists the world is treated as air: bodies keep
/// falling under gravity (and still land on a registered heightfield).
pub fn resolve_terrain_collisions<T: VoxelTerrain + Resource>(
    time: Res<Time>,
    terrain: Option<Res<T>>,
    collision: Res<CollisionSystem>,
    mut bodies: Query<(&mut PhysicsBody, Option<&mut CollisionFeedback>)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let terrain: &dyn VoxelTerrain = match &terrain {
        Some(terrain) => &**terrain,
        None => &UnloadedTerrain,
    };

    for (mut body, feedback) in &mut bodies {
        let result = collision.resolve_entity_collision(&mut body, terrain, dt);
        if let Some(mut feedback) = feedback {
            feedback.0 = Some(result);
        }
    }
}

/// Copy resolved visual translations into render transforms
pub fn sync_visual_transforms(mut query: Query<(&PhysicsBody, &mut Transform), Changed<PhysicsBody>>) {
    for (body, mut transform) in &mut query {
        transform.translation = body.visual_translation;
    }
}
