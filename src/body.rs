use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aabb::{create_entity_aabb, Aabb, BodyShape};

/// Physical state of a terrain-colliding entity (player, mount, mob, projectile).
///
/// The collision core reads and writes this in place once per frame. Rendering
/// reads `visual_translation`, which the core keeps in sync with the resolved
/// position plus the box's ground offset.
#[derive(Component, Debug, Clone)]
pub struct PhysicsBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Vertical acceleration while airborne (negative)
    pub gravity: f32,
    pub on_ground: bool,
    pub shape: BodyShape,
    pub visual_translation: Vec3,
    aabb: Option<Aabb>,
}

impl PhysicsBody {
    pub fn new(position: Vec3, shape: BodyShape) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            gravity: DEFAULT_GRAVITY,
            on_ground: false,
            shape,
            visual_translation: position + Vec3::Y * shape.ground_offset,
            aabb: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn grounded(mut self) -> Self {
        self.on_ground = true;
        self
    }

    /// Collision box, created from `shape` on first use
    pub fn aabb_mut(&mut self) -> &mut Aabb {
        let shape = self.shape;
        self.aabb.get_or_insert_with(|| create_entity_aabb(&shape))
    }

    pub fn aabb(&self) -> Option<&Aabb> {
        self.aabb.as_ref()
    }

    /// Collision box placed at the current position
    pub(crate) fn positioned_aabb(&mut self) -> Aabb {
        let position = self.position;
        let aabb = self.aabb_mut();
        aabb.set_position_vec(position);
        *aabb
    }

    /// Swap in a different archetype box (e.g. hero mounting / dismounting)
    pub fn set_shape(&mut self, shape: BodyShape) {
        self.shape = shape;
        self.aabb = None;
    }

    /// Write the render translation from the resolved position
    pub(crate) fn sync_visual(&mut self) {
        let offset = self
            .aabb
            .as_ref()
            .map_or(self.shape.ground_offset, |aabb| aabb.ground_offset());
        self.visual_translation = self.position + Vec3::Y * offset;
    }
}

/// Gravity used by bodies that don't set their own
pub const DEFAULT_GRAVITY: f32 = -35.0;

/// Per-axis contact flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisFlags {
    pub fn from_array(flags: [bool; 3]) -> Self {
        Self {
            x: flags[0],
            y: flags[1],
            z: flags[2],
        }
    }

    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }
}

/// Which resolver handled a body this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionRegime {
    /// Interpolated-height resolution over open terrain
    Heightfield,
    /// Swept-AABB resolution against block occupancy
    Voxel,
    /// Started on the heightfield path, crossed into voxel columns, and was
    /// re-resolved by the voxel path
    BoundaryFallback,
}

/// Outcome of one resolution step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    pub collisions: AxisFlags,
    pub grounded: bool,
    pub regime: CollisionRegime,
}

/// Optional per-entity copy of the last [`CollisionResult`]
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CollisionFeedback(pub Option<CollisionResult>);
