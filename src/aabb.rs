//! Entity collision boxes.
//!
//! Every box is anchored at its center-bottom point (the entity's feet):
//! `base.y` is the anchor's y, and the footprint extends `half_width` /
//! `half_depth` either side of it on X / Z.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Footprint dimensions for an entity archetype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyShape {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Visual-only Y nudge applied when syncing the render transform
    pub ground_offset: f32,
}

impl BodyShape {
    /// Hero while mounted (rider + mount share one box)
    pub const HERO: BodyShape = BodyShape {
        width: 1.2,
        height: 2.4,
        depth: 1.2,
        ground_offset: 0.05,
    };

    /// Hero walking on foot
    pub const HERO_ON_FOOT: BodyShape = BodyShape {
        width: 0.6,
        height: 1.8,
        depth: 0.6,
        ground_offset: 0.0,
    };

    /// Standard ground mob
    pub const MOB: BodyShape = BodyShape {
        width: 0.8,
        height: 1.2,
        depth: 0.8,
        ground_offset: 0.0,
    };

    /// Thrown or fired projectile
    pub const PROJECTILE: BodyShape = BodyShape {
        width: 0.2,
        height: 0.2,
        depth: 0.2,
        ground_offset: 0.0,
    };

    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
            ground_offset: 0.0,
        }
    }

    pub fn with_ground_offset(mut self, ground_offset: f32) -> Self {
        self.ground_offset = ground_offset;
        self
    }
}

impl Default for BodyShape {
    fn default() -> Self {
        Self::MOB
    }
}

/// Axis-aligned collision box.
///
/// `max = base + (width, height, depth)` holds after every mutation. The
/// geometry is only reachable through the mutators below, so `position()`
/// always agrees with `base` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    width: f32,
    height: f32,
    depth: f32,
    ground_offset: f32,
    half_width: f32,
    half_depth: f32,
    base: Vec3,
    max: Vec3,
    anchor: Vec3,
}

impl Aabb {
    pub fn new(width: f32, height: f32, depth: f32, ground_offset: f32) -> Self {
        let mut aabb = Self {
            width,
            height,
            depth,
            ground_offset,
            half_width: width / 2.0,
            half_depth: depth / 2.0,
            base: Vec3::ZERO,
            max: Vec3::ZERO,
            anchor: Vec3::ZERO,
        };
        aabb.set_position(0.0, 0.0, 0.0);
        aabb
    }

    pub fn from_shape(shape: &BodyShape) -> Self {
        Self::new(shape.width, shape.height, shape.depth, shape.ground_offset)
    }

    /// Minimum corner
    pub fn base(&self) -> Vec3 {
        self.base
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    pub fn half_depth(&self) -> f32 {
        self.half_depth
    }

    /// Visual-only Y nudge, never used for collision
    pub fn ground_offset(&self) -> f32 {
        self.ground_offset
    }

    /// Size as a vector (width, height, depth)
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    /// Place the box so its center-bottom point is (x, y, z)
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.anchor = Vec3::new(x, y, z);
        self.base = Vec3::new(x - self.half_width, y, z - self.half_depth);
        self.max = self.base + self.extent();
    }

    pub fn set_position_vec(&mut self, position: Vec3) {
        self.set_position(position.x, position.y, position.z);
    }

    /// Center-bottom point. Returns exactly what `set_position` was given,
    /// shifted by any later `translate` calls.
    pub fn position(&self) -> Vec3 {
        self.anchor
    }

    /// Shift the whole box by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        self.anchor += delta;
        self.base += delta;
        self.max += delta;
    }

    /// The four horizontal footprint corners pushed outward by `inflation`,
    /// as (x, z) pairs.
    pub fn footprint_corners(&self, inflation: f32) -> [Vec2; 4] {
        let min_x = self.base.x - inflation;
        let min_z = self.base.z - inflation;
        let max_x = self.max.x + inflation;
        let max_z = self.max.z + inflation;
        [
            Vec2::new(min_x, min_z),
            Vec2::new(max_x, min_z),
            Vec2::new(min_x, max_z),
            Vec2::new(max_x, max_z),
        ]
    }

    /// Does self overlap the unit cube at integer cell `cell` by more than
    /// `tolerance` on every axis?
    pub fn overlaps_cell(&self, cell: IVec3, tolerance: f32) -> bool {
        let cell_min = cell.as_vec3();
        let cell_max = cell_min + Vec3::ONE;
        (0..3).all(|i| {
            self.max[i] > cell_min[i] + tolerance && self.base[i] < cell_max[i] - tolerance
        })
    }
}

/// Collision box for an arbitrary entity archetype
pub fn create_entity_aabb(shape: &BodyShape) -> Aabb {
    Aabb::from_shape(shape)
}

/// Collision box for the mounted hero
pub fn create_hero_aabb() -> Aabb {
    Aabb::from_shape(&BodyShape::HERO)
}

/// Collision box for the hero on foot
pub fn create_hero_on_foot_aabb() -> Aabb {
    Aabb::from_shape(&BodyShape::HERO_ON_FOOT)
}
