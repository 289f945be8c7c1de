//! Swept AABB vs voxel grid.
//!
//! The box moves along a straight line (`movement` over unit time). Each step
//! finds the earliest time any leading face meets the opposite face of a solid
//! cell, advances to it, zeroes that axis and carries on with the rest of the
//! movement. Every axis can block at most once, so a sweep resolves at most
//! three contacts.
//!
//! Per axis, the leading face is the one facing the direction of travel, and
//! the other two axes must overlap the cell at the time of impact for the hit
//! to count. Overlaps thinner than [`CONTACT_TOLERANCE`] are ignored, which is
//! what lets a box slide along a floor or wall it is touching.

use bevy::prelude::*;

use crate::aabb::Aabb;
use crate::constants::{CONTACT_TOLERANCE, MAX_SWEEP_CONTACTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Resolution order on ties: floor contacts win
    pub const SWEEP_ORDER: [Axis; 3] = [Axis::Y, Axis::X, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn other_axes(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::Z, Axis::X],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }
}

/// One blocked axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    pub axis: Axis,
    /// Sign of travel along `axis` when blocked (+1 or -1)
    pub direction: i8,
    /// Fraction of the full movement at which the contact happened
    pub time: f32,
    /// The cell whose face stopped the box
    pub cell: IVec3,
}

impl ContactInfo {
    /// Blocked while moving down, i.e. landed on something
    pub fn is_floor(&self) -> bool {
        self.axis == Axis::Y && self.direction < 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    /// Displacement actually applied to the box
    pub translation: Vec3,
    pub blocked_axes: [bool; 3],
    /// The input movement with every blocked axis zeroed
    pub remaining_movement: Vec3,
    pub contacts: Vec<ContactInfo>,
}

impl SweepResult {
    pub fn landed(&self) -> bool {
        self.contacts.iter().any(ContactInfo::is_floor)
    }
}

/// Sweep `aabb` through `movement`, stopping at solid cells.
///
/// `is_solid(x, y, z)` reports whether integer cell (x, y, z) blocks movement.
/// The box itself is not modified; apply `translation` to it.
pub fn sweep<F>(is_solid: F, aabb: &Aabb, movement: Vec3) -> SweepResult
where
    F: Fn(i32, i32, i32) -> bool,
{
    let ext = aabb.extent();
    let mut min = aabb.base();
    let mut velocity = movement;
    let mut time_left = 1.0_f32;
    let mut translation = Vec3::ZERO;
    let mut blocked_axes = [false; 3];
    let mut contacts = Vec::new();

    while time_left > 0.0 && velocity != Vec3::ZERO {
        let hit = if contacts.len() < MAX_SWEEP_CONTACTS {
            first_contact(&is_solid, min, ext, velocity, time_left)
        } else {
            None
        };

        let Some((axis, dt, cell)) = hit else {
            let step = velocity * time_left;
            min += step;
            translation += step;
            break;
        };

        let step = velocity * dt;
        min += step;
        translation += step;
        time_left -= dt;

        let i = axis.index();
        contacts.push(ContactInfo {
            axis,
            direction: if velocity[i] > 0.0 { 1 } else { -1 },
            time: 1.0 - time_left,
            cell,
        });
        blocked_axes[i] = true;
        velocity[i] = 0.0;
    }

    let mut remaining_movement = movement;
    for (i, blocked) in blocked_axes.iter().enumerate() {
        if *blocked {
            remaining_movement[i] = 0.0;
        }
    }

    SweepResult {
        translation,
        blocked_axes,
        remaining_movement,
        contacts,
    }
}

/// Earliest contact within `max_dt`, as (axis, time, cell)
fn first_contact<F>(
    is_solid: &F,
    min: Vec3,
    ext: Vec3,
    velocity: Vec3,
    max_dt: f32,
) -> Option<(Axis, f32, IVec3)>
where
    F: Fn(i32, i32, i32) -> bool,
{
    let mut first: Option<(Axis, f32, IVec3)> = None;
    let (cells_min, cells_max) = cell_broadphase(min, ext, velocity, max_dt);

    for axis in Axis::SWEEP_ORDER {
        let a = axis.index();
        let axis_vel = velocity[a];
        if axis_vel == 0.0 {
            continue;
        }

        // leading face of the box along this axis
        let face = if axis_vel > 0.0 { min[a] + ext[a] } else { min[a] };

        for z in cells_min.z..=cells_max.z {
            for y in cells_min.y..=cells_max.y {
                for x in cells_min.x..=cells_max.x {
                    let cell = IVec3::new(x, y, z);
                    // barrier face of the cell facing the box
                    let barrier = if axis_vel > 0.0 {
                        cell[a] as f32
                    } else {
                        cell[a] as f32 + 1.0
                    };

                    // behind the face by more than the tolerance: not in the way
                    let gap = (barrier - face) * axis_vel.signum();
                    if gap < -CONTACT_TOLERANCE {
                        continue;
                    }
                    let dt = (gap.max(0.0) / axis_vel.abs()).max(0.0);
                    if dt > max_dt {
                        continue;
                    }
                    if first.is_some_and(|(_, best, _)| dt >= best) {
                        continue;
                    }
                    if !tangential_overlap(axis, cell, min, ext, velocity, dt) {
                        continue;
                    }
                    if !is_solid(x, y, z) {
                        continue;
                    }
                    // face shared with a solid cell on the box's side is inside a wall
                    let mut near = cell;
                    near[a] -= axis_vel.signum() as i32;
                    if is_solid(near.x, near.y, near.z) {
                        continue;
                    }
                    first = Some((axis, dt, cell));
                }
            }
        }
    }

    first
}

/// Would the box overlap `cell` on both non-contact axes at time `dt`?
///
/// A sliver no deeper than the tolerance only counts when the box is moving
/// further into the cell along that axis (clipping a corner).
fn tangential_overlap(axis: Axis, cell: IVec3, min: Vec3, ext: Vec3, velocity: Vec3, dt: f32) -> bool {
    axis.other_axes().iter().all(|other| {
        let o = other.index();
        let obj_min = min[o] + velocity[o] * dt;
        let obj_max = obj_min + ext[o];
        let cell_min = cell[o] as f32;
        let cell_max = cell_min + 1.0;

        let from_below = obj_max - cell_min;
        let from_above = cell_max - obj_min;
        if from_below <= 0.0 || from_above <= 0.0 {
            return false;
        }
        if from_below.min(from_above) > CONTACT_TOLERANCE {
            return true;
        }
        if from_below <= from_above {
            velocity[o] > 0.0
        } else {
            velocity[o] < 0.0
        }
    })
}

/// Inclusive range of cells the box can touch while moving for `max_dt`
fn cell_broadphase(min: Vec3, ext: Vec3, velocity: Vec3, max_dt: f32) -> (IVec3, IVec3) {
    let start = min;
    let end = min + velocity * max_dt;
    let lo = start.min(end) - Vec3::splat(CONTACT_TOLERANCE);
    let hi = start.max(end) + ext + Vec3::splat(CONTACT_TOLERANCE);
    (
        lo.floor().as_ivec3(),
        hi.ceil().as_ivec3() - IVec3::ONE,
    )
}
