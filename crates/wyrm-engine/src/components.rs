//! Gameplay component types, resources and events.
//!
//! Components are plain data; the systems in [`creature`](crate::creature),
//! [`cargo`](crate::cargo) and [`slots`](crate::slots) give them meaning.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use wyrm_ecs::prelude::Entity;

use crate::config::{CargoCategory, ScaleColor};
use crate::geometry::Aabb;
use crate::path::Pose;

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// Head progress along the path.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathFollower {
    /// Distance traveled, ignoring rebukes. Only ever grows.
    pub raw_distance: f32,
    /// Rendered distance: raw minus applied rebuke shift, clamped to the path.
    pub distance: f32,
    pub speed: f32,
    pub reached_end: bool,
}

/// Head-only growth bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnProgress {
    pub spawned_body: u32,
    pub tail_spawned: bool,
    /// Never decreases. Drives spawn thresholds.
    pub max_distance_reached: f32,
}

/// Trailing link from a body or tail segment to its head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowOffset {
    pub head: Entity,
    pub offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    Head,
    Body(u32),
    Tail(u32),
}

impl PartKind {
    /// Creature-relative ordinal. The head has none.
    pub fn index(self) -> Option<u32> {
        match self {
            PartKind::Head => None,
            PartKind::Body(i) | PartKind::Tail(i) => Some(i),
        }
    }
}

/// Unwind status of a segment's scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleVisualState {
    pub unwinding: bool,
    /// Remaining visible part of the scale, 1.0 untouched down to 0.0.
    pub fraction: f32,
}

impl Default for ScaleVisualState {
    fn default() -> Self {
        Self {
            unwinding: false,
            fraction: 1.0,
        }
    }
}

/// Present on the head while a rebuke is still rising.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebukeEnvelope {
    pub start_distance: f32,
    pub target_distance: f32,
    pub elapsed: f32,
    pub duration: f32,
}

// ---------------------------------------------------------------------------
// Cargo
// ---------------------------------------------------------------------------

/// Stable cargo ordinal: its position in the configured cargo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CargoId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CargoTransform {
    pub pose: Pose,
    pub origin: Vec3,
    pub origin_rotation: Quat,
}

/// Payload and shape of a cargo object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CargoInfo {
    pub half_extents: Vec3,
    pub color: ScaleColor,
    pub color_offset: u32,
    pub category: CargoCategory,
    pub turns: i32,
}

impl CargoInfo {
    /// Horizontal radius used by the forward blocker test.
    pub fn radius_xz(&self) -> f32 {
        self.half_extents.x.max(self.half_extents.z)
    }
}

/// Cargo that stand in this one's way. Fixed before the first tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Blockers(pub Vec<Entity>);

/// Up to six points a cargo walks through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoints {
    points: [Vec3; Waypoints::CAPACITY],
    len: usize,
}

impl Waypoints {
    pub const CAPACITY: usize = 6;

    pub fn new() -> Self {
        Self {
            points: [Vec3::ZERO; Self::CAPACITY],
            len: 0,
        }
    }

    /// Append `p` unless it duplicates the last point or the list is full.
    pub fn push(&mut self, p: Vec3) -> bool {
        if self.len == Self::CAPACITY {
            return false;
        }
        if let Some(last) = self.as_slice().last() {
            if last.distance_squared(p) < 1e-4 {
                return false;
            }
        }
        self.points[self.len] = p;
        self.len += 1;
        true
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.points[..self.len]
    }

    pub fn get(&self, i: usize) -> Option<Vec3> {
        self.as_slice().get(i).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Waypoints {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CargoMotion {
    #[default]
    Idle,
    /// `path` is planned on the first step after activation.
    ToSlot {
        slot: u32,
        path: Option<Waypoints>,
        cursor: usize,
    },
    ToObstacle {
        point: Vec3,
    },
    ToOrigin,
}

impl CargoMotion {
    pub fn kind(&self) -> MotionKind {
        match self {
            CargoMotion::Idle => MotionKind::Idle,
            CargoMotion::ToSlot { .. } => MotionKind::ToSlot,
            CargoMotion::ToObstacle { .. } => MotionKind::ToObstacle,
            CargoMotion::ToOrigin => MotionKind::ToOrigin,
        }
    }
}

/// Data-free discriminant of [`CargoMotion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionKind {
    Idle,
    ToSlot,
    ToObstacle,
    ToOrigin,
}

/// Cargo entities by [`CargoId`]. Entries go stale once a cargo is delivered.
#[derive(Debug, Clone, Default)]
pub struct CargoRegistry(pub Vec<Entity>);

impl CargoRegistry {
    pub fn entity(&self, id: CargoId) -> Option<Entity> {
        self.0.get(id.0 as usize).copied()
    }
}

/// The rectangle cargo may travel in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBorders(pub Aabb);

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIdentity(pub u32);

/// Where arriving cargo ends up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotTarget(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlotState {
    #[default]
    Empty,
    Reserved,
    Occupied,
    Disposing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotCargoLoad {
    pub current: i32,
    pub target: i32,
    pub category: CargoCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotCargoColor {
    pub color: ScaleColor,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlotWindState {
    pub target: Option<Entity>,
    pub progress: f32,
    pub dispose_timer: f32,
}

/// The cargo a reserved slot is waiting for. One per slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotReservation {
    pub cargo: Entity,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A player click on a cargo object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Click {
    pub point: Vec3,
    pub cargo: CargoId,
}

/// A cargo reached its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub slot: u32,
    pub cargo: CargoId,
    pub turns: i32,
    pub category: CargoCategory,
    pub color: ScaleColor,
    pub color_offset: u32,
}

/// A body scale was consumed; the creature closes the gap by `shift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebukeRequest {
    pub index: i32,
    pub shift: f32,
}

/// The head hit the far end of the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachedEnd {
    pub head: Entity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoints_dedupe_and_cap() {
        let mut w = Waypoints::new();
        assert!(w.push(Vec3::ZERO));
        assert!(!w.push(Vec3::new(0.001, 0.0, 0.0)));
        for i in 1..10 {
            w.push(Vec3::new(i as f32, 0.0, 0.0));
        }
        assert_eq!(w.len(), Waypoints::CAPACITY);
        assert_eq!(w.get(5), Some(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(w.get(6), None);
    }

    #[test]
    fn part_kind_index() {
        assert_eq!(PartKind::Head.index(), None);
        assert_eq!(PartKind::Body(3).index(), Some(3));
        assert_eq!(PartKind::Tail(9).index(), Some(9));
    }
}
