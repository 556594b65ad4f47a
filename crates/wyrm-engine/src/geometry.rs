//! Axis-aligned boxes and horizontal-plane helpers for cargo routing.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance used when a cargo approaches a point.
pub const ARRIVE_EPSILON: f32 = 0.05;

/// How far inside the field borders routed points are placed.
pub const BORDER_INSET: f32 = 0.05;

/// Axis-aligned box as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents: extents.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Bounds of a box with `half_extents` rotated by `rotation` about `center`.
    pub fn oriented(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        let m = Mat3::from_quat(rotation);
        let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
        Self::new(center, abs * half_extents.abs())
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(self.center, self.extents + Vec3::splat(margin.max(0.0)))
    }

    /// Strict overlap on every axis; touching faces do not count.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x
            && b_min.x < a_max.x
            && a_min.y < b_max.y
            && b_min.y < a_max.y
            && a_min.z < b_max.z
            && b_min.z < a_max.z
    }

    /// Inclusive containment in the XZ plane.
    pub fn contains_xz(&self, p: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.z >= min.z && p.z <= max.z
    }

    /// Distance along the XZ direction `dir` from `origin` to where the ray
    /// leaves the box. Zero if `dir` has no horizontal component or the
    /// origin is already past the exit.
    pub fn exit_distance_xz(&self, origin: Vec3, dir: Vec3) -> f32 {
        let (min, max) = (self.min(), self.max());
        let mut t = f32::INFINITY;
        if dir.x.abs() > 1e-6 {
            let edge = if dir.x > 0.0 { max.x } else { min.x };
            t = t.min((edge - origin.x) / dir.x);
        }
        if dir.z.abs() > 1e-6 {
            let edge = if dir.z > 0.0 { max.z } else { min.z };
            t = t.min((edge - origin.z) / dir.z);
        }
        if t.is_finite() {
            t.max(0.0)
        } else {
            0.0
        }
    }

    /// The box shrunk by `inset` on X and Z, never inverted.
    pub fn inset_xz(&self, inset: f32) -> Aabb {
        let shrink = Vec3::new(
            inset.min(self.extents.x),
            0.0,
            inset.min(self.extents.z),
        );
        Aabb::new(self.center, self.extents - shrink)
    }
}

/// The rotation's forward (+Z) projected onto XZ and normalized. Falls back
/// to +Z when the forward is vertical.
pub fn forward_xz(rotation: Quat) -> Vec3 {
    let f = rotation * Vec3::Z;
    flatten(f).unwrap_or(Vec3::Z)
}

/// Yaw-only rotation facing along `dir` on XZ.
pub fn yaw_towards(dir: Vec3) -> Option<Quat> {
    let flat = flatten(dir)?;
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

fn flatten(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    if flat.length_squared() < 1e-8 {
        None
    } else {
        Some(flat.normalize())
    }
}

/// Move `from` toward `to` by at most `step`.
pub fn move_towards(from: Vec3, to: Vec3, step: f32) -> Vec3 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= step || dist <= f32::EPSILON {
        to
    } else {
        from + delta / dist * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn union_and_expand() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(4.0, 0.0, 0.0), Vec3::ONE);
        let u = a.union(&b).expanded(0.5);
        assert_eq!(u.min(), Vec3::new(-1.5, -1.5, -1.5));
        assert_eq!(u.max(), Vec3::new(5.5, 1.5, 1.5));
        assert_eq!(a.expanded(-3.0), a);
    }

    #[test]
    fn oriented_box_swaps_extents_at_quarter_turn() {
        let b = Aabb::oriented(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2), Vec3::new(2.0, 1.0, 0.5));
        assert!(b.extents.abs_diff_eq(Vec3::new(0.5, 1.0, 2.0), 1e-5));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE);
        assert!(!a.intersects(&b));
        let c = Aabb::new(Vec3::new(1.9, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&c));
    }

    #[test]
    fn exit_distance_from_inside() {
        let field = Aabb::from_min_max(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 0.0, 10.0));
        assert!((field.exit_distance_xz(Vec3::ZERO, Vec3::Z) - 10.0).abs() < 1e-5);
        assert!((field.exit_distance_xz(Vec3::ZERO, -Vec3::X) - 5.0).abs() < 1e-5);
        let diag = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!((field.exit_distance_xz(Vec3::ZERO, diag) - 5.0 * 2f32.sqrt()).abs() < 1e-4);
        assert_eq!(field.exit_distance_xz(Vec3::ZERO, Vec3::Y), 0.0);
    }

    #[test]
    fn forward_is_flattened() {
        let tilted = Quat::from_rotation_x(-0.5);
        assert!(forward_xz(tilted).abs_diff_eq(Vec3::Z, 1e-5));
        assert_eq!(forward_xz(Quat::from_rotation_x(-FRAC_PI_2)), Vec3::Z);
    }

    #[test]
    fn move_towards_snaps_when_close() {
        let p = move_towards(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), 0.25);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 0.25), 1e-6));
        assert_eq!(move_towards(Vec3::ZERO, Vec3::X, 2.0), Vec3::X);
    }
}
