//! The path the creature travels along.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Position plus orientation. Forward is +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Arc-length parameterized path.
///
/// `evaluate` must accept any distance and clamp it into `[0, length()]`.
pub trait PathProvider: Send + Sync {
    fn length(&self) -> f32;

    fn evaluate(&self, distance: f32) -> Pose;

    /// Position at the far end of the path.
    fn end_point(&self) -> Vec3 {
        self.evaluate(self.length()).position
    }
}

/// Rotation looking along `dir` with +Y up. `None` for a zero vector.
pub fn look_rotation(dir: Vec3) -> Option<Quat> {
    let dir = dir.try_normalize()?;
    let yaw = dir.x.atan2(dir.z);
    let pitch = -dir.y.clamp(-1.0, 1.0).asin();
    Some(Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0))
}

// ---------------------------------------------------------------------------
// PolylinePath
// ---------------------------------------------------------------------------

/// Straight segments between control points.
#[derive(Debug, Clone)]
pub struct PolylinePath {
    points: Vec<Vec3>,
    /// `cumulative[i]` is the distance from the start to `points[i]`.
    cumulative: Vec<f32>,
}

impl PolylinePath {
    /// Build a path through `points`. Consecutive duplicates are dropped.
    pub fn new(points: impl IntoIterator<Item = Vec3>) -> Result<Self, ConfigError> {
        let mut deduped: Vec<Vec3> = Vec::new();
        for p in points {
            if deduped.last().map_or(true, |last| last.distance_squared(p) > 1e-12) {
                deduped.push(p);
            }
        }
        if deduped.len() < 2 {
            return Err(ConfigError::PathTooShort {
                points: deduped.len(),
            });
        }

        let mut cumulative = Vec::with_capacity(deduped.len());
        let mut total = 0.0f32;
        cumulative.push(0.0);
        for pair in deduped.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }
        if !(total.is_finite() && total > 0.0) {
            return Err(ConfigError::PathZeroLength);
        }
        Ok(Self {
            points: deduped,
            cumulative,
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl PathProvider for PolylinePath {
    fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn evaluate(&self, distance: f32) -> Pose {
        let d = if distance.is_finite() {
            distance.clamp(0.0, self.length())
        } else {
            0.0
        };
        // Segment whose end lies at or beyond `d`.
        let seg = self
            .cumulative
            .partition_point(|&c| c < d)
            .clamp(1, self.points.len() - 1);
        let (a, b) = (self.points[seg - 1], self.points[seg]);
        let span = self.cumulative[seg] - self.cumulative[seg - 1];
        let t = ((d - self.cumulative[seg - 1]) / span).clamp(0.0, 1.0);
        let rotation = look_rotation(b - a).unwrap_or(Quat::IDENTITY);
        Pose::new(a.lerp(b, t), rotation)
    }

    fn end_point(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_path() -> PolylinePath {
        PolylinePath::new([
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(3.0, 0.0, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn length_is_sum_of_segments() {
        assert!((l_path().length() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn evaluate_interpolates_and_clamps() {
        let path = l_path();
        assert!(path.evaluate(2.0).position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
        assert!(path.evaluate(5.5).position.abs_diff_eq(Vec3::new(1.5, 0.0, 4.0), 1e-5));
        assert_eq!(path.evaluate(-3.0).position, Vec3::ZERO);
        assert!(path.evaluate(100.0).position.abs_diff_eq(Vec3::new(3.0, 0.0, 4.0), 1e-5));
        assert_eq!(path.evaluate(f32::NAN).position, Vec3::ZERO);
    }

    #[test]
    fn orientation_faces_along_segment() {
        let path = l_path();
        let fwd = path.evaluate(1.0).rotation * Vec3::Z;
        assert!(fwd.abs_diff_eq(Vec3::Z, 1e-5));
        let fwd = path.evaluate(6.0).rotation * Vec3::Z;
        assert!(fwd.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn degenerate_paths_are_rejected() {
        assert!(matches!(
            PolylinePath::new([Vec3::ONE]),
            Err(ConfigError::PathTooShort { points: 1 })
        ));
        assert!(matches!(
            PolylinePath::new([Vec3::ONE, Vec3::ONE]),
            Err(ConfigError::PathTooShort { points: 1 })
        ));
    }

    #[test]
    fn look_rotation_handles_pitch() {
        let q = look_rotation(Vec3::new(0.0, 1.0, 1.0)).unwrap();
        let fwd = q * Vec3::Z;
        assert!(fwd.abs_diff_eq(Vec3::new(0.0, 1.0, 1.0).normalize(), 1e-5));
        assert!(look_rotation(Vec3::ZERO).is_none());
    }
}
