//! Start-of-simulation parameters.
//!
//! A [`GameConfig`] is read once (usually from JSON), checked with
//! [`GameConfig::validate`], turned into its final form with
//! [`GameConfig::resolve`] and then shared read-only with every system
//! through an `Arc`.

use std::path::Path;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tick::TickConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config field '{field}' is {value}, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("cargo {cargo} lists blocker {blocker}, but only {count} cargo are configured")]
    BlockerOutOfRange {
        cargo: usize,
        blocker: usize,
        count: usize,
    },

    #[error("cargo {cargo} lists itself as a blocker")]
    SelfBlocking { cargo: usize },

    #[error("a path needs at least two distinct points, got {points}")]
    PathTooShort { points: usize },

    #[error("path has zero length")]
    PathZeroLength,
}

// ---------------------------------------------------------------------------
// Colors and categories
// ---------------------------------------------------------------------------

/// Color of a creature scale or cargo payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ScaleColor {
    Red,
    Yellow,
    Cyan,
    Purple,
    Pink,
    Green,
    Blue,
    Orange,
    /// "No color". Used when the color schedule is empty.
    #[default]
    White,
}

impl ScaleColor {
    /// The eight colors a cargo can carry.
    pub const PLAYABLE: [ScaleColor; 8] = [
        ScaleColor::Red,
        ScaleColor::Yellow,
        ScaleColor::Cyan,
        ScaleColor::Purple,
        ScaleColor::Pink,
        ScaleColor::Green,
        ScaleColor::Blue,
        ScaleColor::Orange,
    ];

    /// Bit ordinal of the color: Red is 0, White is 8.
    pub fn offset(self) -> u32 {
        self as u32
    }
}

/// Size class of a cargo object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CargoCategory {
    #[default]
    Small,
    Medium,
    Large,
}

/// One run of the creature's color schedule: `count` consecutive body
/// segments share `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRun {
    pub color: ScaleColor,
    pub count: i32,
    #[serde(default)]
    pub color_offset: u32,
}

/// Static description of one cargo object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoSpec {
    pub position: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
    pub half_extents: Vec3,
    pub color: ScaleColor,
    #[serde(default)]
    pub color_offset: u32,
    #[serde(default)]
    pub category: CargoCategory,
    /// How many scales the cargo unwinds once it reaches a slot.
    pub turns: i32,
    /// Indices of the cargo that stand in this one's way.
    #[serde(default)]
    pub blocking: Vec<usize>,
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_dispose() -> f32 {
    0.12
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub body_segment_count: u32,
    pub segment_spacing: f32,
    pub head_speed: f32,
    #[serde(default)]
    pub initial_head_distance: f32,
    #[serde(default = "default_true")]
    pub spawn_progressively: bool,
    #[serde(default)]
    pub scale_colors: Vec<ColorRun>,
    #[serde(default)]
    pub cargo: Vec<CargoSpec>,
    /// World-space point each slot receives cargo at, by slot index.
    #[serde(default)]
    pub slots: Vec<Vec3>,
    #[serde(default)]
    pub field_margin: f32,
    pub wind_seconds_per_scale: f32,
    pub rebuke_duration: f32,
    pub cargo_move_speed: f32,
    #[serde(default = "default_dispose")]
    pub slot_dispose_duration: f32,
    /// Derive the body length and color schedule from the cargo list.
    #[serde(default = "default_true")]
    pub derive_creature_from_cargo: bool,
    /// Seed for re-rolling every cargo's color.
    #[serde(default)]
    pub randomize_cargo_colors: Option<u64>,
    #[serde(default)]
    pub tick: TickConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            body_segment_count: 0,
            segment_spacing: 0.45,
            head_speed: 1.5,
            initial_head_distance: 0.0,
            spawn_progressively: true,
            scale_colors: Vec::new(),
            cargo: Vec::new(),
            slots: Vec::new(),
            field_margin: 0.5,
            wind_seconds_per_scale: 0.25,
            rebuke_duration: 0.3,
            cargo_move_speed: 8.0,
            slot_dispose_duration: default_dispose(),
            derive_creature_from_cargo: true,
            randomize_cargo_colors: None,
            tick: TickConfig::default(),
        }
    }
}

impl GameConfig {
    /// Lower bound applied to the per-scale unwind time and rebuke duration.
    pub const MIN_DURATION: f32 = 0.01;

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject values no simulation could run with.
    ///
    /// Zero speeds and durations pass: the systems clamp or no-op on them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("segment_spacing", self.segment_spacing),
            ("cargo_move_speed", self.cargo_move_speed),
            ("tick.fixed_dt", self.tick.fixed_dt),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "a finite value > 0",
                });
            }
        }
        let non_negative = [
            ("head_speed", self.head_speed),
            ("initial_head_distance", self.initial_head_distance),
            ("field_margin", self.field_margin),
            ("wind_seconds_per_scale", self.wind_seconds_per_scale),
            ("rebuke_duration", self.rebuke_duration),
            ("slot_dispose_duration", self.slot_dispose_duration),
            ("tick.max_dt", self.tick.max_dt),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    expected: "a finite value >= 0",
                });
            }
        }

        let count = self.cargo.len();
        for (cargo, spec) in self.cargo.iter().enumerate() {
            for &blocker in &spec.blocking {
                if blocker >= count {
                    return Err(ConfigError::BlockerOutOfRange {
                        cargo,
                        blocker,
                        count,
                    });
                }
                if blocker == cargo {
                    return Err(ConfigError::SelfBlocking { cargo });
                }
            }
        }
        Ok(())
    }

    /// Apply color randomization and cargo-driven creature derivation.
    pub fn resolve(mut self) -> Self {
        if let Some(seed) = self.randomize_cargo_colors {
            let mut rng = Pcg32::seed_from_u64(seed);
            for spec in &mut self.cargo {
                let color = ScaleColor::PLAYABLE[rng.gen_range(0..ScaleColor::PLAYABLE.len())];
                spec.color = color;
                spec.color_offset = color.offset();
            }
        }

        if self.derive_creature_from_cargo && !self.cargo.is_empty() {
            self.body_segment_count = self.cargo.iter().map(|c| c.turns.max(0) as u32).sum();
            self.scale_colors = self
                .cargo
                .iter()
                .filter(|c| c.turns > 0)
                .map(|c| ColorRun {
                    color: c.color,
                    count: c.turns,
                    color_offset: c.color_offset,
                })
                .collect();
        }

        if !self.spawn_progressively && self.initial_head_distance <= 0.0 {
            self.initial_head_distance =
                (self.body_segment_count as f32 + 1.0) * self.segment_spacing;
        }
        self
    }

    /// Seconds to unwind one scale, never below [`Self::MIN_DURATION`].
    pub fn seconds_per_scale(&self) -> f32 {
        self.wind_seconds_per_scale.max(Self::MIN_DURATION)
    }

    /// Rebuke smoothing time, never below [`Self::MIN_DURATION`].
    pub fn rebuke_seconds(&self) -> f32 {
        self.rebuke_duration.max(Self::MIN_DURATION)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cargo(color: ScaleColor, turns: i32) -> CargoSpec {
        CargoSpec {
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            half_extents: Vec3::splat(0.5),
            color,
            color_offset: color.offset(),
            category: CargoCategory::Small,
            turns,
            blocking: Vec::new(),
        }
    }

    #[test]
    fn color_offsets_are_ordinals() {
        assert_eq!(ScaleColor::Red.offset(), 0);
        assert_eq!(ScaleColor::Orange.offset(), 7);
        assert_eq!(ScaleColor::White.offset(), 8);
        assert_eq!(ScaleColor::default(), ScaleColor::White);
    }

    #[test]
    fn parses_minimal_json_with_defaults() {
        let json = r#"{
            "body_segment_count": 4,
            "segment_spacing": 0.5,
            "head_speed": 2.0,
            "wind_seconds_per_scale": 0.2,
            "rebuke_duration": 0.3,
            "cargo_move_speed": 6.0,
            "slots": [[0.0, 0.0, 5.0]]
        }"#;
        let config = GameConfig::from_json_str(json).unwrap();
        assert_eq!(config.body_segment_count, 4);
        assert!(config.spawn_progressively);
        assert!(config.derive_creature_from_cargo);
        assert_eq!(config.slot_dispose_duration, 0.12);
        assert_eq!(config.slots, vec![Vec3::new(0.0, 0.0, 5.0)]);
        assert_eq!(config.tick, TickConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn validate_rejects_zero_spacing() {
        let config = GameConfig {
            segment_spacing: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "segment_spacing", .. }));
    }

    #[test]
    fn validate_rejects_nan_speed() {
        let config = GameConfig {
            head_speed: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_checks_blockers() {
        let mut a = cargo(ScaleColor::Red, 1);
        a.blocking = vec![3];
        let config = GameConfig {
            cargo: vec![a, cargo(ScaleColor::Blue, 1)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlockerOutOfRange { cargo: 0, blocker: 3, count: 2 })
        ));

        let mut b = cargo(ScaleColor::Red, 1);
        b.blocking = vec![0];
        let config = GameConfig {
            cargo: vec![b],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SelfBlocking { cargo: 0 })));
    }

    #[test]
    fn resolve_derives_creature_from_cargo() {
        let config = GameConfig {
            body_segment_count: 99,
            cargo: vec![
                cargo(ScaleColor::Red, 2),
                cargo(ScaleColor::Green, 0),
                cargo(ScaleColor::Blue, 3),
            ],
            ..Default::default()
        }
        .resolve();
        assert_eq!(config.body_segment_count, 5);
        let colors: Vec<(ScaleColor, i32)> =
            config.scale_colors.iter().map(|r| (r.color, r.count)).collect();
        assert_eq!(colors, vec![(ScaleColor::Red, 2), (ScaleColor::Blue, 3)]);
    }

    #[test]
    fn resolve_keeps_explicit_schedule_when_not_deriving() {
        let config = GameConfig {
            body_segment_count: 7,
            derive_creature_from_cargo: false,
            cargo: vec![cargo(ScaleColor::Red, 2)],
            ..Default::default()
        }
        .resolve();
        assert_eq!(config.body_segment_count, 7);
        assert!(config.scale_colors.is_empty());
    }

    #[test]
    fn randomized_colors_are_seeded() {
        let base = GameConfig {
            cargo: (0..6).map(|_| cargo(ScaleColor::White, 1)).collect(),
            randomize_cargo_colors: Some(42),
            ..Default::default()
        };
        let a = base.clone().resolve();
        let b = base.resolve();
        assert_eq!(a.cargo, b.cargo);
        for spec in &a.cargo {
            assert_ne!(spec.color, ScaleColor::White);
            assert_eq!(spec.color_offset, spec.color.offset());
        }
    }

    #[test]
    fn all_at_once_starts_head_past_the_tail() {
        let config = GameConfig {
            body_segment_count: 3,
            segment_spacing: 0.5,
            spawn_progressively: false,
            derive_creature_from_cargo: false,
            ..Default::default()
        }
        .resolve();
        assert_eq!(config.initial_head_distance, 2.0);
    }

    #[test]
    fn durations_have_a_floor() {
        let config = GameConfig {
            wind_seconds_per_scale: 0.0,
            rebuke_duration: 0.001,
            ..Default::default()
        };
        assert_eq!(config.seconds_per_scale(), 0.01);
        assert_eq!(config.rebuke_seconds(), 0.01);
    }
}
