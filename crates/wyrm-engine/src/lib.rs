//! Wyrm Engine -- deterministic simulation core for the wyrm puzzle.
//!
//! A segmented creature crawls along a fixed path, growing one scale at a
//! time. The player clicks cargo blocks, which route themselves to collection
//! slots; each filled slot unwinds matching-colored scales off the creature,
//! and the creature smoothly closes every gap it leaves.
//!
//! This crate builds on [`wyrm_ecs`]: the [`tick::Scheduler`] runs a fixed,
//! ordered list of [`tick::System`]s over one world, and
//! [`simulation::Simulation`] wires the gameplay systems together behind a
//! frame-in, [`view::Frame`]-out interface.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use wyrm_engine::prelude::*;
//!
//! let config = GameConfig::from_json_str(r#"{
//!     "body_segment_count": 0,
//!     "segment_spacing": 0.5,
//!     "head_speed": 2.0,
//!     "wind_seconds_per_scale": 0.25,
//!     "rebuke_duration": 0.3,
//!     "cargo_move_speed": 8.0,
//!     "slots": [[0.0, 0.0, 8.0]],
//!     "cargo": [
//!         { "position": [0.0, 0.0, 0.0], "half_extents": [0.4, 0.4, 0.4],
//!           "color": "Red", "turns": 2 }
//!     ]
//! }"#).unwrap();
//! let path = PolylinePath::new([Vec3::new(-6.0, 0.0, -6.0), Vec3::new(-6.0, 0.0, 30.0)]).unwrap();
//! let mut sim = Simulation::new(config, Arc::new(path)).unwrap();
//!
//! sim.step_with(1.0 / 60.0, Some(Click { point: Vec3::ZERO, cargo: CargoId(0) }));
//! for _ in 0..240 {
//!     sim.step(1.0 / 60.0, &mut NoInput);
//! }
//! assert!(sim.frame().cargo.is_empty());
//! ```

#![deny(unsafe_code)]

pub mod cargo;
pub mod components;
pub mod config;
pub mod creature;
pub mod geometry;
pub mod path;
pub mod simulation;
pub mod slots;
pub mod tick;
pub mod view;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use wyrm_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use wyrm_ecs::prelude::*;

    pub use crate::components::{
        CargoId, CargoMotion, Click, MotionKind, PartKind, SlotState,
    };
    pub use crate::config::{
        CargoCategory, CargoSpec, ColorRun, ConfigError, GameConfig, ScaleColor,
    };
    pub use crate::path::{PathProvider, PolylinePath, Pose};
    pub use crate::simulation::Simulation;
    pub use crate::tick::{Scheduler, System, TickConfig, TickDiagnostics};
    pub use crate::view::{
        CargoView, Frame, InputSource, NoInput, ScriptedInput, SegmentView, SlotView, VisualSink,
    };
}
