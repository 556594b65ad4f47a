//! The assembled game core.
//!
//! [`Simulation`] validates a [`GameConfig`], builds the gameplay world and
//! registers every system in its fixed order. Callers drive it one frame at a
//! time and read back a [`Frame`].
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use wyrm_engine::prelude::*;
//!
//! let path = PolylinePath::new([Vec3::ZERO, Vec3::new(0.0, 0.0, 20.0)]).unwrap();
//! let config = GameConfig {
//!     body_segment_count: 4,
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config, Arc::new(path)).unwrap();
//!
//! for _ in 0..120 {
//!     sim.step(1.0 / 60.0, &mut NoInput);
//! }
//! assert_eq!(sim.frame().body_count(), 4);
//! assert_eq!(sim.state_hash().len(), 64);
//! ```

use std::sync::Arc;

use serde::Serialize;
use wyrm_ecs::prelude::*;

use crate::cargo::{CargoClickSystem, CargoInitSystem, CargoStepSystem, FieldBordersSystem};
use crate::components::Click;
use crate::config::{ConfigError, GameConfig};
use crate::creature::{CreatureGrowthSystem, CreatureMotionSystem, CreatureSpawnSystem};
use crate::path::{PathProvider, Pose};
use crate::slots::{SlotAssignSystem, SlotInitSystem, SlotWindSystem};
use crate::tick::{Scheduler, TickDiagnostics};
use crate::view::{EventCleanupSystem, Frame, InputSource, ViewSyncSystem, VisualSink};

pub struct Simulation {
    scheduler: Scheduler,
    config: Arc<GameConfig>,
    frame: Frame,
}

impl Simulation {
    /// Validate and resolve `config`, then build and initialize every system.
    pub fn new(config: GameConfig, path: Arc<dyn PathProvider>) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config.resolve());

        let world = World::with_config(WorldConfig::gameplay());
        let mut scheduler = Scheduler::new(world, config.tick.clone());

        let cfg = || Arc::clone(&config);
        let path_ref = || Arc::clone(&path);
        scheduler.add_system(Box::new(CreatureSpawnSystem::new(cfg(), path_ref())));
        scheduler.add_system(Box::new(FieldBordersSystem::new(cfg())));
        scheduler.add_system(Box::new(CargoInitSystem::new(cfg())));
        scheduler.add_system(Box::new(CreatureMotionSystem::new(cfg(), path_ref())));
        scheduler.add_system(Box::new(CreatureGrowthSystem::new(cfg(), path_ref())));
        scheduler.add_system(Box::new(SlotInitSystem::new(cfg())));
        scheduler.add_system(Box::new(CargoClickSystem::new()));
        scheduler.add_system(Box::new(CargoStepSystem::new(cfg())));
        scheduler.add_system(Box::new(SlotAssignSystem::new()));
        scheduler.add_system(Box::new(SlotWindSystem::new(cfg(), path_ref())));
        scheduler.add_system(Box::new(ViewSyncSystem::new()));
        scheduler.add_system(Box::new(EventCleanupSystem));
        scheduler.init();

        tracing::info!(
            body_segments = config.body_segment_count,
            cargo = config.cargo.len(),
            slots = config.slots.len(),
            path_length = path.length(),
            "simulation ready"
        );

        Ok(Self {
            scheduler,
            config,
            frame: Frame::default(),
        })
    }

    /// Advance one tick, polling `input` at most once.
    pub fn step(&mut self, dt: f32, input: &mut dyn InputSource) -> &Frame {
        let click = input.poll_click();
        self.step_with(dt, click)
    }

    /// Advance one tick with an explicit optional click.
    pub fn step_with(&mut self, dt: f32, click: Option<Click>) -> &Frame {
        if let Some(click) = click {
            tracing::debug!(?click, "click received");
            self.scheduler.world_mut().send_event(click);
        }
        self.scheduler.tick(dt);
        if let Some(frame) = self.scheduler.world_mut().remove_resource::<Frame>() {
            self.frame = frame;
        }
        &self.frame
    }

    /// Run `count` ticks of the configured fixed step with no input.
    pub fn run_ticks(&mut self, count: u64) -> &Frame {
        let dt = self.config.tick.fixed_dt;
        for _ in 0..count {
            self.step_with(dt, None);
        }
        &self.frame
    }

    /// The frame produced by the most recent tick.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn present(&self, sink: &mut dyn VisualSink) {
        sink.present(&self.frame);
    }

    pub fn head_pose(&self) -> Option<Pose> {
        self.frame.head
    }

    /// Pose of the scale slot `slot` is currently unwinding, if any.
    pub fn slot_wind_target(&self, slot: u32) -> Option<Pose> {
        self.frame.slot(slot).and_then(|s| s.wind_target)
    }

    /// BLAKE3 hex digest of the current frame.
    ///
    /// Equal configs fed equal inputs produce equal hashes.
    pub fn state_hash(&self) -> String {
        #[derive(Serialize)]
        struct Hashable<'a> {
            tick: u64,
            fixed_dt: f32,
            frame: &'a Frame,
        }

        let bytes = serde_json::to_vec(&Hashable {
            tick: self.scheduler.tick_count(),
            fixed_dt: self.config.tick.fixed_dt,
            frame: &self.frame,
        })
        .expect("Frame should always be JSON-serializable");
        blake3::hash(&bytes).to_hex().to_string()
    }

    pub fn tick_count(&self) -> u64 {
        self.scheduler.tick_count()
    }

    pub fn sim_time(&self) -> f64 {
        self.scheduler.sim_time()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        self.scheduler.world()
    }

    pub fn diagnostics(&self) -> &TickDiagnostics {
        self.scheduler.last_diagnostics()
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.scheduler.system_names()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.scheduler.tick_count())
            .field("systems", &self.scheduler.system_count())
            .finish()
    }
}
