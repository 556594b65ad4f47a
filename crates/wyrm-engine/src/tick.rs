//! Registration-ordered system scheduler.
//!
//! The [`Scheduler`] owns the gameplay [`World`] and a fixed list of
//! [`System`]s. Systems are registered once, before the first tick. The first
//! call to [`Scheduler::init`] (or the first [`Scheduler::tick`]) runs every
//! system's `init` in registration order; each tick then runs every system's
//! `run` in the same order, exactly once.
//!
//! There is no command buffer: a system mutates the world in place, so its
//! writes are visible to every system after it in the same tick and to none
//! before it.
//!
//! # Example
//!
//! ```
//! use wyrm_engine::tick::{Scheduler, System, TickConfig};
//! use wyrm_ecs::prelude::*;
//!
//! struct Counter;
//!
//! impl System for Counter {
//!     fn name(&self) -> &str {
//!         "counter"
//!     }
//!
//!     fn init(&mut self, world: &mut World) {
//!         world.insert_resource(0u32);
//!     }
//!
//!     fn run(&mut self, world: &mut World, _dt: f32) {
//!         if let Some(n) = world.resource_mut::<u32>() {
//!             *n += 1;
//!         }
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new(World::new(), TickConfig::default());
//! scheduler.add_system(Box::new(Counter));
//! scheduler.run_ticks(10);
//!
//! assert_eq!(scheduler.tick_count(), 10);
//! assert_eq!(scheduler.world().resource::<u32>(), Some(&10));
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use wyrm_ecs::world::World;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Time-step settings for the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Step used by [`Scheduler::run_ticks`]. Must be positive and finite.
    pub fixed_dt: f32,
    /// Upper bound applied to every delta handed to systems.
    pub max_dt: f32,
}

impl Default for TickConfig {
    /// 60 Hz, with deltas capped at a tenth of a second.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_dt: 0.1,
        }
    }
}

impl TickConfig {
    /// Clamp a frame delta into `[0, max_dt]`. Non-finite deltas become 0.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        dt.min(self.max_dt)
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
    /// The delta handed to systems after clamping.
    pub dt: f32,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// One stage of the per-tick pipeline.
///
/// Dependencies (configuration, path provider) are handed to the system's
/// constructor; the scheduler only supplies the world and the delta.
pub trait System {
    /// Unique name, used for diagnostics and logging.
    fn name(&self) -> &str;

    /// Runs once, before the first tick.
    fn init(&mut self, _world: &mut World) {}

    /// Runs once per tick.
    fn run(&mut self, _world: &mut World, _dt: f32) {}
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler {
    world: World,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
    tick_counter: u64,
    sim_time: f64,
    config: TickConfig,
    last_diagnostics: TickDiagnostics,
}

impl Scheduler {
    /// Create a scheduler around `world`.
    ///
    /// # Panics
    ///
    /// Panics if `fixed_dt` is not positive and finite, or `max_dt` is
    /// negative.
    pub fn new(world: World, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        assert!(
            config.max_dt >= 0.0,
            "max_dt must not be negative, got {}",
            config.max_dt
        );
        Self {
            world,
            systems: Vec::new(),
            initialized: false,
            tick_counter: 0,
            sim_time: 0.0,
            config,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Append a system to the pipeline.
    ///
    /// # Panics
    ///
    /// - If a system with the same name is already registered.
    /// - If the scheduler has already been initialized.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        assert!(
            !self.initialized,
            "system {:?} registered after initialization",
            system.name()
        );
        assert!(
            !self.systems.iter().any(|s| s.name() == system.name()),
            "duplicate system name: {:?}",
            system.name()
        );
        self.systems.push(system);
    }

    /// Run every system's `init` in registration order. Idempotent.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        for system in &mut self.systems {
            system.init(&mut self.world);
        }
        tracing::info!(systems = self.systems.len(), "scheduler initialized");
    }

    /// Execute one tick with the given frame delta.
    ///
    /// The delta is clamped into `[0, max_dt]` before any system sees it, so
    /// a stalled or reversed clock never runs state backwards.
    pub fn tick(&mut self, dt: f32) {
        self.init();
        let dt = self.config.clamp_dt(dt);

        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let sys_start = Instant::now();
            system.run(&mut self.world, dt);
            let elapsed = sys_start.elapsed();
            tracing::trace!(system = system.name(), ?elapsed, "system ran");
            system_times.push((system.name().to_owned(), elapsed));
        }

        self.tick_counter += 1;
        self.sim_time += f64::from(dt);
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
            dt,
        };
    }

    /// Run `count` ticks of `fixed_dt` each.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick(self.config.fixed_dt);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Sum of the clamped deltas of every tick so far, in seconds.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup, input injection and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
