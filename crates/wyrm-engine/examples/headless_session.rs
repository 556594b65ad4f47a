//! Headless wyrm session -- scripted clicks, text output, final state hash.
//!
//! Run with:
//!   cargo run --example headless_session -p wyrm-engine [-- level.json]
//!
//! Without an argument a built-in three-cargo level is played. Set
//! `RUST_LOG=wyrm_engine=debug` to watch every state transition.

use std::sync::Arc;

use anyhow::Context;
use glam::Vec3;
use wyrm_engine::prelude::*;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

fn block(x: f32, color: ScaleColor, turns: i32) -> CargoSpec {
    CargoSpec {
        position: Vec3::new(x, 0.0, 0.0),
        yaw_degrees: 0.0,
        half_extents: Vec3::splat(0.4),
        color,
        color_offset: color.offset(),
        category: CargoCategory::Small,
        turns,
        blocking: Vec::new(),
    }
}

fn builtin_level() -> GameConfig {
    GameConfig {
        cargo: vec![
            block(-2.0, ScaleColor::Red, 2),
            block(0.0, ScaleColor::Blue, 3),
            block(2.0, ScaleColor::Red, 1),
        ],
        slots: vec![Vec3::new(-1.0, 0.0, 6.0), Vec3::new(1.0, 0.0, 6.0)],
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Prints a one-line summary once per simulated second.
struct TextSink {
    every: u64,
}

impl VisualSink for TextSink {
    fn present(&mut self, frame: &Frame) {
        if frame.tick % self.every != 0 && !frame.reached_end {
            return;
        }
        let slots: Vec<String> = frame
            .slots
            .iter()
            .map(|s| format!("{}:{:?}({}/{})", s.index, s.state, s.current, s.target))
            .collect();
        println!(
            "tick {:>5} | head {:>6.2} | scales {:>2} | cargo {} | slots [{}]{}",
            frame.tick,
            frame.head.map_or(0.0, |h| h.position.z),
            frame.body_count(),
            frame.cargo.len(),
            slots.join(" "),
            if frame.reached_end { " | reached end" } else { "" },
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::from_json_file(&path)
            .with_context(|| format!("loading level from {path}"))?,
        None => builtin_level(),
    };
    let fixed_dt = config.tick.fixed_dt;

    let path = PolylinePath::new([
        Vec3::new(-8.0, 0.0, -4.0),
        Vec3::new(-8.0, 0.0, 10.0),
        Vec3::new(8.0, 0.0, 10.0),
        Vec3::new(8.0, 0.0, -4.0),
    ])?;
    let mut sim = Simulation::new(config, Arc::new(path))?;

    let cargo_count = sim.config().cargo.len() as u32;
    let script = (0..cargo_count).map(|id| {
        (
            30 + u64::from(id) * 45,
            Click {
                point: Vec3::ZERO,
                cargo: CargoId(id),
            },
        )
    });
    let mut input = ScriptedInput::new(script);
    let mut sink = TextSink { every: 60 };

    for _ in 0..1200 {
        sim.step(fixed_dt, &mut input);
        sim.present(&mut sink);
    }

    let total: std::time::Duration = sim.diagnostics().system_times.iter().map(|(_, t)| *t).sum();
    println!("ticks:      {}", sim.tick_count());
    println!("sim time:   {:.2}s", sim.sim_time());
    println!("last tick:  {total:?} across {} systems", sim.system_names().len());
    println!("state hash: {}", sim.state_hash());
    Ok(())
}
