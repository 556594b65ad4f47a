use std::sync::Arc;

use wyrm_ecs::prelude::*;

use super::spawn_segment;
use crate::components::{PartKind, PathFollower, SpawnProgress};
use crate::config::GameConfig;
use crate::path::PathProvider;
use crate::tick::System;

pub const CREATURE_GROWTH_SYSTEM_NAME: &str = "creature_growth";

/// Spawns at most one segment per tick as the head's furthest reach passes
/// each spacing threshold: body segments first, then the tail.
pub struct CreatureGrowthSystem {
    config: Arc<GameConfig>,
    path: Arc<dyn PathProvider>,
    warned: bool,
}

impl CreatureGrowthSystem {
    pub fn new(config: Arc<GameConfig>, path: Arc<dyn PathProvider>) -> Self {
        Self {
            config,
            path,
            warned: false,
        }
    }

    fn grow(&self, world: &mut World, head: Entity, dt: f32) -> Result<(), EcsError> {
        let spacing = self.config.segment_spacing;
        let total = self.config.body_segment_count;
        let Some(follower) = world.get::<PathFollower>(head).copied() else {
            return Ok(());
        };
        let Some(progress) = world.get_mut::<SpawnProgress>(head) else {
            return Ok(());
        };

        // Only forward travel counts; rebukes never lower the reach.
        let advanced = progress.max_distance_reached + (follower.speed * dt).max(0.0);
        progress.max_distance_reached = advanced.max(follower.raw_distance);
        let reach = progress.max_distance_reached;

        if progress.spawned_body < total {
            let index = progress.spawned_body;
            if reach >= (index as f32 + 1.0) * spacing {
                progress.spawned_body += 1;
                spawn_segment(world, head, PartKind::Body(index), &self.config, self.path.as_ref())?;
            }
        } else if !progress.tail_spawned && reach >= (total as f32 + 1.0) * spacing {
            progress.tail_spawned = true;
            spawn_segment(world, head, PartKind::Tail(total), &self.config, self.path.as_ref())?;
        }
        Ok(())
    }
}

impl System for CreatureGrowthSystem {
    fn name(&self) -> &str {
        CREATURE_GROWTH_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, dt: f32) {
        if !(self.config.segment_spacing > 0.0) || self.config.body_segment_count == 0 {
            if !self.warned {
                self.warned = true;
                tracing::warn!(
                    spacing = self.config.segment_spacing,
                    segments = self.config.body_segment_count,
                    "creature growth disabled by configuration"
                );
            }
            return;
        }
        for head in world.filter::<(PathFollower, SpawnProgress)>() {
            if let Err(err) = self.grow(world, head, dt) {
                tracing::warn!(%err, "creature growth skipped");
            }
        }
    }
}
