use std::sync::Arc;

use wyrm_ecs::prelude::*;

use super::{spawn_segment, RebukeLedger};
use crate::components::{PartKind, PathFollower, SpawnProgress};
use crate::config::GameConfig;
use crate::path::{PathProvider, Pose};
use crate::tick::System;

pub const CREATURE_SPAWN_SYSTEM_NAME: &str = "creature_spawn";

/// Creates the head at the configured start distance. With progressive
/// spawning off, the whole body and the tail are created as well.
pub struct CreatureSpawnSystem {
    config: Arc<GameConfig>,
    path: Arc<dyn PathProvider>,
}

impl CreatureSpawnSystem {
    pub fn new(config: Arc<GameConfig>, path: Arc<dyn PathProvider>) -> Self {
        Self { config, path }
    }

    fn spawn(&self, world: &mut World) -> Result<Entity, EcsError> {
        let length = self.path.length();
        let start = self.config.initial_head_distance.clamp(0.0, length);

        let head = world.spawn();
        world.insert(head, PartKind::Head)?;
        world.insert(
            head,
            PathFollower {
                raw_distance: start,
                distance: start,
                speed: self.config.head_speed,
                reached_end: false,
            },
        )?;
        world.insert(
            head,
            SpawnProgress {
                spawned_body: 0,
                tail_spawned: false,
                max_distance_reached: start,
            },
        )?;
        world.insert::<Pose>(head, self.path.evaluate(start))?;
        tracing::info!(%head, start, path_length = length, "creature head spawned");

        if !self.config.spawn_progressively {
            let total = self.config.body_segment_count;
            for index in 0..total {
                spawn_segment(world, head, PartKind::Body(index), &self.config, self.path.as_ref())?;
            }
            spawn_segment(world, head, PartKind::Tail(total), &self.config, self.path.as_ref())?;
            if let Some(progress) = world.get_mut::<SpawnProgress>(head) {
                progress.spawned_body = total;
                progress.tail_spawned = true;
            }
        }
        Ok(head)
    }
}

impl System for CreatureSpawnSystem {
    fn name(&self) -> &str {
        CREATURE_SPAWN_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        if world.resource::<RebukeLedger>().is_none() {
            world.insert_resource(RebukeLedger::default());
        }
        if let Err(err) = self.spawn(world) {
            tracing::warn!(%err, "creature spawn failed");
        }
    }
}
