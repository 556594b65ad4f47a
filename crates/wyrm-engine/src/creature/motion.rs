use std::sync::Arc;

use wyrm_ecs::prelude::*;

use super::{follower_distance, Rebuke, RebukeLedger};
use crate::components::{
    FollowOffset, PartKind, PathFollower, ReachedEnd, RebukeEnvelope, RebukeRequest,
};
use crate::config::GameConfig;
use crate::path::{PathProvider, Pose};
use crate::tick::System;

pub const CREATURE_MOTION_SYSTEM_NAME: &str = "creature_motion";

/// Moves the head along the path, applies queued rebukes and places every
/// follower at its offset behind the head.
pub struct CreatureMotionSystem {
    config: Arc<GameConfig>,
    path: Arc<dyn PathProvider>,
}

impl CreatureMotionSystem {
    pub fn new(config: Arc<GameConfig>, path: Arc<dyn PathProvider>) -> Self {
        Self { config, path }
    }

    fn queue_rebukes(&self, world: &mut World) {
        let requests = world.drain_events::<RebukeRequest>();
        if requests.is_empty() {
            return;
        }
        let duration = self.config.rebuke_seconds();
        let Some(ledger) = world.resource_mut::<RebukeLedger>() else {
            return;
        };
        for request in requests {
            if request.index < 0 || !(request.shift > 0.0) {
                tracing::debug!(?request, "ignoring malformed rebuke");
                continue;
            }
            tracing::debug!(index = request.index, shift = request.shift, "rebuke queued");
            ledger.push(Rebuke::new(request.index as u32, request.shift, duration));
        }
    }

    fn move_heads(&self, world: &mut World, dt: f32, total_applied: f32) {
        let length = self.path.length();
        let envelope = world.resource::<RebukeLedger>().and_then(|l| {
            let latest = l.latest_rising()?;
            Some((*latest, l.total_applied()))
        });

        for head in world.filter::<(PathFollower,)>() {
            let Some(follower) = world.get_mut::<PathFollower>(head) else {
                continue;
            };
            follower.raw_distance += follower.speed * dt;
            let mut rendered = (follower.raw_distance - total_applied).max(0.0);
            let mut just_reached = false;
            if rendered >= length {
                rendered = length;
                if !follower.reached_end {
                    follower.reached_end = true;
                    just_reached = true;
                }
            }
            follower.distance = rendered;
            let raw = follower.raw_distance;

            let _ = world.insert::<Pose>(head, self.path.evaluate(rendered));
            if just_reached {
                tracing::debug!(%head, "creature reached end of path");
                world.send_event(ReachedEnd { head });
            }

            match envelope {
                Some((rebuke, total)) => {
                    let start = raw - (total - rebuke.applied);
                    let _ = world.insert(
                        head,
                        RebukeEnvelope {
                            start_distance: start,
                            target_distance: start - rebuke.shift,
                            elapsed: rebuke.elapsed,
                            duration: rebuke.duration,
                        },
                    );
                }
                None => {
                    world.remove::<RebukeEnvelope>(head);
                }
            }
        }
    }

    fn move_followers(&self, world: &mut World) {
        let length = self.path.length();
        for segment in world.filter::<(FollowOffset, PartKind)>() {
            let (Some(link), Some(kind)) = (
                world.get::<FollowOffset>(segment).copied(),
                world.get::<PartKind>(segment).copied(),
            ) else {
                continue;
            };
            // A follower whose head is gone stays where it is.
            let Some(head_distance) = world.get::<PathFollower>(link.head).map(|f| f.distance) else {
                continue;
            };
            let distance = follower_distance(
                world.resource::<RebukeLedger>(),
                head_distance,
                link.offset,
                kind,
                length,
            );
            let pose = self.path.evaluate(distance);
            if let Some(p) = world.get_mut::<Pose>(segment) {
                *p = pose;
            }
        }
    }
}

impl System for CreatureMotionSystem {
    fn name(&self) -> &str {
        CREATURE_MOTION_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        if world.resource::<RebukeLedger>().is_none() {
            world.insert_resource(RebukeLedger::default());
        }
    }

    fn run(&mut self, world: &mut World, dt: f32) {
        self.queue_rebukes(world);
        let total_applied = match world.resource_mut::<RebukeLedger>() {
            Some(ledger) => {
                ledger.advance(dt);
                ledger.total_applied()
            }
            None => 0.0,
        };
        self.move_heads(world, dt, total_applied);
        self.move_followers(world);
    }
}
