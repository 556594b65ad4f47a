use std::sync::Arc;

use glam::Vec3;
use wyrm_ecs::prelude::*;

use super::routing::plan_slot_path;
use crate::components::{
    Arrival, Blockers, CargoId, CargoInfo, CargoMotion, CargoTransform, FieldBorders,
    MotionKind, SlotIdentity, SlotTarget,
};
use crate::config::GameConfig;
use crate::geometry::{forward_xz, move_towards, yaw_towards, Aabb, ARRIVE_EPSILON};
use crate::tick::System;

pub const CARGO_STEP_SYSTEM_NAME: &str = "cargo_step";

/// One orthogonal step: only the axis with the larger remaining distance
/// moves. Tiny remainders move directly.
fn axis_step(from: Vec3, to: Vec3, step: f32) -> Vec3 {
    let d = to - from;
    if d.length_squared() < 1e-8 {
        return move_towards(from, to, step);
    }
    let mut next = Vec3::new(from.x, to.y, from.z);
    if d.x.abs() >= d.z.abs() {
        next.x += d.x.signum() * step.min(d.x.abs());
    } else {
        next.z += d.z.signum() * step.min(d.z.abs());
    }
    next
}

fn face_along(transform: &mut CargoTransform, displacement: Vec3) {
    if let Some(rotation) = yaw_towards(displacement) {
        transform.pose.rotation = rotation;
    }
}

/// Moves every non-idle cargo by `cargo_move_speed * dt` along its motion.
pub struct CargoStepSystem {
    config: Arc<GameConfig>,
    warned: bool,
}

impl CargoStepSystem {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self {
            config,
            warned: false,
        }
    }

    fn warn_once(&mut self, reason: &str) {
        if !self.warned {
            self.warned = true;
            tracing::warn!(reason, "cargo stepping disabled");
        }
    }

    fn blocked(world: &World, cargo: Entity, own: &Aabb) -> bool {
        let Some(Blockers(blockers)) = world.get::<Blockers>(cargo) else {
            return false;
        };
        blockers.iter().any(|&other| {
            match (world.get::<CargoTransform>(other), world.get::<CargoInfo>(other)) {
                (Some(t), Some(info)) => {
                    own.intersects(&Aabb::oriented(t.pose.position, t.pose.rotation, info.half_extents))
                }
                _ => false,
            }
        })
    }

    fn step_one(
        &self,
        world: &mut World,
        cargo: Entity,
        step: f32,
        borders: &Aabb,
        slots: &[(u32, Vec3)],
    ) -> Result<(), EcsError> {
        let (Some(mut motion), Some(mut transform)) = (
            world.get::<CargoMotion>(cargo).copied(),
            world.get::<CargoTransform>(cargo).copied(),
        ) else {
            return Ok(());
        };
        let before = motion.kind();
        let pos = transform.pose.position;

        if matches!(motion, CargoMotion::ToObstacle { .. }) && !borders.contains_xz(pos) {
            motion = CargoMotion::ToOrigin;
        }

        match motion {
            CargoMotion::Idle => return Ok(()),
            CargoMotion::ToSlot { slot, path, cursor } => {
                let Some(slot_point) = slots.iter().find(|(i, _)| *i == slot).map(|(_, p)| *p)
                else {
                    tracing::warn!(%cargo, slot, "cargo routed to unknown slot, returning");
                    motion = CargoMotion::ToOrigin;
                    return self.commit(world, cargo, before, motion, transform);
                };
                let path = path.unwrap_or_else(|| {
                    plan_slot_path(pos, forward_xz(transform.pose.rotation), borders, slot_point)
                });
                let mut cursor = cursor;
                if let Some(target) = path.get(cursor) {
                    let next = if cursor == 0 {
                        move_towards(pos, target, step)
                    } else {
                        axis_step(pos, target, step)
                    };
                    face_along(&mut transform, next - pos);
                    transform.pose.position = next;
                    if next.distance(target) <= ARRIVE_EPSILON {
                        transform.pose.position = target;
                        cursor += 1;
                    }
                }
                if cursor >= path.len() {
                    return self.arrive(world, cargo, slot);
                }
                motion = CargoMotion::ToSlot {
                    slot,
                    path: Some(path),
                    cursor,
                };
            }
            CargoMotion::ToObstacle { point } => {
                let next = move_towards(pos, point, step);
                face_along(&mut transform, next - pos);
                transform.pose.position = next;
                let info = world.get::<CargoInfo>(cargo).copied();
                let hit = info.is_some_and(|info| {
                    let own = Aabb::oriented(next, transform.pose.rotation, info.half_extents);
                    Self::blocked(world, cargo, &own)
                });
                if next.distance(point) <= ARRIVE_EPSILON || hit {
                    motion = CargoMotion::ToOrigin;
                }
            }
            CargoMotion::ToOrigin => {
                let next = move_towards(pos, transform.origin, step);
                face_along(&mut transform, next - pos);
                transform.pose.position = next;
                if next.distance(transform.origin) <= ARRIVE_EPSILON {
                    transform.pose.position = transform.origin;
                    transform.pose.rotation = transform.origin_rotation;
                    motion = CargoMotion::Idle;
                }
            }
        }
        self.commit(world, cargo, before, motion, transform)
    }

    fn commit(
        &self,
        world: &mut World,
        cargo: Entity,
        before: MotionKind,
        motion: CargoMotion,
        transform: CargoTransform,
    ) -> Result<(), EcsError> {
        if motion.kind() != before {
            tracing::debug!(%cargo, from = ?before, to = ?motion.kind(), "cargo motion changed");
        }
        world.insert(cargo, motion)?;
        world.insert(cargo, transform)?;
        Ok(())
    }

    fn arrive(&self, world: &mut World, cargo: Entity, slot: u32) -> Result<(), EcsError> {
        let (Some(id), Some(info)) = (
            world.get::<CargoId>(cargo).copied(),
            world.get::<CargoInfo>(cargo).copied(),
        ) else {
            return world.despawn(cargo);
        };
        tracing::debug!(%cargo, slot, turns = info.turns, "cargo arrived at slot");
        world.send_event(Arrival {
            slot,
            cargo: id,
            turns: info.turns,
            category: info.category,
            color: info.color,
            color_offset: info.color_offset,
        });
        world.despawn(cargo)
    }
}

impl System for CargoStepSystem {
    fn name(&self) -> &str {
        CARGO_STEP_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, dt: f32) {
        let Some(FieldBorders(borders)) = world.resource::<FieldBorders>().copied() else {
            self.warn_once("no field borders");
            return;
        };
        let speed = self.config.cargo_move_speed;
        if !(speed > 0.0) {
            self.warn_once("cargo move speed is not positive");
            return;
        }
        let step = speed * dt;

        let slots: Vec<(u32, Vec3)> = world
            .filter::<(SlotIdentity, SlotTarget)>()
            .into_iter()
            .filter_map(|e| Some((world.get::<SlotIdentity>(e)?.0, world.get::<SlotTarget>(e)?.0)))
            .collect();

        for cargo in world.filter::<(CargoMotion, CargoTransform)>() {
            if let Err(err) = self.step_one(world, cargo, step, &borders, &slots) {
                tracing::warn!(%cargo, %err, "cargo step failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_step_moves_one_axis() {
        let next = axis_step(Vec3::ZERO, Vec3::new(3.0, 0.0, 1.0), 0.5);
        assert_eq!(next, Vec3::new(0.5, 0.0, 0.0));
        let next = axis_step(Vec3::ZERO, Vec3::new(-1.0, 0.0, -4.0), 0.5);
        assert_eq!(next, Vec3::new(0.0, 0.0, -0.5));
        let next = axis_step(Vec3::ZERO, Vec3::new(0.2, 0.0, 0.0), 0.5);
        assert_eq!(next, Vec3::new(0.2, 0.0, 0.0));
    }

    #[test]
    fn face_along_ignores_zero_motion() {
        let mut t = CargoTransform {
            pose: crate::path::Pose::IDENTITY,
            origin: Vec3::ZERO,
            origin_rotation: glam::Quat::IDENTITY,
        };
        face_along(&mut t, Vec3::ZERO);
        assert_eq!(t.pose.rotation, glam::Quat::IDENTITY);
        face_along(&mut t, Vec3::X);
        assert!((t.pose.rotation * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }
}
