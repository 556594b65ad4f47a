//! Click handling and slot-path planning.
//!
//! A click on an idle cargo resolves to exactly one of four outcomes, in
//! order: bump into the nearest blocker ahead, resume toward an already
//! reserved slot, reserve the first empty slot, or bounce off the field
//! border when every slot is taken.

use glam::Vec3;
use wyrm_ecs::prelude::*;

use crate::components::{
    Blockers, CargoInfo, CargoMotion, CargoRegistry, CargoTransform, Click, FieldBorders,
    SlotIdentity, SlotReservation, SlotState, Waypoints,
};
use crate::geometry::{forward_xz, Aabb, BORDER_INSET};
use crate::tick::System;

pub const CARGO_CLICK_SYSTEM_NAME: &str = "cargo_click";

/// Extra lateral room granted to the forward blocker test.
const LATERAL_SLACK: f32 = 0.05;

/// Nearest blocker ahead of `start` along `forward`, no further than
/// `max_t`. Returns the blocker's center.
pub fn find_forward_blocker(
    world: &World,
    start: Vec3,
    forward: Vec3,
    own_radius: f32,
    blockers: &[Entity],
    max_t: f32,
) -> Option<Vec3> {
    let mut best: Option<(f32, Vec3)> = None;
    for &other in blockers {
        let (Some(t), Some(info)) = (
            world.get::<CargoTransform>(other),
            world.get::<CargoInfo>(other),
        ) else {
            continue;
        };
        let center = t.pose.position;
        let delta = Vec3::new(center.x - start.x, 0.0, center.z - start.z);
        let along = forward.dot(delta);
        if along <= 0.0 || along > max_t {
            continue;
        }
        if best.is_some_and(|(best_t, _)| along >= best_t) {
            continue;
        }
        let lateral = (delta - forward * along).length();
        if lateral <= own_radius + info.radius_xz() + LATERAL_SLACK {
            best = Some((along, center));
        }
    }
    best.map(|(_, center)| center)
}

/// Waypoints from `start` to the slot at `slot_point`.
///
/// The cargo first runs forward to the inset field border. Heading toward
/// the slot edge (+Z) it then turns straight up to the top lane; heading
/// away from it, it detours to the nearer side lane first so it never cuts
/// through the field. From the top lane it slides across to the slot's X
/// and drops into the slot.
pub fn plan_slot_path(start: Vec3, forward: Vec3, borders: &Aabb, slot_point: Vec3) -> Waypoints {
    let inner = borders.inset_xz(BORDER_INSET);
    let (min, max) = (inner.min(), inner.max());
    let y = start.y;
    let top_z = max.z;

    let t = inner.exit_distance_xz(start, forward);
    let exit = start + forward * t;
    let boundary = Vec3::new(exit.x, y, exit.z);

    let mut path = Waypoints::new();
    path.push(boundary);
    if forward.z < -1e-4 {
        let side_x = if (boundary.x - min.x).abs() <= (max.x - boundary.x).abs() {
            min.x
        } else {
            max.x
        };
        path.push(Vec3::new(side_x, y, boundary.z));
        path.push(Vec3::new(side_x, y, top_z));
    } else {
        path.push(Vec3::new(boundary.x, y, top_z));
    }
    path.push(Vec3::new(slot_point.x, y, top_z));
    path.push(Vec3::new(slot_point.x, y, slot_point.z));
    path
}

/// Resolves clicks into cargo motion.
#[derive(Default)]
pub struct CargoClickSystem {
    warned: bool,
}

impl CargoClickSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self, world: &mut World, click: Click) -> Result<(), EcsError> {
        let Some(cargo) = world
            .resource::<CargoRegistry>()
            .and_then(|r| r.entity(click.cargo))
        else {
            tracing::debug!(?click, "click on unknown cargo");
            return Ok(());
        };
        if !matches!(world.get::<CargoMotion>(cargo), Some(CargoMotion::Idle)) {
            tracing::debug!(%cargo, "click ignored, cargo busy or gone");
            return Ok(());
        }
        let (Some(transform), Some(info)) = (
            world.get::<CargoTransform>(cargo).copied(),
            world.get::<CargoInfo>(cargo).copied(),
        ) else {
            return Ok(());
        };
        let Some(FieldBorders(borders)) = world.resource::<FieldBorders>().copied() else {
            if !self.warned {
                self.warned = true;
                tracing::warn!("no field borders, clicks ignored");
            }
            return Ok(());
        };

        let start = transform.pose.position;
        let forward = forward_xz(transform.pose.rotation);
        let max_t = (borders.exit_distance_xz(start, forward) - BORDER_INSET).max(0.0);

        // 1. Blocker ahead.
        let blockers = world.get::<Blockers>(cargo).map(|b| b.0.clone()).unwrap_or_default();
        if let Some(center) =
            find_forward_blocker(world, start, forward, info.radius_xz(), &blockers, max_t)
        {
            let point = Vec3::new(center.x, start.y, center.z);
            tracing::debug!(%cargo, ?point, "cargo bumps into blocker");
            world.insert(cargo, CargoMotion::ToObstacle { point })?;
            return Ok(());
        }

        // 2..3. Existing reservation, else first empty slot by index.
        let mut slots: Vec<(u32, Entity)> = world
            .filter::<(SlotIdentity, SlotState)>()
            .into_iter()
            .filter_map(|e| world.get::<SlotIdentity>(e).map(|id| (id.0, e)))
            .collect();
        slots.sort_unstable();

        let reserved = slots.iter().find(|(_, slot)| {
            world
                .get::<SlotReservation>(*slot)
                .is_some_and(|r| r.cargo == cargo)
        });
        if let Some(&(index, _)) = reserved {
            tracing::debug!(%cargo, slot = index, "cargo resumes toward reserved slot");
            world.insert(cargo, to_slot(index))?;
            return Ok(());
        }

        let empty = slots
            .iter()
            .find(|(_, slot)| world.get::<SlotState>(*slot) == Some(&SlotState::Empty))
            .copied();
        if let Some((index, slot)) = empty {
            world.insert(slot, SlotState::Reserved)?;
            world.insert(slot, SlotReservation { cargo })?;
            tracing::debug!(%cargo, slot = index, "slot reserved");
            world.insert(cargo, to_slot(index))?;
            return Ok(());
        }

        // 4. Nowhere to go.
        let point = start + forward * max_t;
        tracing::debug!(%cargo, ?point, "no free slot, cargo bounces off border");
        world.insert(
            cargo,
            CargoMotion::ToObstacle {
                point: Vec3::new(point.x, start.y, point.z),
            },
        )?;
        Ok(())
    }
}

fn to_slot(slot: u32) -> CargoMotion {
    CargoMotion::ToSlot {
        slot,
        path: None,
        cursor: 0,
    }
}

impl System for CargoClickSystem {
    fn name(&self) -> &str {
        CARGO_CLICK_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, _dt: f32) {
        for click in world.drain_events::<Click>() {
            if let Err(err) = self.handle(world, click) {
                tracing::warn!(%err, "click handling failed");
            }
        }
    }
}
