use std::sync::Arc;

use wyrm_ecs::prelude::*;

use crate::components::{
    PartKind, RebukeRequest, ScaleVisualState, SlotCargoColor, SlotCargoLoad, SlotIdentity,
    SlotState, SlotWindState,
};
use crate::config::{GameConfig, ScaleColor};
use crate::path::{PathProvider, Pose};
use crate::tick::System;

pub const SLOT_WIND_SYSTEM_NAME: &str = "slot_wind";

/// Drives occupied and disposing slots.
///
/// An occupied slot unwinds one scale of its color at a time. Candidates
/// are body segments not already claimed by another slot; the lowest body
/// index wins, ties go to the segment nearest the end of the path.
pub struct SlotWindSystem {
    config: Arc<GameConfig>,
    path: Arc<dyn PathProvider>,
}

impl SlotWindSystem {
    pub fn new(config: Arc<GameConfig>, path: Arc<dyn PathProvider>) -> Self {
        Self { config, path }
    }

    fn pick_scale(&self, world: &mut World, color: ScaleColor) -> Option<Entity> {
        let end = self.path.end_point();
        world
            .filter::<(PartKind, ScaleColor, ScaleVisualState)>()
            .into_iter()
            .filter_map(|e| {
                let PartKind::Body(index) = *world.get::<PartKind>(e)? else {
                    return None;
                };
                if *world.get::<ScaleColor>(e)? != color || world.get::<ScaleVisualState>(e)?.unwinding {
                    return None;
                }
                let dist = world
                    .get::<Pose>(e)
                    .map_or(f32::MAX, |p| p.position.distance_squared(end));
                Some((index, dist, e))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
            .map(|(_, _, e)| e)
    }

    fn set_state(world: &mut World, slot: Entity, state: SlotState) -> Result<(), EcsError> {
        let index = world.get::<SlotIdentity>(slot).map(|s| s.0);
        tracing::debug!(?index, ?state, "slot state changed");
        world.insert(slot, state)?;
        Ok(())
    }

    fn dispose(&self, world: &mut World, slot: Entity, dt: f32) -> Result<(), EcsError> {
        let timer = {
            if !world.has::<SlotWindState>(slot) {
                world.insert(slot, SlotWindState::default())?;
            }
            let Some(wind) = world.get_mut::<SlotWindState>(slot) else {
                return Ok(());
            };
            wind.dispose_timer += dt;
            wind.dispose_timer
        };
        if timer >= self.config.slot_dispose_duration {
            world.remove::<SlotCargoLoad>(slot);
            world.remove::<SlotCargoColor>(slot);
            world.remove::<SlotWindState>(slot);
            Self::set_state(world, slot, SlotState::Empty)?;
        }
        Ok(())
    }

    fn begin_disposing(world: &mut World, slot: Entity) -> Result<(), EcsError> {
        world.insert(slot, SlotWindState::default())?;
        Self::set_state(world, slot, SlotState::Disposing)
    }

    fn wind(&self, world: &mut World, slot: Entity, dt: f32) -> Result<(), EcsError> {
        let Some(load) = world.get::<SlotCargoLoad>(slot).copied() else {
            return Self::begin_disposing(world, slot);
        };
        if load.target <= 0 || load.current >= load.target {
            return Self::begin_disposing(world, slot);
        }
        let Some(color) = world.get::<SlotCargoColor>(slot).map(|c| c.color) else {
            return Ok(());
        };

        let mut wind = world.get::<SlotWindState>(slot).copied().unwrap_or_default();
        // A target that vanished (or lost its scale) counts as no target.
        let valid = wind
            .target
            .is_some_and(|t| world.is_alive(t) && world.has::<ScaleVisualState>(t));
        if !valid {
            wind.target = None;
            wind.progress = 0.0;
            match self.pick_scale(world, color) {
                Some(scale) => {
                    if let Some(visual) = world.get_mut::<ScaleVisualState>(scale) {
                        visual.unwinding = true;
                    }
                    wind.target = Some(scale);
                }
                None => {
                    world.insert(slot, wind)?;
                    return Ok(());
                }
            }
        }
        let Some(scale) = wind.target else {
            return Ok(());
        };

        wind.progress = (wind.progress + dt / self.config.seconds_per_scale()).min(1.0);
        if let Some(visual) = world.get_mut::<ScaleVisualState>(scale) {
            visual.fraction = 1.0 - wind.progress;
        }

        if wind.progress >= 1.0 {
            let index = world
                .get::<PartKind>(scale)
                .and_then(|k| k.index())
                .map_or(-1, |i| i as i32);
            world.send_event(RebukeRequest {
                index,
                shift: self.config.segment_spacing,
            });
            world.despawn(scale)?;
            wind.target = None;
            wind.progress = 0.0;
            let current = load.current + 1;
            world.insert(slot, SlotCargoLoad { current, ..load })?;
            tracing::debug!(index, current, target = load.target, "scale consumed");
            if current >= load.target {
                return Self::begin_disposing(world, slot);
            }
        }
        world.insert(slot, wind)?;
        Ok(())
    }
}

impl System for SlotWindSystem {
    fn name(&self) -> &str {
        SLOT_WIND_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, dt: f32) {
        let mut slots: Vec<(u32, Entity)> = world
            .filter::<(SlotIdentity, SlotState)>()
            .into_iter()
            .filter_map(|e| world.get::<SlotIdentity>(e).map(|id| (id.0, e)))
            .collect();
        slots.sort_unstable();

        for (_, slot) in slots {
            let result = match world.get::<SlotState>(slot).copied() {
                Some(SlotState::Occupied) => self.wind(world, slot, dt),
                Some(SlotState::Disposing) => self.dispose(world, slot, dt),
                _ => Ok(()),
            };
            if let Err(err) = result {
                tracing::warn!(%err, "slot winding failed");
            }
        }
    }
}
