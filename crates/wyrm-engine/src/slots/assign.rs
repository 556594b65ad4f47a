use wyrm_ecs::prelude::*;

use super::find_slot;
use crate::components::{
    Arrival, SlotCargoColor, SlotCargoLoad, SlotReservation, SlotState, SlotWindState,
};
use crate::tick::System;

pub const SLOT_ASSIGN_SYSTEM_NAME: &str = "slot_assign";

/// Occupies the slot named by each [`Arrival`] with the cargo's payload.
#[derive(Default)]
pub struct SlotAssignSystem;

impl SlotAssignSystem {
    pub fn new() -> Self {
        Self
    }

    fn assign(world: &mut World, arrival: Arrival) -> Result<(), EcsError> {
        let Some(slot) = find_slot(world, arrival.slot) else {
            tracing::warn!(slot = arrival.slot, "arrival for unknown slot dropped");
            return Ok(());
        };
        world.insert(slot, SlotState::Occupied)?;
        world.insert(
            slot,
            SlotCargoLoad {
                current: 0,
                target: arrival.turns.max(0),
                category: arrival.category,
            },
        )?;
        world.insert(
            slot,
            SlotCargoColor {
                color: arrival.color,
                offset: arrival.color_offset,
            },
        )?;
        world.remove::<SlotReservation>(slot);
        world.remove::<SlotWindState>(slot);
        tracing::debug!(
            slot = arrival.slot,
            target = arrival.turns,
            color = ?arrival.color,
            "slot occupied"
        );
        Ok(())
    }
}

impl System for SlotAssignSystem {
    fn name(&self) -> &str {
        SLOT_ASSIGN_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, _dt: f32) {
        for arrival in world.drain_events::<Arrival>() {
            if let Err(err) = Self::assign(world, arrival) {
                tracing::warn!(%err, "slot assignment failed");
            }
        }
    }
}
