//! Collection slots: `Empty -> Reserved -> Occupied -> Disposing -> Empty`.
//!
//! A click reserves a slot ([`CargoClickSystem`](crate::cargo::CargoClickSystem)),
//! the cargo's arrival occupies it ([`SlotAssignSystem`]), and the winding
//! routine ([`SlotWindSystem`]) unwinds one matching creature scale at a time
//! until the load is complete, then disposes the slot.

pub mod assign;
pub mod init;
pub mod wind;

use wyrm_ecs::prelude::*;

use crate::components::SlotIdentity;

pub use assign::SlotAssignSystem;
pub use init::SlotInitSystem;
pub use wind::SlotWindSystem;

/// The slot entity with stable index `index`.
pub fn find_slot(world: &mut World, index: u32) -> Option<Entity> {
    world
        .filter::<(SlotIdentity,)>()
        .into_iter()
        .find(|&e| world.get::<SlotIdentity>(e).is_some_and(|id| id.0 == index))
}
