use std::sync::Arc;

use wyrm_ecs::prelude::*;

use crate::components::{SlotIdentity, SlotState, SlotTarget};
use crate::config::GameConfig;
use crate::tick::System;

pub const SLOT_INIT_SYSTEM_NAME: &str = "slot_init";

/// Creates one `Empty` slot per configured target point.
pub struct SlotInitSystem {
    config: Arc<GameConfig>,
}

impl SlotInitSystem {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self { config }
    }

    fn spawn_all(&self, world: &mut World) -> Result<(), EcsError> {
        for (index, &point) in self.config.slots.iter().enumerate() {
            let slot = world.spawn();
            world.insert(slot, SlotIdentity(index as u32))?;
            world.insert(slot, SlotTarget(point))?;
            world.insert(slot, SlotState::Empty)?;
        }
        Ok(())
    }
}

impl System for SlotInitSystem {
    fn name(&self) -> &str {
        SLOT_INIT_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        if self.config.slots.is_empty() {
            tracing::warn!("no slots configured");
            return;
        }
        match self.spawn_all(world) {
            Ok(()) => tracing::info!(count = self.config.slots.len(), "slots registered"),
            Err(err) => tracing::warn!(%err, "slot init failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::find_slot;
    use glam::Vec3;

    #[test]
    fn slots_start_empty_with_stable_indices() {
        let config = Arc::new(GameConfig {
            slots: vec![Vec3::new(-1.0, 0.0, 8.0), Vec3::new(1.0, 0.0, 8.0)],
            ..Default::default()
        });
        let mut world = World::new();
        SlotInitSystem::new(config).init(&mut world);

        let second = find_slot(&mut world, 1).unwrap();
        assert_eq!(world.get::<SlotState>(second), Some(&SlotState::Empty));
        assert_eq!(world.get::<SlotTarget>(second), Some(&SlotTarget(Vec3::new(1.0, 0.0, 8.0))));
        assert!(find_slot(&mut world, 2).is_none());
    }
}
