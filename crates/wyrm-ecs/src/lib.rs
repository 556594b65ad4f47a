//! Wyrm ECS -- sparse-set Entity Component System.
//!
//! Every component type owns a [`ComponentStore`](component::ComponentStore):
//! dense values plus a sparse index keyed by entity. Entities are generational
//! handles, so a handle that outlives its entity reads as absent rather than
//! aliasing whatever reused the slot. On top of the stores the [`World`]
//! offers cached "includes-all" filters, double-buffered event queues and
//! typed singleton resources.
//!
//! # Quick Start
//!
//! ```
//! use wyrm_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, z: f32 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Speed(f32);
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//! world.register_component::<Speed>("speed");
//!
//! let entity = world.spawn();
//! world.insert(entity, Position { x: 0.0, z: 0.0 }).unwrap();
//! world.insert(entity, Speed(2.0)).unwrap();
//!
//! for e in world.filter::<(Position, Speed)>() {
//!     let speed = world.get::<Speed>(e).unwrap().0;
//!     world.get_mut::<Position>(e).unwrap().z += speed;
//! }
//! assert_eq!(world.get::<Position>(entity), Some(&Position { x: 0.0, z: 2.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod event;
pub mod filter;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::Entity },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentRegistry, ComponentStore, ComponentTypeId};
    pub use crate::entity::Entity;
    pub use crate::event::Events;
    pub use crate::filter::Filter;
    pub use crate::world::{World, WorldConfig};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        z: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dz: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Marker;

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_component::<Position>("position");
        world.register_component::<Velocity>("velocity");
        world.register_component::<Marker>("marker");
        world
    }

    #[test]
    fn filter_then_mutate_moves_entities() {
        let mut world = setup_world();
        let moving = world.spawn();
        world.insert(moving, Position { x: 0.0, z: 0.0 }).unwrap();
        world.insert(moving, Velocity { dx: 1.0, dz: 2.0 }).unwrap();
        let still = world.spawn();
        world.insert(still, Position { x: 5.0, z: 5.0 }).unwrap();

        for e in world.filter::<(Position, Velocity)>() {
            let v = world.get::<Velocity>(e).cloned().unwrap();
            let p = world.get_mut::<Position>(e).unwrap();
            p.x += v.dx;
            p.z += v.dz;
        }

        assert_eq!(world.get::<Position>(moving), Some(&Position { x: 1.0, z: 2.0 }));
        assert_eq!(world.get::<Position>(still), Some(&Position { x: 5.0, z: 5.0 }));
    }

    #[test]
    fn scale_10k_entities() {
        let mut world = setup_world();

        let mut entities = Vec::with_capacity(10_000);
        for i in 0..10_000u32 {
            let e = world.spawn();
            world
                .insert(e, Position { x: i as f32, z: i as f32 * 2.0 })
                .unwrap();
            world.insert(e, Velocity { dx: 1.0, dz: -1.0 }).unwrap();
            entities.push(e);
        }
        assert_eq!(world.filter::<(Position, Velocity)>().len(), 10_000);

        if let Some(store) = world.store_mut::<Velocity>() {
            for (_, v) in store.iter_mut() {
                v.dx *= 2.0;
            }
        }
        assert_eq!(world.get::<Velocity>(entities[0]).map(|v| v.dx), Some(2.0));

        for e in entities.iter().take(5_000) {
            world.despawn(*e).unwrap();
        }
        assert_eq!(world.filter::<(Position, Velocity)>().len(), 5_000);
        assert_eq!(world.entity_count(), 5_000);
    }

    #[test]
    fn tag_component_toggles_filter_membership() {
        let mut world = setup_world();
        let e = world.spawn();
        world.insert(e, Position { x: 0.0, z: 0.0 }).unwrap();
        assert!(world.filter::<(Position, Marker)>().is_empty());
        world.insert(e, Marker).unwrap();
        assert_eq!(world.filter::<(Position, Marker)>(), vec![e]);
        world.remove::<Marker>(e);
        assert!(world.filter::<(Position, Marker)>().is_empty());
    }

    #[test]
    fn despawned_handle_reads_absent_everywhere() {
        let mut world = setup_world();
        let e = world.spawn();
        world.insert(e, Marker).unwrap();
        world.despawn(e).unwrap();
        assert!(!world.has::<Marker>(e));
        assert_eq!(world.get::<Marker>(e), None);
        assert_eq!(world.remove::<Marker>(e), None);
        assert!(world.filter::<(Marker,)>().is_empty());
    }

    #[test]
    fn events_and_components_are_independent() {
        let mut world = setup_world();
        let e = world.spawn();
        world.send_event(e);
        world.despawn(e).unwrap();
        // The event still names the old handle, which is now dead.
        let sent: Vec<Entity> = world.drain_events();
        assert_eq!(sent, vec![e]);
        assert!(!world.is_alive(sent[0]));
    }
}
