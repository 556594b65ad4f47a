//! The [`World`] owns the entity allocator, one sparse-set store per
//! component type, the filter cache, the event queues and the resources.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::component::{Component, ComponentRegistry, ComponentStore, ComponentTypeId, ErasedStore};
use crate::entity::{Entity, EntityAllocator};
use crate::event::{EventRegistry, Events};
use crate::filter::{FilterCache, Filter};
use crate::EcsError;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Up-front sizing for a world. Only affects pre-allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldConfig {
    /// Entities the allocator reserves room for.
    pub entity_capacity: usize,
    /// Dense rows each component store reserves on creation.
    pub store_capacity: usize,
}

impl WorldConfig {
    /// Sizing used by the gameplay world.
    pub const fn gameplay() -> Self {
        Self {
            entity_capacity: 4096,
            store_capacity: 4096,
        }
    }

    /// Sizing for the larger collision-side world.
    pub const fn collision() -> Self {
        Self {
            entity_capacity: 16_328,
            store_capacity: 128,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 0,
            store_capacity: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub struct World {
    config: WorldConfig,
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
    /// Bumped whenever a store gains or loses an entity.
    versions: HashMap<TypeId, u64>,
    filters: FilterCache,
    events: EventRegistry,
    resources: HashMap<TypeId, Box<dyn Any>>,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            allocator: EntityAllocator::with_capacity(config.entity_capacity),
            registry: ComponentRegistry::new(),
            stores: HashMap::new(),
            versions: HashMap::new(),
            filters: FilterCache::default(),
            events: EventRegistry::default(),
            resources: HashMap::new(),
        }
    }

    pub fn config(&self) -> WorldConfig {
        self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register `T` under a readable name and create its store.
    ///
    /// Registration is optional: the first insert of an unregistered type
    /// registers it under its Rust type name.
    pub fn register_component<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let id = self.registry.register::<T>(name);
        self.ensure_store::<T>();
        id
    }

    fn ensure_store<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let capacity = self.config.store_capacity;
        if !self.stores.contains_key(&TypeId::of::<T>()) {
            self.registry.register::<T>(std::any::type_name::<T>());
            self.stores.insert(
                TypeId::of::<T>(),
                Box::new(ComponentStore::<T>::with_capacity(capacity)),
            );
        }
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .expect("store registered under the TypeId of its own component")
    }

    fn bump(&mut self, type_id: TypeId) {
        *self.versions.entry(type_id).or_insert(0) += 1;
    }

    // -- entities -----------------------------------------------------------

    pub fn spawn(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Strip every component from `entity` and release its index for reuse.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let mut touched = Vec::new();
        for (type_id, store) in self.stores.iter_mut() {
            if store.remove_entity(entity) {
                touched.push(*type_id);
            }
        }
        for type_id in touched {
            self.bump(type_id);
        }
        self.allocator.release(entity);
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.live_count()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter_alive()
    }

    // -- components ---------------------------------------------------------

    /// Attach `value` to a live entity, returning the value it replaced.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let previous = self.ensure_store::<T>().insert(entity, value);
        if previous.is_none() {
            self.bump(TypeId::of::<T>());
        }
        Ok(previous)
    }

    /// Detach `T` from `entity`. Absence (including dead entities) is `None`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.store_mut::<T>()?.remove(entity);
        if removed.is_some() {
            self.bump(TypeId::of::<T>());
        }
        removed
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>()?.get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store_mut::<T>()?.get_mut(entity)
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store::<T>().is_some_and(|s| s.contains(entity))
    }

    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStore<T>>())
    }

    /// Mutable access to a store's values. Structural changes go through
    /// [`insert`](Self::insert) / [`remove`](Self::remove) so filters notice.
    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStore<T>>())
    }

    /// Every `(entity, &T)` in dense order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.store::<T>().into_iter().flat_map(|s| s.iter())
    }

    // -- filters ------------------------------------------------------------

    /// Entities carrying every component in `F`.
    ///
    /// The list is rebuilt only when a store in `F` gained or lost an entity
    /// since the previous request; otherwise the cached list is returned in
    /// the same order.
    pub fn filter<F: Filter>(&mut self) -> Vec<Entity> {
        let key = F::type_ids();
        let versions: Vec<u64> = key
            .iter()
            .map(|id| self.versions.get(id).copied().unwrap_or(0))
            .collect();
        if let Some(cached) = self.filters.lookup(&key, &versions) {
            return cached.to_vec();
        }

        let stores: Option<Vec<&dyn ErasedStore>> =
            key.iter().map(|id| self.stores.get(id).map(|s| s.as_ref())).collect();
        let matched: Vec<Entity> = match stores {
            Some(mut stores) if !stores.is_empty() => {
                // Drive from the smallest store, probe the others.
                stores.sort_by_key(|s| s.len());
                let (driver, rest) = stores.split_at(1);
                driver[0]
                    .owners()
                    .iter()
                    .copied()
                    .filter(|e| rest.iter().all(|s| s.contains_entity(*e)))
                    .collect()
            }
            _ => Vec::new(),
        };
        tracing::trace!(types = key.len(), matched = matched.len(), "filter rebuilt");
        self.filters.store(key, versions, matched.clone());
        matched
    }

    /// How many times a filter list has been rebuilt.
    pub fn filter_rebuilds(&self) -> u64 {
        self.filters.rebuilds()
    }

    // -- events -------------------------------------------------------------

    pub fn send_event<T: 'static>(&mut self, event: T) {
        self.events.get_or_create::<T>().send(event);
    }

    /// Consume every pending `T`, oldest first.
    pub fn drain_events<T: 'static>(&mut self) -> Vec<T> {
        self.events.get_or_create::<T>().drain()
    }

    /// Pending events of type `T`, if any queue for it exists.
    pub fn events<T: 'static>(&self) -> Option<&Events<T>> {
        self.events.get::<T>()
    }

    /// Retire one tick on every event queue; returns the dropped count.
    pub fn update_events(&mut self) -> usize {
        self.events.update_all()
    }

    // -- resources ----------------------------------------------------------

    /// Insert a singleton, replacing any previous value of the same type.
    pub fn insert_resource<T: 'static>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn resource<T: 'static>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<T>())
    }

    pub fn resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.downcast_mut::<T>())
    }

    pub fn remove_resource<T: 'static>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|r| r.downcast::<T>().ok())
            .map(|b| *b)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.allocator.live_count())
            .field("component_types", &self.registry.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32);
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Speed(f32);
    #[derive(Debug, PartialEq)]
    struct Tag;

    #[test]
    fn despawn_strips_components() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Position(1.0)).unwrap();
        world.insert(e, Speed(2.0)).unwrap();
        world.despawn(e).unwrap();
        assert!(!world.is_alive(e));
        assert_eq!(world.store::<Position>().map(|s| s.len()), Some(0));
        assert_eq!(world.store::<Speed>().map(|s| s.len()), Some(0));
    }

    #[test]
    fn despawn_dead_entity_errors() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert_eq!(world.despawn(e), Err(EcsError::StaleEntity { entity: e }));
    }

    #[test]
    fn insert_on_dead_entity_errors() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert!(world.insert(e, Tag).is_err());
        assert!(!world.has::<Tag>(e));
    }

    #[test]
    fn stale_handle_does_not_see_recycled_components() {
        let mut world = World::new();
        let old = world.spawn();
        world.despawn(old).unwrap();
        let new = world.spawn();
        assert_eq!(new.index(), old.index());
        world.insert(new, Position(5.0)).unwrap();
        assert_eq!(world.get::<Position>(old), None);
        assert_eq!(world.get::<Position>(new), Some(&Position(5.0)));
    }

    #[test]
    fn remove_absent_is_none() {
        let mut world = World::new();
        let e = world.spawn();
        assert_eq!(world.remove::<Speed>(e), None);
        world.insert(e, Speed(1.0)).unwrap();
        assert_eq!(world.remove::<Speed>(e), Some(Speed(1.0)));
        assert_eq!(world.remove::<Speed>(e), None);
    }

    #[test]
    fn filter_matches_all_included_types() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.insert(a, Position(0.0)).unwrap();
        world.insert(a, Speed(1.0)).unwrap();
        world.insert(b, Position(0.0)).unwrap();
        world.insert(c, Speed(1.0)).unwrap();
        let mut found = world.filter::<(Position, Speed)>();
        found.sort();
        assert_eq!(found, vec![a]);
        assert!(world.filter::<(Tag,)>().is_empty());
    }

    #[test]
    fn value_writes_keep_filter_cached() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Position(0.0)).unwrap();
        world.filter::<(Position,)>();
        let rebuilds = world.filter_rebuilds();
        world.get_mut::<Position>(e).unwrap().0 = 9.0;
        world.insert(e, Position(3.0)).unwrap();
        world.filter::<(Position,)>();
        assert_eq!(world.filter_rebuilds(), rebuilds);
    }

    #[test]
    fn structural_change_rebuilds_filter() {
        let mut world = World::new();
        let a = world.spawn();
        world.insert(a, Position(0.0)).unwrap();
        assert_eq!(world.filter::<(Position,)>(), vec![a]);
        let b = world.spawn();
        world.insert(b, Position(1.0)).unwrap();
        assert_eq!(world.filter::<(Position,)>().len(), 2);
        world.despawn(a).unwrap();
        assert_eq!(world.filter::<(Position,)>(), vec![b]);
        assert_eq!(world.filter_rebuilds(), 3);
    }

    #[test]
    fn resources_roundtrip() {
        let mut world = World::new();
        assert!(world.resource::<Speed>().is_none());
        world.insert_resource(Speed(4.0));
        world.resource_mut::<Speed>().unwrap().0 += 1.0;
        assert_eq!(world.resource::<Speed>(), Some(&Speed(5.0)));
        assert_eq!(world.remove_resource::<Speed>(), Some(Speed(5.0)));
        assert!(world.resource::<Speed>().is_none());
    }

    #[test]
    fn events_flow_through_world() {
        let mut world = World::new();
        world.send_event(7u32);
        assert_eq!(world.events::<u32>().map(|q| q.len()), Some(1));
        world.update_events();
        assert_eq!(world.drain_events::<u32>(), vec![7]);
        world.send_event(8u32);
        world.update_events();
        assert_eq!(world.update_events(), 1);
        assert!(world.drain_events::<u32>().is_empty());
    }

    #[test]
    fn register_component_names_type() {
        let mut world = World::with_config(WorldConfig::gameplay());
        let id = world.register_component::<Position>("Position");
        assert_eq!(world.registry().name(id), Some("Position"));
        assert!(world.store::<Position>().is_some());
    }
}
