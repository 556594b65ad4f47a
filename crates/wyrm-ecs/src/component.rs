//! Sparse-set component storage and component-type registration.
//!
//! Each component type lives in its own [`ComponentStore`]: a dense `Vec<T>`
//! packed without holes, a parallel `Vec<Entity>` naming the owner of every
//! dense row, and a sparse array indexed by [`Entity::index`] that points into
//! the dense rows. Insert, remove and lookup are O(1); iteration walks the
//! dense arrays only.
//!
//! Removal swaps the last dense row into the hole, so dense order is stable
//! only while no component of that type is removed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::entity::Entity;

/// Marker for types storable as components.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque identifier assigned to a component type at registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Sparse-set storage for one component type.
pub struct ComponentStore<T> {
    /// `sparse[entity.index]` is the dense row holding that entity's value.
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    owners: Vec<Entity>,
}

impl<T> ComponentStore<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            owners: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index() as usize)?)? as usize;
        // A stale handle shares the index but not the generation.
        (self.owners[row] == entity).then_some(row)
    }

    /// Attach `value` to `entity`, returning the value it replaced.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(row) = self.row(entity) {
            return Some(std::mem::replace(&mut self.dense[row], value));
        }
        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        // An older generation may still own the slot if it was never
        // removed explicitly; drop that row first.
        if self.sparse[idx].is_some() {
            self.remove_index(idx);
        }
        self.sparse[idx] = Some(self.dense.len() as u32);
        self.dense.push(value);
        self.owners.push(entity);
        None
    }

    /// Detach and return `entity`'s value. Absence is `None`, never an error.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.row(entity)?;
        self.remove_index(entity.index() as usize)
    }

    fn remove_index(&mut self, idx: usize) -> Option<T> {
        let row = self.sparse.get_mut(idx)?.take()? as usize;
        let last = self.dense.len() - 1;
        if row != last {
            let moved = self.owners[last];
            self.sparse[moved.index() as usize] = Some(row as u32);
        }
        self.owners.swap_remove(row);
        Some(self.dense.swap_remove(row))
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.row(entity).map(|row| &self.dense[row])
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = self.row(entity)?;
        Some(&mut self.dense[row])
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owners in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Raw dense values, parallel to [`entities`](Self::entities).
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStore")
            .field("len", &self.dense.len())
            .field("sparse_len", &self.sparse.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ErasedStore -- what the world needs without knowing `T`
// ---------------------------------------------------------------------------

pub(crate) trait ErasedStore: Any {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains_entity(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn owners(&self) -> &[Entity];
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn owners(&self) -> &[Entity] {
        &self.owners
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Maps Rust types to [`ComponentTypeId`]s and human-readable names.
///
/// Registering the same type twice returns the first id; the second name is
/// ignored.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: HashMap<TypeId, ComponentTypeId>,
    names: Vec<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return id;
        }
        assert!(
            !self.names.iter().any(|n| n == name),
            "component name '{name}' is already registered for a different type"
        );
        let id = ComponentTypeId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.by_type.insert(TypeId::of::<T>(), id);
        id
    }

    pub fn lookup<T: Component>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn name(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
