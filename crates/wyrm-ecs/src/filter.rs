//! "Includes all of" entity filters with a structural-change cache.
//!
//! A [`Filter`] is a tuple of component types, e.g. `(PathFollower, Pose)`.
//! [`World::filter`](crate::world::World::filter) materializes the matching
//! entities into a list and caches it. The cache entry remembers the
//! structural version of every store it read; mutating component *values*
//! leaves it valid, while inserting or removing a component of any involved
//! type forces a rebuild on the next request.

use std::any::TypeId;
use std::collections::HashMap;

use crate::component::Component;
use crate::entity::Entity;

/// A set of component types an entity must all carry.
pub trait Filter: 'static {
    fn type_ids() -> Vec<TypeId>;
}

macro_rules! impl_filter {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Filter for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }
        }
    };
}

impl_filter!(A);
impl_filter!(A, B);
impl_filter!(A, B, C);
impl_filter!(A, B, C, D);
impl_filter!(A, B, C, D, E);

#[derive(Debug)]
struct CachedFilter {
    versions: Vec<u64>,
    entities: Vec<Entity>,
}

/// Materialized filter results keyed by the filter's type list.
#[derive(Debug, Default)]
pub(crate) struct FilterCache {
    entries: HashMap<Vec<TypeId>, CachedFilter>,
    rebuilds: u64,
}

impl FilterCache {
    /// Cached entities for `key` if every store is still at `versions`.
    pub(crate) fn lookup(&self, key: &[TypeId], versions: &[u64]) -> Option<&[Entity]> {
        self.entries
            .get(key)
            .filter(|cached| cached.versions == versions)
            .map(|cached| cached.entities.as_slice())
    }

    pub(crate) fn store(&mut self, key: Vec<TypeId>, versions: Vec<u64>, entities: Vec<Entity>) {
        self.rebuilds += 1;
        self.entries.insert(key, CachedFilter { versions, entities });
    }

    /// Number of times any filter had to be rebuilt.
    pub(crate) fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
