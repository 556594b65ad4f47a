//! Property tests for the sparse-set world.
//!
//! Random sequences of spawn/despawn/insert/remove are applied to a [`World`]
//! and to a plain `HashMap` model; after every step the two must agree.

use std::collections::HashMap;

use proptest::prelude::*;
use wyrm_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dist(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Color(u8);

#[derive(Debug, Clone)]
enum Op {
    Spawn,
    Despawn(usize),
    InsertDist(usize, i32),
    RemoveDist(usize),
    InsertColor(usize, u8),
    RemoveColor(usize),
    Filter,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Spawn),
        1 => (0..64usize).prop_map(Op::Despawn),
        2 => (0..64usize, -1000..1000i32).prop_map(|(i, d)| Op::InsertDist(i, d)),
        1 => (0..64usize).prop_map(Op::RemoveDist),
        2 => (0..64usize, any::<u8>()).prop_map(|(i, c)| Op::InsertColor(i, c)),
        1 => (0..64usize).prop_map(Op::RemoveColor),
        1 => Just(Op::Filter),
    ]
}

#[derive(Default)]
struct Model {
    dist: HashMap<Entity, i32>,
    color: HashMap<Entity, u8>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn world_matches_model(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut world = World::new();
        let mut alive: Vec<Entity> = Vec::new();
        let mut dead: Vec<Entity> = Vec::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Spawn => alive.push(world.spawn()),
                Op::Despawn(i) if !alive.is_empty() => {
                    let e = alive.remove(i % alive.len());
                    prop_assert!(world.despawn(e).is_ok());
                    model.dist.remove(&e);
                    model.color.remove(&e);
                    dead.push(e);
                }
                Op::InsertDist(i, d) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    let prev = world.insert(e, Dist(d)).unwrap();
                    prop_assert_eq!(prev.map(|p| p.0), model.dist.insert(e, d));
                }
                Op::RemoveDist(i) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    prop_assert_eq!(world.remove::<Dist>(e).map(|p| p.0), model.dist.remove(&e));
                }
                Op::InsertColor(i, c) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    world.insert(e, Color(c)).unwrap();
                    model.color.insert(e, c);
                }
                Op::RemoveColor(i) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    prop_assert_eq!(world.remove::<Color>(e).map(|c| c.0), model.color.remove(&e));
                }
                Op::Filter => {
                    let mut got = world.filter::<(Dist, Color)>();
                    got.sort();
                    let mut want: Vec<Entity> = model
                        .dist
                        .keys()
                        .filter(|e| model.color.contains_key(e))
                        .copied()
                        .collect();
                    want.sort();
                    prop_assert_eq!(got, want);
                }
                _ => {}
            }

            prop_assert_eq!(world.entity_count(), alive.len());
            for &e in &alive {
                prop_assert!(world.is_alive(e));
                prop_assert_eq!(world.get::<Dist>(e).map(|d| d.0), model.dist.get(&e).copied());
                prop_assert_eq!(world.get::<Color>(e).map(|c| c.0), model.color.get(&e).copied());
            }
            for &e in &dead {
                prop_assert!(!world.is_alive(e));
                prop_assert!(world.get::<Dist>(e).is_none());
                prop_assert!(world.despawn(e).is_err());
            }
        }
    }

    /// A cached filter list must equal a freshly computed one after any mix of
    /// value writes and structural changes.
    #[test]
    fn cached_filter_never_goes_stale(
        count in 1..40usize,
        writes in prop::collection::vec((0..40usize, -50..50i32), 0..40),
        removals in prop::collection::vec(0..40usize, 0..10),
    ) {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..count)
            .map(|i| {
                let e = world.spawn();
                world.insert(e, Dist(i as i32)).unwrap();
                e
            })
            .collect();
        let _ = world.filter::<(Dist,)>();

        for (i, d) in writes {
            if let Some(v) = world.get_mut::<Dist>(entities[i % count]) {
                v.0 = d;
            }
        }
        let mut removed = std::collections::HashSet::new();
        for i in removals {
            let e = entities[i % count];
            if world.remove::<Dist>(e).is_some() {
                removed.insert(e);
            }
        }

        let mut got = world.filter::<(Dist,)>();
        got.sort();
        let mut want: Vec<Entity> = entities.iter().copied().filter(|e| !removed.contains(e)).collect();
        want.sort();
        prop_assert_eq!(got, want);
    }
}
