use std::sync::Arc;

use glam::Quat;
use wyrm_ecs::prelude::*;

use crate::components::{
    Blockers, CargoId, CargoInfo, CargoMotion, CargoRegistry, CargoTransform, FieldBorders,
};
use crate::config::{CargoSpec, GameConfig};
use crate::geometry::Aabb;
use crate::path::Pose;
use crate::tick::System;

pub const FIELD_BORDERS_SYSTEM_NAME: &str = "field_borders";
pub const CARGO_INIT_SYSTEM_NAME: &str = "cargo_init";

fn spec_rotation(spec: &CargoSpec) -> Quat {
    Quat::from_rotation_y(spec.yaw_degrees.to_radians())
}

/// World-space bounds of a configured cargo at its origin.
pub fn spec_bounds(spec: &CargoSpec) -> Aabb {
    Aabb::oriented(spec.position, spec_rotation(spec), spec.half_extents)
}

// ---------------------------------------------------------------------------
// FieldBordersSystem
// ---------------------------------------------------------------------------

/// Computes [`FieldBorders`] once: the union of every cargo's bounds plus
/// the configured margin.
pub struct FieldBordersSystem {
    config: Arc<GameConfig>,
}

impl FieldBordersSystem {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self { config }
    }
}

impl System for FieldBordersSystem {
    fn name(&self) -> &str {
        FIELD_BORDERS_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        let Some(union) = self
            .config
            .cargo
            .iter()
            .map(spec_bounds)
            .reduce(|acc, b| acc.union(&b))
        else {
            tracing::warn!("no cargo configured, field borders not computed");
            return;
        };
        let borders = union.expanded(self.config.field_margin);
        tracing::info!(min = ?borders.min(), max = ?borders.max(), "field borders computed");
        world.insert_resource(FieldBorders(borders));
    }
}

// ---------------------------------------------------------------------------
// CargoInitSystem
// ---------------------------------------------------------------------------

/// Spawns one entity per configured cargo and resolves blocker indices.
pub struct CargoInitSystem {
    config: Arc<GameConfig>,
}

impl CargoInitSystem {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self { config }
    }

    fn spawn_all(&self, world: &mut World) -> Result<Vec<Entity>, EcsError> {
        let mut entities = Vec::with_capacity(self.config.cargo.len());
        for (i, spec) in self.config.cargo.iter().enumerate() {
            let rotation = spec_rotation(spec);
            let e = world.spawn();
            world.insert(e, CargoId(i as u32))?;
            world.insert(
                e,
                CargoTransform {
                    pose: Pose::new(spec.position, rotation),
                    origin: spec.position,
                    origin_rotation: rotation,
                },
            )?;
            world.insert(
                e,
                CargoInfo {
                    half_extents: spec.half_extents,
                    color: spec.color,
                    color_offset: spec.color_offset,
                    category: spec.category,
                    turns: spec.turns,
                },
            )?;
            world.insert(e, CargoMotion::Idle)?;
            entities.push(e);
        }

        for (spec, &e) in self.config.cargo.iter().zip(&entities) {
            let blockers: Vec<Entity> = spec
                .blocking
                .iter()
                .filter_map(|&i| entities.get(i).copied())
                .filter(|&b| b != e)
                .collect();
            if blockers.len() != spec.blocking.len() {
                tracing::warn!(cargo = %e, "dropped invalid blocker indices");
            }
            world.insert(e, Blockers(blockers))?;
        }
        Ok(entities)
    }
}

impl System for CargoInitSystem {
    fn name(&self) -> &str {
        CARGO_INIT_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        match self.spawn_all(world) {
            Ok(entities) => {
                tracing::info!(count = entities.len(), "cargo registered");
                world.insert_resource(CargoRegistry(entities));
            }
            Err(err) => tracing::warn!(%err, "cargo init failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CargoCategory, ScaleColor};
    use glam::Vec3;

    fn spec(x: f32, z: f32, blocking: Vec<usize>) -> CargoSpec {
        CargoSpec {
            position: Vec3::new(x, 0.0, z),
            yaw_degrees: 0.0,
            half_extents: Vec3::new(0.5, 0.5, 1.0),
            color: ScaleColor::Red,
            color_offset: 0,
            category: CargoCategory::Medium,
            turns: 2,
            blocking,
        }
    }

    #[test]
    fn borders_cover_all_cargo_plus_margin() {
        let config = Arc::new(GameConfig {
            cargo: vec![spec(0.0, 0.0, vec![]), spec(4.0, 6.0, vec![])],
            field_margin: 1.0,
            ..Default::default()
        });
        let mut world = World::new();
        FieldBordersSystem::new(config).init(&mut world);
        let FieldBorders(b) = *world.resource::<FieldBorders>().unwrap();
        assert!(b.min().abs_diff_eq(Vec3::new(-1.5, -1.5, -2.0), 1e-5));
        assert!(b.max().abs_diff_eq(Vec3::new(5.5, 1.5, 8.0), 1e-5));
    }

    #[test]
    fn no_cargo_means_no_borders() {
        let mut world = World::new();
        FieldBordersSystem::new(Arc::new(GameConfig::default())).init(&mut world);
        assert!(world.resource::<FieldBorders>().is_none());
    }

    #[test]
    fn rotated_cargo_bounds() {
        let mut s = spec(0.0, 0.0, vec![]);
        s.yaw_degrees = 90.0;
        let b = spec_bounds(&s);
        assert!(b.extents.abs_diff_eq(Vec3::new(1.0, 0.5, 0.5), 1e-5));
    }

    #[test]
    fn cargo_entities_carry_ids_and_blockers() {
        let config = Arc::new(GameConfig {
            cargo: vec![spec(0.0, 0.0, vec![1]), spec(0.0, 3.0, vec![])],
            ..Default::default()
        });
        let mut world = World::new();
        CargoInitSystem::new(config).init(&mut world);
        let registry = world.resource::<CargoRegistry>().unwrap().clone();
        assert_eq!(registry.0.len(), 2);
        let first = registry.entity(CargoId(0)).unwrap();
        let second = registry.entity(CargoId(1)).unwrap();
        assert_eq!(world.get::<Blockers>(first), Some(&Blockers(vec![second])));
        assert_eq!(world.get::<Blockers>(second), Some(&Blockers(vec![])));
        assert_eq!(world.get::<CargoMotion>(first), Some(&CargoMotion::Idle));
        assert_eq!(world.get::<CargoTransform>(second).unwrap().origin, Vec3::new(0.0, 0.0, 3.0));
    }
}
