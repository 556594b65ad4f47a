//! The boundary to presentation and input.
//!
//! Each tick the [`ViewSyncSystem`] resolves everything a renderer needs into
//! a [`Frame`]. Renderers receive it through [`VisualSink`]; players act only
//! through [`InputSource`].

use serde::Serialize;
use wyrm_ecs::prelude::*;

use crate::components::{
    CargoId, CargoMotion, CargoTransform, Click, MotionKind, PartKind, PathFollower, ReachedEnd,
    ScaleVisualState, SlotCargoColor, SlotCargoLoad, SlotIdentity, SlotState, SlotWindState,
};
use crate::config::{CargoCategory, ScaleColor};
use crate::path::Pose;
use crate::tick::System;

pub const VIEW_SYNC_SYSTEM_NAME: &str = "view_sync";
pub const EVENT_CLEANUP_SYSTEM_NAME: &str = "event_cleanup";

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Supplies at most one click per tick.
pub trait InputSource {
    fn poll_click(&mut self) -> Option<Click>;
}

/// Consumes resolved frames. Must not reach back into the simulation.
pub trait VisualSink {
    fn present(&mut self, frame: &Frame);
}

/// Input that never clicks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll_click(&mut self) -> Option<Click> {
        None
    }
}

/// Replays a fixed script of `(tick, click)` pairs.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    script: std::collections::VecDeque<(u64, Click)>,
    tick: u64,
}

impl ScriptedInput {
    /// `script` must be sorted by tick.
    pub fn new(script: impl IntoIterator<Item = (u64, Click)>) -> Self {
        Self {
            script: script.into_iter().collect(),
            tick: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll_click(&mut self) -> Option<Click> {
        let tick = self.tick;
        self.tick += 1;
        match self.script.front() {
            Some(&(at, click)) if at <= tick => {
                self.script.pop_front();
                Some(click)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub kind: PartKind,
    pub pose: Pose,
    pub color: ScaleColor,
    pub fraction: f32,
    pub unwinding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CargoView {
    pub id: CargoId,
    pub pose: Pose,
    pub motion: MotionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub index: u32,
    pub state: SlotState,
    pub current: i32,
    pub target: i32,
    pub category: Option<CargoCategory>,
    pub color: Option<ScaleColor>,
    pub wind_target: Option<Pose>,
    pub wind_progress: f32,
}

/// Everything a renderer needs for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub head: Option<Pose>,
    /// Body segments then the tail, by index.
    pub segments: Vec<SegmentView>,
    /// Live cargo by id.
    pub cargo: Vec<CargoView>,
    /// Slots by index.
    pub slots: Vec<SlotView>,
    /// True only on the tick the head first reaches the end of the path.
    pub reached_end: bool,
}

impl Frame {
    pub fn slot(&self, index: u32) -> Option<&SlotView> {
        self.slots.iter().find(|s| s.index == index)
    }

    pub fn cargo(&self, id: CargoId) -> Option<&CargoView> {
        self.cargo.iter().find(|c| c.id == id)
    }

    pub fn body_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s.kind, PartKind::Body(_)))
            .count()
    }
}

// ---------------------------------------------------------------------------
// ViewSyncSystem
// ---------------------------------------------------------------------------

/// Builds the [`Frame`] resource at the end of every tick.
#[derive(Default)]
pub struct ViewSyncSystem {
    tick: u64,
}

impl ViewSyncSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn segments(world: &mut World) -> Vec<SegmentView> {
        let mut segments: Vec<SegmentView> = world
            .filter::<(PartKind, Pose)>()
            .into_iter()
            .filter_map(|e| {
                let kind = *world.get::<PartKind>(e)?;
                if kind == PartKind::Head {
                    return None;
                }
                let visual = world.get::<ScaleVisualState>(e).copied().unwrap_or_default();
                Some(SegmentView {
                    kind,
                    pose: *world.get::<Pose>(e)?,
                    color: world.get::<ScaleColor>(e).copied().unwrap_or_default(),
                    fraction: visual.fraction,
                    unwinding: visual.unwinding,
                })
            })
            .collect();
        segments.sort_by_key(|s| s.kind.index());
        segments
    }

    fn cargo(world: &mut World) -> Vec<CargoView> {
        let mut cargo: Vec<CargoView> = world
            .filter::<(CargoId, CargoTransform, CargoMotion)>()
            .into_iter()
            .filter_map(|e| {
                Some(CargoView {
                    id: *world.get::<CargoId>(e)?,
                    pose: world.get::<CargoTransform>(e)?.pose,
                    motion: world.get::<CargoMotion>(e)?.kind(),
                })
            })
            .collect();
        cargo.sort_by_key(|c| c.id);
        cargo
    }

    fn slots(world: &mut World) -> Vec<SlotView> {
        let mut slots: Vec<SlotView> = world
            .filter::<(SlotIdentity, SlotState)>()
            .into_iter()
            .filter_map(|e| {
                let load = world.get::<SlotCargoLoad>(e);
                let wind = world.get::<SlotWindState>(e);
                Some(SlotView {
                    index: world.get::<SlotIdentity>(e)?.0,
                    state: *world.get::<SlotState>(e)?,
                    current: load.map_or(0, |l| l.current),
                    target: load.map_or(0, |l| l.target),
                    category: load.map(|l| l.category),
                    color: world.get::<SlotCargoColor>(e).map(|c| c.color),
                    wind_target: wind
                        .and_then(|w| w.target)
                        .and_then(|t| world.get::<Pose>(t))
                        .copied(),
                    wind_progress: wind.map_or(0.0, |w| w.progress),
                })
            })
            .collect();
        slots.sort_by_key(|s| s.index);
        slots
    }
}

impl System for ViewSyncSystem {
    fn name(&self) -> &str {
        VIEW_SYNC_SYSTEM_NAME
    }

    fn init(&mut self, world: &mut World) {
        world.insert_resource(Frame::default());
    }

    fn run(&mut self, world: &mut World, _dt: f32) {
        self.tick += 1;
        let head = world
            .filter::<(PathFollower, Pose)>()
            .first()
            .and_then(|&h| world.get::<Pose>(h))
            .copied();
        let reached_end = !world.drain_events::<ReachedEnd>().is_empty();
        let frame = Frame {
            tick: self.tick,
            head,
            segments: Self::segments(world),
            cargo: Self::cargo(world),
            slots: Self::slots(world),
            reached_end,
        };
        world.insert_resource(frame);
    }
}

// ---------------------------------------------------------------------------
// EventCleanupSystem
// ---------------------------------------------------------------------------

/// Retires one tick on every event queue. Registered last.
#[derive(Default)]
pub struct EventCleanupSystem;

impl System for EventCleanupSystem {
    fn name(&self) -> &str {
        EVENT_CLEANUP_SYSTEM_NAME
    }

    fn run(&mut self, world: &mut World, _dt: f32) {
        let dropped = world.update_events();
        if dropped > 0 {
            tracing::trace!(dropped, "unread events dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn click(cargo: u32) -> Click {
        Click {
            point: Vec3::ZERO,
            cargo: CargoId(cargo),
        }
    }

    #[test]
    fn scripted_input_fires_on_its_tick() {
        let mut input = ScriptedInput::new([(1, click(0)), (1, click(1)), (4, click(2))]);
        assert_eq!(input.poll_click(), None);
        assert_eq!(input.poll_click(), Some(click(0)));
        // A second click scheduled for the same tick waits one tick.
        assert_eq!(input.poll_click(), Some(click(1)));
        assert_eq!(input.poll_click(), None);
        assert_eq!(input.poll_click(), Some(click(2)));
        assert_eq!(input.poll_click(), None);
    }

    #[test]
    fn frame_lists_segments_in_index_order() {
        let mut world = World::new();
        for kind in [PartKind::Tail(2), PartKind::Body(1), PartKind::Head, PartKind::Body(0)] {
            let e = world.spawn();
            world.insert(e, kind).unwrap();
            world.insert(e, Pose::IDENTITY).unwrap();
            world.insert(e, ScaleColor::Blue).unwrap();
        }
        let mut sync = ViewSyncSystem::new();
        sync.init(&mut world);
        sync.run(&mut world, 0.016);
        let frame = world.resource::<Frame>().unwrap();
        let kinds: Vec<PartKind> = frame.segments.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![PartKind::Body(0), PartKind::Body(1), PartKind::Tail(2)]);
        assert_eq!(frame.body_count(), 2);
        assert_eq!(frame.tick, 1);
        assert!(frame.head.is_none());
    }

    #[test]
    fn reached_end_is_reported_once() {
        let mut world = World::new();
        let head = world.spawn();
        let mut sync = ViewSyncSystem::new();
        let mut cleanup = EventCleanupSystem;
        world.send_event(ReachedEnd { head });
        sync.run(&mut world, 0.016);
        assert!(world.resource::<Frame>().unwrap().reached_end);
        cleanup.run(&mut world, 0.016);
        sync.run(&mut world, 0.016);
        assert!(!world.resource::<Frame>().unwrap().reached_end);
    }
}
