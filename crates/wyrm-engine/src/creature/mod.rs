//! The creature: a head that follows the path and a growing chain of body
//! segments and a tail that trail it at fixed offsets.
//!
//! Consuming a body scale queues a *rebuke*: the head is eased back by one
//! segment spacing and the segments between the head and the gap move with
//! it, so the chain closes up without teleporting. Rebukes live in the
//! [`RebukeLedger`] resource; finished ones stay there because follower
//! positions keep depending on their applied shift.

pub mod growth;
pub mod motion;
pub mod spawn;

use wyrm_ecs::prelude::*;

use crate::components::{FollowOffset, PartKind, ScaleVisualState};
use crate::config::{ColorRun, GameConfig, ScaleColor};
use crate::path::{PathProvider, Pose};

pub use growth::CreatureGrowthSystem;
pub use motion::CreatureMotionSystem;
pub use spawn::CreatureSpawnSystem;

// ---------------------------------------------------------------------------
// Rebukes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebukeState {
    Rising,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebuke {
    /// Body index of the consumed scale.
    pub removed_index: u32,
    pub shift: f32,
    pub elapsed: f32,
    pub duration: f32,
    /// Shift applied so far, in `[0, shift]`.
    pub applied: f32,
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl Rebuke {
    pub fn new(removed_index: u32, shift: f32, duration: f32) -> Self {
        Self {
            removed_index,
            shift,
            elapsed: 0.0,
            duration,
            applied: 0.0,
        }
    }

    pub fn state(&self) -> RebukeState {
        if self.elapsed >= self.duration {
            RebukeState::Complete
        } else {
            RebukeState::Rising
        }
    }

    /// Advance by `dt`; returns how much more shift this step applied.
    fn advance(&mut self, dt: f32) -> f32 {
        if self.state() == RebukeState::Complete {
            return 0.0;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let applied = if self.duration <= 1e-4 {
            self.shift
        } else {
            self.shift * smoothstep(self.elapsed / self.duration)
        };
        let delta = applied - self.applied;
        self.applied = applied;
        delta
    }
}

/// Every rebuke since the simulation started.
#[derive(Debug, Clone, Default)]
pub struct RebukeLedger {
    rebukes: Vec<Rebuke>,
}

impl RebukeLedger {
    pub fn push(&mut self, rebuke: Rebuke) {
        self.rebukes.push(rebuke);
    }

    /// Step every rising rebuke. Returns the head-distance delta of this step.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.rebukes.iter_mut().map(|r| r.advance(dt)).sum()
    }

    pub fn total_applied(&self) -> f32 {
        self.rebukes.iter().map(|r| r.applied).sum()
    }

    /// Extra distance a follower of `kind` gets back. Bodies recover the
    /// shift of rebukes at or ahead of their index; the tail recovers all.
    pub fn compensation_for(&self, kind: PartKind) -> f32 {
        match kind {
            PartKind::Head => 0.0,
            PartKind::Body(index) => self
                .rebukes
                .iter()
                .filter(|r| r.removed_index <= index)
                .map(|r| r.applied)
                .sum(),
            PartKind::Tail(_) => self.total_applied(),
        }
    }

    /// Most recently queued rebuke that is still rising.
    pub fn latest_rising(&self) -> Option<&Rebuke> {
        self.rebukes
            .iter()
            .rev()
            .find(|r| r.state() == RebukeState::Rising)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rebuke> {
        self.rebukes.iter()
    }

    pub fn len(&self) -> usize {
        self.rebukes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rebukes.is_empty()
    }
}

/// Rendered path distance of a follower.
pub fn follower_distance(
    ledger: Option<&RebukeLedger>,
    head_distance: f32,
    offset: f32,
    kind: PartKind,
    path_length: f32,
) -> f32 {
    let compensation = ledger.map_or(0.0, |l| l.compensation_for(kind));
    (head_distance - offset + compensation).clamp(0.0, path_length.max(0.0))
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Resolve the color of body segment `index` from the run-length schedule.
///
/// Runs with a non-positive count are skipped. Past the end of the schedule
/// the last positive run's color is used; if no run is positive, the first
/// run's. An empty schedule yields [`ScaleColor::White`].
pub fn color_for_index(runs: &[ColorRun], index: u32) -> (ScaleColor, u32) {
    let Some(first) = runs.first() else {
        return (ScaleColor::White, ScaleColor::White.offset());
    };
    let mut start = 0u32;
    let mut last_positive = None;
    for run in runs.iter().filter(|r| r.count > 0) {
        let end = start + run.count as u32;
        if index < end {
            return (run.color, run.color_offset);
        }
        start = end;
        last_positive = Some(run);
    }
    let run = last_positive.unwrap_or(first);
    (run.color, run.color_offset)
}

// ---------------------------------------------------------------------------
// Segment spawning
// ---------------------------------------------------------------------------

/// Create a body or tail segment behind `head`, already placed where it
/// belongs this tick.
pub(crate) fn spawn_segment(
    world: &mut World,
    head: Entity,
    kind: PartKind,
    config: &GameConfig,
    path: &dyn PathProvider,
) -> Result<Entity, EcsError> {
    let index = kind.index().unwrap_or(0);
    let offset = (index as f32 + 1.0) * config.segment_spacing;
    let head_distance = world
        .get::<crate::components::PathFollower>(head)
        .map_or(0.0, |f| f.distance);
    let distance = follower_distance(
        world.resource::<RebukeLedger>(),
        head_distance,
        offset,
        kind,
        path.length(),
    );
    let (color, _) = color_for_index(&config.scale_colors, index);

    let segment = world.spawn();
    world.insert(segment, kind)?;
    world.insert(segment, FollowOffset { head, offset })?;
    world.insert(segment, color)?;
    world.insert(segment, ScaleVisualState::default())?;
    world.insert::<Pose>(segment, path.evaluate(distance))?;
    tracing::debug!(?kind, ?color, distance, "segment spawned");
    Ok(segment)
}
