//! Per-tick outputs for animation, HUD and the object layer

use crate::state::{BehaviorState, JumpPhase};
use crate::swipe::SwipePose;
use prowl_math::Vec2;
use serde::Serialize;

/// Discrete things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BehaviorEvent {
    StateChanged { from: BehaviorState, to: BehaviorState },
    JumpStarted { phase: JumpPhase, to: Vec2 },
    /// The swipe connected; `direction` points from the agent to the target
    SwipeHit { target: Vec2, direction: Vec2 },
    /// Teleported out of a trap
    Recovered { position: Vec2 },
    /// A movable was pushed out of the way
    Nudged { id: u32 },
    DistractionReached,
    DistractionExpired,
}

/// Everything collaborators read after a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutput {
    pub state: BehaviorState,
    pub status: &'static str,
    pub position: Vec2,
    pub height: f32,
    pub yaw: f32,
    pub moving: bool,
    /// Ground speed relative to patrol speed, clamped to [0, 1.5]
    pub speed: f32,
    pub jump_phase: Option<JumpPhase>,
    pub swipe_pose: Option<SwipePose>,
    pub events: Vec<BehaviorEvent>,
}

impl TickOutput {
    pub fn hit(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, BehaviorEvent::SwipeHit { .. }))
    }

    /// States entered during this tick, in order
    pub fn entered_states(&self) -> impl Iterator<Item = BehaviorState> + '_ {
        self.events.iter().filter_map(|e| match e {
            BehaviorEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
    }
}
