//! Prowl AI - Behavior for a Room-Roaming Agent
//!
//! A frame-stepped state machine on top of `prowl_nav`: the agent patrols,
//! occasionally climbs onto a raised surface to swipe at a target, and drops
//! everything for a time-limited distraction.
//!
//! # Features
//!
//! - Explicit state enum with per-state scratch cleared on every transition
//! - Eased jump arcs that never dip through the surface
//! - Anchor selection scored by route length and clutter
//! - Swipe pose sampling with a latched, fire-once hit
//! - Seeded patrol sampling and approach rolls
//!
//! # Example
//!
//! ```ignore
//! use prowl_ai::prelude::*;
//!
//! let mut world = World::study_room();
//! let mut machine = BehaviorMachine::new(AgentConfig::default(), Vec2::new(1.5, 1.7), 0.0)?;
//!
//! loop {
//!     world.time += dt;
//!     let out = machine.tick(&mut world, dt);
//!     if out.hit() {
//!         world.target.toppled = true;
//!     }
//! }
//! ```

pub mod climb;
pub mod config;
pub mod distraction;
pub mod error;
pub mod jump;
pub mod machine;
pub mod output;
pub mod patrol;
pub mod state;
pub mod swipe;
pub mod world;

pub mod prelude {
    pub use crate::climb::{best_anchor, jump_targets, nearest_anchor, ClimbPlan, JumpTargets};
    pub use crate::config::{AgentConfig, BehaviorConfig, JumpTiming, SwipeTiming};
    pub use crate::distraction::Distraction;
    pub use crate::error::{AiError, Result};
    pub use crate::jump::{JumpSample, JumpSegment, SurfaceClip};
    pub use crate::machine::BehaviorMachine;
    pub use crate::output::{BehaviorEvent, TickOutput};
    pub use crate::patrol::pick_patrol_point;
    pub use crate::state::{BehaviorState, JumpPhase};
    pub use crate::swipe::{sample_swipe_pose, HitLatch, SwipePose};
    pub use crate::world::World;
    pub use prowl_math::Vec2;
}

pub use prelude::*;
