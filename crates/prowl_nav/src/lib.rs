//! Prowl Nav - Ground Navigation for a Single Agent
//!
//! Obstacle model, grid planner and local steering for an agent crossing a
//! cluttered room, plus the stuck and trap recovery that keeps it moving when
//! clutter closes in.
//!
//! # Features
//!
//! - Obstacle snapshots rebuilt per query (boxes, oriented boxes, circles)
//! - Grid A* with an expanded neighbor fan and string-pull smoothing
//! - Candidate-heading steering with turn-rate limits
//! - Stall escalation: replan, path reset, trap recovery
//!
//! # Architecture
//!
//! ```text
//!   RoomLayout + movables + target
//!                 │
//!                 ▼
//!         ObstacleSnapshot ──► ObstacleSet
//!                                 │
//!            ┌────────────────────┼───────────────────┐
//!            ▼                    ▼                   ▼
//!       GridPlanner         NavAgent::move_toward   recover_if_trapped
//!      (A*, smoothing)      (steering, stuck time)  (teleport, nudge)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use prowl_nav::prelude::*;
//!
//! let layout = RoomLayout::study_room();
//! let planner = GridPlanner::new(NavConfig::default());
//! let mut agent = NavAgent::new(Vec2::new(1.5, 1.7), 0.0);
//!
//! let world = NavWorld::new(&layout, &movables, None, &planner, now);
//! agent.recover_if_trapped(&world, Some(goal));
//! let arrived = agent.move_toward(&world, goal, dt, 0.95, 0.0, MoveOptions::planned());
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod obstacle;
pub mod path;
pub mod planner;
pub mod recovery;
pub mod scene;
pub mod steering;

pub mod prelude {
    //! Common imports for navigation
    pub use crate::agent::{MoveOptions, NavAgent, NavState, NavWorld, GROUND_LEVEL};
    pub use crate::config::NavConfig;
    pub use crate::error::{NavError, Result};
    pub use crate::obstacle::{Contact, Obstacle, ObstacleSet};
    pub use crate::path::NavPath;
    pub use crate::planner::GridPlanner;
    pub use crate::recovery::{
        find_recovery_point, find_safe_ground_point, MovableOverlap, Nudge, ObstacleIntrusion,
        RecoveryOutcome,
    };
    pub use crate::scene::{
        Fixture, MovableObject, MovableShape, ObstacleSnapshot, RaisedSurface, RoomLayout, TargetObject,
    };
    pub use crate::steering::SteerChoice;
    pub use prowl_math::{Rect, Vec2};
}

pub use prelude::*;
