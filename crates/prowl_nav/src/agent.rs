//! Navigating agent and its per-tick world view

use crate::obstacle::ObstacleSet;
use crate::path::NavPath;
use crate::planner::GridPlanner;
use crate::recovery::Nudge;
use crate::scene::{MovableObject, ObstacleSnapshot, RoomLayout, TargetObject};
use prowl_math::Vec2;

/// Height at or below which the agent counts as grounded
pub const GROUND_LEVEL: f32 = 0.02;

/// Read-only view of the world for one navigation call
#[derive(Debug, Clone, Copy)]
pub struct NavWorld<'a> {
    pub layout: &'a RoomLayout,
    pub movables: &'a [MovableObject],
    pub target: Option<&'a TargetObject>,
    pub planner: &'a GridPlanner,
    /// Simulation time in seconds
    pub now: f32,
}

impl<'a> NavWorld<'a> {
    pub fn new(
        layout: &'a RoomLayout,
        movables: &'a [MovableObject],
        target: Option<&'a TargetObject>,
        planner: &'a GridPlanner,
        now: f32,
    ) -> Self {
        Self {
            layout,
            movables,
            target,
            planner,
            now,
        }
    }

    pub fn snapshot(&self, agent_position: Vec2) -> ObstacleSnapshot<'a> {
        ObstacleSnapshot {
            layout: self.layout,
            movables: self.movables,
            target: self.target,
            agent_position,
            config: self.planner.config(),
        }
    }

    /// Fixed geometry only
    pub fn static_obstacles(&self, agent_position: Vec2) -> ObstacleSet {
        self.snapshot(agent_position).build_obstacles(false, false)
    }

    /// Fixed geometry plus every settled low movable, including ones the
    /// agent is touching
    pub fn dynamic_obstacles(&self, agent_position: Vec2) -> ObstacleSet {
        self.snapshot(agent_position).build_obstacles(true, true)
    }

    pub fn clearance(&self) -> f32 {
        self.planner.clearance()
    }
}

/// Options for [`NavAgent::move_toward`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Skip planning when the straight line is statically clear
    pub direct: bool,
    /// Plan and steer against fixed geometry only
    pub ignore_dynamic: bool,
}

impl MoveOptions {
    pub fn planned() -> Self {
        Self::default()
    }

    /// Straight line ignoring clutter; falls back to planning when fixed
    /// geometry is in the way
    pub fn bypass() -> Self {
        Self {
            direct: true,
            ignore_dynamic: true,
        }
    }

    pub fn with_direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }

    pub fn with_ignore_dynamic(mut self, ignore: bool) -> Self {
        self.ignore_dynamic = ignore;
        self
    }
}

/// Navigation bookkeeping carried between ticks
#[derive(Debug, Clone, Default)]
pub struct NavState {
    /// Goal the current path was planned to
    pub goal: Vec2,
    pub path: NavPath,
    /// Time after which the path is replanned regardless of validity
    pub next_repath_time: f32,
    /// Heading chosen by local steering on the previous tick
    pub last_steer_yaw: Option<f32>,
    /// Time spent without meaningful progress
    pub stuck_timer: f32,
    /// Accumulated trap pressure
    pub trap_timer: f32,
    /// Ground speed achieved on the previous tick
    pub last_speed: f32,
    /// Time of the last trap check
    pub trap_check_at: f32,
    /// Position at the last trap check
    pub trap_check_position: Option<Vec2>,
    /// Nudge requested by steering when no heading survives
    pub pending_nudge: Option<Nudge>,
}

impl NavState {
    /// Drop the path and steering memory
    pub fn clear_path(&mut self) {
        self.path = NavPath::empty();
        self.next_repath_time = 0.0;
        self.last_steer_yaw = None;
    }

    /// Forget stall history
    pub fn reset_unstuck_tracking(&mut self) {
        self.stuck_timer = 0.0;
        self.trap_timer = 0.0;
        self.trap_check_position = None;
    }

    /// Clear everything (state entry, teleport)
    pub fn reset(&mut self, now: f32) {
        self.clear_path();
        self.reset_unstuck_tracking();
        self.last_speed = 0.0;
        self.trap_check_at = now;
        self.pending_nudge = None;
    }

    /// Drop trap pressure and restart sampling (airborne or scripted motion)
    pub fn suspend_trap_tracking(&mut self, now: f32) {
        self.trap_timer = 0.0;
        self.trap_check_position = None;
        self.trap_check_at = now;
    }
}

/// A single ground agent
#[derive(Debug, Clone, Default)]
pub struct NavAgent {
    pub position: Vec2,
    /// Facing, `atan2(dx, dz)` convention
    pub yaw: f32,
    /// Height above the floor
    pub height: f32,
    pub nav: NavState,
}

impl NavAgent {
    pub fn new(position: Vec2, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            height: 0.0,
            nav: NavState::default(),
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.height <= GROUND_LEVEL
    }

    /// Move instantly, dropping path and stall history
    pub fn teleport(&mut self, position: Vec2, now: f32) {
        self.position = position;
        self.nav.reset(now);
    }

    /// Take the nudge steering asked for, if any
    pub fn take_pending_nudge(&mut self) -> Option<Nudge> {
        self.nav.pending_nudge.take()
    }
}
