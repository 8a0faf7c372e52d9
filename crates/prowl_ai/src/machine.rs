//! Behavior state machine
//!
//! One [`BehaviorMachine::tick`] runs trap recovery, stall escalation,
//! distraction handling, any active jump segment and finally the current
//! state's logic, in that order. Scratch state that only means something
//! inside one state lives in [`StateScratch`] and is dropped on every
//! transition; the climb plan lives across the jump-up sequence.

use crate::climb::{best_anchor, jump_targets, nearest_anchor, ClimbPlan};
use crate::config::{AgentConfig, BehaviorConfig};
use crate::distraction::{clamp_to_room, is_valid_spot, Distraction};
use crate::error::Result;
use crate::jump::JumpSegment;
use crate::output::{BehaviorEvent, TickOutput};
use crate::patrol::pick_patrol_point;
use crate::state::BehaviorState;
use crate::swipe::{sample_swipe_pose, HitLatch, SwipePose};
use crate::world::World;
use log::{debug, info, trace, warn};
use prowl_math::{angle_delta, clamp, wrap_angle, Vec2};
use prowl_nav::{find_safe_ground_point, GridPlanner, MoveOptions, NavAgent, NavWorld, Nudge};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Height above the surface top the agent walks at
const SURFACE_STANDING: f32 = 0.02;
/// Floor on the stuck timer after a rescue nudge
const NUDGE_STUCK_FLOOR: f32 = 0.25;
const NUDGE_STUCK_SCALE: f32 = 0.55;
/// Normalized speed cap for animation blending
const MAX_SPEED_RATIO: f32 = 1.5;

/// Per-state scratch, cleared on every transition
#[derive(Debug, Clone, Default)]
struct StateScratch {
    /// Time since the state was entered
    state_time: f32,
    /// Time counted by timed states
    phase_time: f32,
    approach_lock: bool,
    /// Steering ignores clutter while approaching the anchor
    bypass: bool,
    bypass_check_at: f32,
    anchor_replan_at: f32,
    hit: HitLatch,
}

/// Drives one agent through patrol, climbing, swiping and distractions
pub struct BehaviorMachine {
    config: BehaviorConfig,
    planner: Arc<GridPlanner>,
    agent: NavAgent,
    state: BehaviorState,
    previous: Option<BehaviorState>,
    scratch: StateScratch,
    climb: ClimbPlan,
    jump: Option<JumpSegment>,
    on_surface: bool,
    patrol_target: Vec2,
    next_roll_at: f32,
    rng: StdRng,
    status: &'static str,
    moving: bool,
    swipe_pose: Option<SwipePose>,
    events: Vec<BehaviorEvent>,
    pending_nudges: Vec<Nudge>,
}

impl BehaviorMachine {
    /// Create a patrolling agent at `position`
    pub fn new(config: AgentConfig, position: Vec2, yaw: f32) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.behavior.seed);
        Ok(Self {
            planner: Arc::new(GridPlanner::new(config.nav)),
            config: config.behavior,
            agent: NavAgent::new(position, yaw),
            state: BehaviorState::Patrol,
            previous: None,
            scratch: StateScratch::default(),
            climb: ClimbPlan::default(),
            jump: None,
            on_surface: false,
            patrol_target: position,
            next_roll_at: 0.0,
            rng,
            status: BehaviorState::Patrol.status(),
            moving: false,
            swipe_pose: None,
            events: Vec::new(),
            pending_nudges: Vec::new(),
        })
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn previous(&self) -> Option<BehaviorState> {
        self.previous
    }

    pub fn status(&self) -> &'static str {
        self.status
    }

    pub fn agent(&self) -> &NavAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut NavAgent {
        &mut self.agent
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn planner(&self) -> &GridPlanner {
        &self.planner
    }

    pub fn is_on_surface(&self) -> bool {
        self.on_surface
    }

    pub fn climb_plan(&self) -> &ClimbPlan {
        &self.climb
    }

    pub fn jump(&self) -> Option<&JumpSegment> {
        self.jump.as_ref()
    }

    pub fn patrol_target(&self) -> Vec2 {
        self.patrol_target
    }

    /// Enter `to` immediately, abandoning any jump in flight
    pub fn force_transition(&mut self, world: &World, to: BehaviorState) {
        let planner = Arc::clone(&self.planner);
        let nav = world.nav(&planner);
        self.jump = None;
        self.transition(&nav, to);
    }

    /// Place a distraction at `spot` (clamped into the room)
    ///
    /// Refused while another distraction is active or when the spot is
    /// blocked, crowded by clutter, or unreachable.
    pub fn place_distraction(&self, world: &mut World, spot: Vec2) -> bool {
        if world.distraction.is_some() {
            return false;
        }
        let spot = {
            let nav = world.nav(&self.planner);
            let spot = clamp_to_room(&nav, spot);
            if !is_valid_spot(&nav, self.agent.position, self.on_surface, spot) {
                debug!("Rejected distraction at ({:.2}, {:.2})", spot.x, spot.z);
                return false;
            }
            spot
        };
        world.distraction = Some(Distraction::new(spot, world.time, self.config.distraction_lifetime));
        true
    }

    /// Advance one tick at `world.time`
    ///
    /// `dt` is capped at the configured maximum. Nudges requested during the
    /// tick are written back to `world.movables` before returning.
    pub fn tick(&mut self, world: &mut World, dt: f32) -> TickOutput {
        let dt = if dt.is_finite() {
            clamp(dt, 0.0, self.config.max_delta_time)
        } else {
            0.0
        };
        self.swipe_pose = None;

        let expired = world.distraction.is_some_and(|d| d.is_expired(world.time));
        if expired {
            world.distraction = None;
            self.events.push(BehaviorEvent::DistractionExpired);
        }
        let distraction = world.distraction;

        let planner = Arc::clone(&self.planner);
        {
            let nav = world.nav(&planner);
            self.update(&nav, distraction, expired, dt);
        }

        for nudge in self.pending_nudges.drain(..) {
            world.apply_nudge(&nudge);
            self.events.push(BehaviorEvent::Nudged { id: nudge.id });
        }
        self.output()
    }

    fn output(&mut self) -> TickOutput {
        TickOutput {
            state: self.state,
            status: self.status,
            position: self.agent.position,
            height: self.agent.height,
            yaw: self.agent.yaw,
            moving: self.moving,
            speed: clamp(self.agent.nav.last_speed / self.config.patrol_speed, 0.0, MAX_SPEED_RATIO),
            jump_phase: self.jump.as_ref().and_then(|_| self.state.jump_phase()),
            swipe_pose: self.swipe_pose,
            events: std::mem::take(&mut self.events),
        }
    }

    fn update(&mut self, nav: &NavWorld, distraction: Option<Distraction>, expired: bool, dt: f32) {
        self.scratch.state_time += dt;
        self.moving = false;

        if self.jump.is_none() {
            let goal = self.ground_goal(nav, distraction);
            let outcome = self.agent.recover_if_trapped(nav, goal);
            self.pending_nudges.extend(outcome.nudge);
            if outcome.recovered {
                self.events.push(BehaviorEvent::Recovered {
                    position: self.agent.position,
                });
                self.status = "Recovering";
                return;
            }
        }

        if self.jump.is_none() && self.agent.is_grounded() {
            self.escalate_stall(nav, distraction);
        }

        if expired && self.state.is_distraction() {
            self.transition(nav, BehaviorState::Patrol);
        }

        if self.jump.is_some() {
            self.update_jump(nav, dt);
            return;
        }

        if let Some(distraction) = distraction {
            self.update_distracted(nav, distraction, dt);
            return;
        }

        match self.state {
            BehaviorState::Patrol => self.update_patrol(nav, dt),
            BehaviorState::ToTarget => self.update_to_target(nav, dt),
            BehaviorState::PrepareJump => self.update_prepare_jump(nav, dt),
            BehaviorState::ForepawHook => self.update_forepaw_hook(nav, dt),
            BehaviorState::JumpSettle => {
                self.scratch.phase_time += dt;
                self.status = BehaviorState::JumpSettle.status();
                if self.scratch.phase_time >= self.config.jump.settle {
                    self.transition(nav, BehaviorState::ToInteractionPoint);
                }
            }
            BehaviorState::ToInteractionPoint => self.update_to_interaction_point(nav, dt),
            BehaviorState::Swipe => self.update_swipe(nav, dt),
            BehaviorState::Sit => {
                self.scratch.phase_time += dt;
                self.status = BehaviorState::Sit.status();
                if self.scratch.phase_time >= self.config.sit_duration {
                    self.transition(nav, BehaviorState::Patrol);
                }
            }
            BehaviorState::LaunchUp | BehaviorState::PullUp | BehaviorState::JumpDown => {
                // Airborne state without a segment, e.g. after a forced transition
                if self.agent.is_grounded() {
                    self.transition(nav, BehaviorState::Patrol);
                } else {
                    self.descend(nav, self.config.descend_duration, BehaviorState::Sit);
                }
            }
            BehaviorState::ToCatnip | BehaviorState::Distracted => {
                self.transition(nav, BehaviorState::Patrol);
            }
        }
    }

    fn transition(&mut self, nav: &NavWorld, to: BehaviorState) {
        if to == self.state {
            return;
        }
        let now = nav.now;
        let from = self.state;
        debug!("Behavior {} -> {} at {:.2}s", from, to, now);

        self.previous = Some(from);
        self.state = to;
        self.scratch = StateScratch::default();
        self.status = to.status();
        self.agent.nav.clear_path();
        self.agent.nav.reset_unstuck_tracking();
        self.events.push(BehaviorEvent::StateChanged { from, to });

        match to {
            BehaviorState::Patrol => {
                self.climb.clear();
                self.patrol_target = pick_patrol_point(nav, self.agent.position, &mut self.rng);
                self.next_roll_at = self.next_roll_at.max(now + self.config.roll_interval);
            }
            BehaviorState::JumpSettle => {
                self.on_surface = true;
                self.climb.clear();
                self.next_roll_at = now + self.config.roll_interval;
            }
            _ => {
                self.next_roll_at = now + self.config.roll_interval;
            }
        }
    }

    /// Floor point the agent is currently walking to, if any
    fn ground_goal(&self, nav: &NavWorld, distraction: Option<Distraction>) -> Option<Vec2> {
        match self.state {
            BehaviorState::Patrol => Some(self.patrol_target),
            BehaviorState::ToTarget => self
                .climb
                .anchor
                .or_else(|| Some(best_anchor(nav, self.agent.position))),
            BehaviorState::ToCatnip => distraction.map(|d| d.position),
            _ => None,
        }
    }

    fn escalate_stall(&mut self, nav: &NavWorld, distraction: Option<Distraction>) {
        let now = nav.now;
        if self.agent.nav.stuck_timer > self.config.stuck_reset {
            warn!(
                "Stuck for {:.2}s in {} at ({:.2}, {:.2}); abandoning",
                self.agent.nav.stuck_timer, self.state, self.agent.position.x, self.agent.position.z
            );
            self.climb.clear();
            self.agent.nav.clear_path();
            self.agent.nav.reset_unstuck_tracking();
            if self.state == BehaviorState::Patrol {
                self.patrol_target = pick_patrol_point(nav, self.agent.position, &mut self.rng);
            } else {
                self.transition(nav, BehaviorState::Patrol);
            }
        }

        if self.agent.nav.stuck_timer > self.config.stuck_rescue {
            if let Some(goal) = self.ground_goal(nav, distraction) {
                self.agent.ensure_path(nav, goal, true, true);
            }
            if self.agent.nav.stuck_timer > self.config.stuck_nudge {
                if let Some(nudge) = self.agent.nudge_blocking_movable(nav) {
                    self.pending_nudges.push(nudge);
                    self.agent.nav.next_repath_time = 0.0;
                    self.agent.nav.stuck_timer =
                        (self.agent.nav.stuck_timer * NUDGE_STUCK_SCALE).max(NUDGE_STUCK_FLOOR);
                }
            }
            trace!("Stall rescue at {:.2}s in {}", now, self.state);
        }
    }

    fn update_jump(&mut self, nav: &NavWorld, dt: f32) {
        self.status = match self.state {
            BehaviorState::LaunchUp | BehaviorState::PullUp | BehaviorState::JumpDown => self.state.status(),
            _ => "Jumping",
        };
        let Some(jump) = self.jump.as_mut() else {
            return;
        };
        let sample = jump.update(dt);
        let next = jump.next;
        self.agent.position = sample.position;
        self.agent.height = sample.height;
        if sample.completed {
            self.jump = None;
            self.agent.nav.suspend_trap_tracking(nav.now);
            self.transition(nav, next);
        }
    }

    /// Start an eased, surface-clipped segment from the current pose
    fn start_jump(&mut self, nav: &NavWorld, to: Vec2, to_height: f32, duration: f32, arc: f32, next: BehaviorState) {
        let surface = &nav.layout.surface;
        let jump = JumpSegment::new(
            self.agent.position,
            to,
            self.agent.height,
            to_height,
            duration,
            arc,
            next,
        )
        .eased()
        .with_surface_clip(surface.footprint(), surface.top_y + SURFACE_STANDING);

        debug!(
            "Jump from ({:.2}, {:.2}) to ({:.2}, {:.2}) over {:.2}s, then {}",
            self.agent.position.x, self.agent.position.z, to.x, to.z, duration, next
        );
        if let Some(phase) = self.state.jump_phase() {
            self.events.push(BehaviorEvent::JumpStarted { phase, to });
        }
        self.agent.nav.clear_path();
        self.jump = Some(jump);
    }

    /// Leave the surface for the floor near its approach point
    fn descend(&mut self, nav: &NavWorld, duration: f32, next: BehaviorState) {
        self.on_surface = false;
        self.climb.clear();
        let landing = find_safe_ground_point(nav, nav.layout.surface.approach, self.agent.position);
        self.transition(nav, BehaviorState::JumpDown);
        self.start_jump(nav, landing, 0.0, duration, self.config.descend_arc, next);
    }

    fn update_distracted(&mut self, nav: &NavWorld, distraction: Distraction, dt: f32) {
        if self.on_surface || self.state.is_on_surface() {
            self.descend(nav, self.config.distraction_descend_duration, BehaviorState::ToCatnip);
            return;
        }

        self.climb.clear();
        if !self.state.is_distraction() {
            self.transition(nav, BehaviorState::ToCatnip);
        }
        let arrived = self.agent.move_toward(
            nav,
            distraction.position,
            dt,
            self.config.distraction_speed,
            0.0,
            MoveOptions::planned(),
        );
        self.pending_nudges.extend(self.agent.take_pending_nudge());

        if arrived && self.state == BehaviorState::ToCatnip {
            self.transition(nav, BehaviorState::Distracted);
            self.events.push(BehaviorEvent::DistractionReached);
        }
        self.moving = self.state == BehaviorState::ToCatnip;
        self.status = self.state.status();
    }

    fn update_patrol(&mut self, nav: &NavWorld, dt: f32) {
        let now = nav.now;
        if now >= self.next_roll_at {
            let toppled = nav.target.is_some_and(|t| t.toppled);
            let roll = now >= self.config.roll_grace
                && !toppled
                && self.rng.gen::<f32>() < self.config.roll_chance;
            self.next_roll_at += self.config.roll_interval;
            if roll {
                self.climb.clear();
                self.transition(nav, BehaviorState::ToTarget);
                return;
            }
        }

        let reached = self.agent.move_toward(
            nav,
            self.patrol_target,
            dt,
            self.config.patrol_speed,
            0.0,
            MoveOptions::planned(),
        );
        self.pending_nudges.extend(self.agent.take_pending_nudge());
        if reached {
            self.patrol_target = pick_patrol_point(nav, self.agent.position, &mut self.rng);
        }
        self.moving = true;
        self.status = BehaviorState::Patrol.status();
    }

    fn update_to_target(&mut self, nav: &NavWorld, dt: f32) {
        let now = nav.now;
        let position = self.agent.position;
        let timed_out = self.scratch.state_time > self.config.approach_timeout;
        let stuck = self.agent.nav.stuck_timer > self.config.anchor_replan_stuck
            && now >= self.scratch.anchor_replan_at;

        if timed_out || stuck || self.climb.anchor.is_none() {
            let anchor = best_anchor(nav, position);
            trace!("Jump anchor ({:.2}, {:.2})", anchor.x, anchor.z);
            self.climb.anchor = Some(anchor);
            self.climb.clear_targets();
            self.agent.nav.clear_path();
            self.scratch.anchor_replan_at = now + self.config.anchor_replan_cooldown;
            self.scratch.bypass = false;
            self.scratch.bypass_check_at = 0.0;
            if timed_out {
                self.scratch.state_time = 0.0;
            }
        }
        let Some(anchor) = self.climb.anchor else {
            return;
        };

        if now >= self.scratch.bypass_check_at {
            let obstacles = nav.dynamic_obstacles(position);
            let reachable = nav.planner.can_reach(position, anchor, &obstacles);
            if self.scratch.bypass {
                if reachable {
                    self.scratch.bypass = false;
                }
            } else if !reachable {
                debug!("Anchor cut off by clutter; bypassing");
                self.scratch.bypass = true;
                self.agent.nav.clear_path();
            }
            self.scratch.bypass_check_at = now + self.config.bypass_check_interval;
        }

        let distance = position.distance(anchor);
        if !self.scratch.approach_lock && distance < self.config.approach_lock_radius {
            let statics = nav.static_obstacles(position);
            if statics.has_clear_travel_line(position, anchor, nav.clearance()) {
                self.scratch.approach_lock = true;
            }
        }
        if self.scratch.approach_lock && distance > self.config.approach_unlock_radius {
            self.scratch.approach_lock = false;
        }

        let options = MoveOptions::planned()
            .with_direct(self.scratch.approach_lock)
            .with_ignore_dynamic(self.scratch.bypass);
        let reached = self
            .agent
            .move_toward(nav, anchor, dt, self.config.approach_speed, 0.0, options);
        self.pending_nudges.extend(self.agent.take_pending_nudge());
        self.moving = true;
        self.status = if self.scratch.bypass {
            "Approaching jump point (bypassing clutter)"
        } else {
            BehaviorState::ToTarget.status()
        };

        if reached {
            self.climb.clear_targets();
            self.agent.nav.clear_path();
            self.transition(nav, BehaviorState::PrepareJump);
        }
    }

    fn update_prepare_jump(&mut self, nav: &NavWorld, dt: f32) {
        self.scratch.phase_time += dt;
        let surface = &nav.layout.surface;

        let anchor = match self.climb.anchor {
            Some(anchor) => anchor,
            None => {
                let anchor = nearest_anchor(nav, self.agent.position);
                self.climb.anchor = Some(anchor);
                anchor
            }
        };
        self.agent.position = anchor;
        self.agent.height = 0.0;
        let targets = *self.climb.targets.get_or_insert_with(|| jump_targets(surface, anchor));

        let desired = (targets.hook - self.agent.position).yaw();
        let budget = nav.planner.config().max_turn_rate * dt;
        let turn = angle_delta(desired, self.agent.yaw) * (dt * self.config.prepare_turn_gain).min(1.0);
        self.agent.yaw = wrap_angle(self.agent.yaw + clamp(turn, -budget, budget));
        self.status = BehaviorState::PrepareJump.status();

        if self.scratch.phase_time >= self.config.jump.prepare {
            self.transition(nav, BehaviorState::LaunchUp);
            self.start_jump(
                nav,
                targets.hook,
                surface.top_y - self.config.hook_drop,
                self.config.jump.launch,
                self.config.launch_arc,
                BehaviorState::ForepawHook,
            );
        }
    }

    fn update_forepaw_hook(&mut self, nav: &NavWorld, dt: f32) {
        self.scratch.phase_time += dt;
        self.status = BehaviorState::ForepawHook.status();
        if self.scratch.phase_time < self.config.jump.hook {
            return;
        }
        match self.climb.targets {
            Some(targets) => {
                self.transition(nav, BehaviorState::PullUp);
                self.start_jump(
                    nav,
                    targets.top,
                    nav.layout.surface.top_y + SURFACE_STANDING,
                    self.config.jump.pull,
                    self.config.pull_arc,
                    BehaviorState::JumpSettle,
                );
            }
            None => self.descend(nav, self.config.descend_duration, BehaviorState::Sit),
        }
    }

    fn update_to_interaction_point(&mut self, nav: &NavWorld, dt: f32) {
        let Some(target) = nav.target else {
            self.descend(nav, self.config.descend_duration, BehaviorState::Sit);
            return;
        };
        let point = target.position + self.config.interaction_offset;
        let level = nav.layout.surface.top_y + SURFACE_STANDING;
        let reached = self
            .agent
            .move_toward(nav, point, dt, self.config.surface_speed, level, MoveOptions::planned());
        self.keep_away_from_target(nav);
        self.moving = true;
        self.status = BehaviorState::ToInteractionPoint.status();

        let close = self.agent.position.distance(point) < self.config.interaction_reach;
        if reached || close {
            self.transition(nav, BehaviorState::Swipe);
        }
    }

    fn update_swipe(&mut self, nav: &NavWorld, dt: f32) {
        self.scratch.phase_time += dt;
        self.agent.height = nav.layout.surface.top_y + SURFACE_STANDING;
        self.keep_away_from_target(nav);
        self.status = BehaviorState::Swipe.status();

        let timing = self.config.swipe;
        let t = self.scratch.phase_time;
        let pose = sample_swipe_pose(t, &timing);
        self.swipe_pose = Some(pose);

        if self.scratch.hit.update(t, &pose, &timing) {
            if let Some(target) = nav.target {
                let direction = (target.position - self.agent.position).normalize_or(Vec2::X);
                info!("Swipe hit at ({:.2}, {:.2})", target.position.x, target.position.z);
                self.events.push(BehaviorEvent::SwipeHit {
                    target: target.position,
                    direction,
                });
            }
        }

        if pose.done {
            self.descend(nav, self.config.descend_duration, BehaviorState::Sit);
        }
    }

    /// Push the agent out to the keep-away radius around an upright target
    fn keep_away_from_target(&mut self, nav: &NavWorld) {
        let Some(target) = nav.target.filter(|t| !t.toppled) else {
            return;
        };
        let min_distance = self.config.target_keep_away;
        let offset = self.agent.position - target.position;
        let distance = offset.length();
        if distance >= min_distance {
            return;
        }
        let direction = if distance < 1e-4 {
            Vec2::from_yaw(self.agent.yaw)
        } else {
            offset * (1.0 / distance)
        };
        self.agent.position = target.position + direction * min_distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use prowl_math::consts::TAU;
    use prowl_nav::MovableObject;

    const DT: f32 = 1.0 / 60.0;

    fn open_world() -> World {
        let mut world = World::study_room();
        world.layout.containers.clear();
        world.layout.furniture.clear();
        world
    }

    fn machine_at(position: Vec2) -> BehaviorMachine {
        BehaviorMachine::new(AgentConfig::default(), position, 0.0).unwrap()
    }

    fn step(machine: &mut BehaviorMachine, world: &mut World) -> TickOutput {
        world.time += DT;
        machine.tick(world, DT)
    }

    #[test]
    fn test_starts_patrolling() {
        let mut world = open_world();
        let mut machine = machine_at(Vec2::new(1.0, 0.0));
        let out = step(&mut machine, &mut world);
        assert_eq!(out.state, BehaviorState::Patrol);
        assert_eq!(out.status, "Patrolling");
        assert_eq!(machine.previous(), None);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AgentConfig::default();
        config.behavior.max_delta_time = 0.0;
        assert!(BehaviorMachine::new(config, Vec2::ZERO, 0.0).is_err());
    }

    #[test]
    fn test_delta_time_is_capped() {
        let mut world = open_world();
        let mut machine = machine_at(Vec2::new(1.0, 0.0));
        machine.force_transition(&world, BehaviorState::Sit);
        world.time = 1.0;
        machine.tick(&mut world, 10.0);
        // One capped tick cannot finish a 1.25s sit
        assert_eq!(machine.state(), BehaviorState::Sit);
        assert_relative_eq!(machine.scratch.phase_time, machine.config().max_delta_time);
    }

    #[test]
    fn test_roll_waits_for_grace() {
        let mut config = AgentConfig::default();
        config.behavior.roll_chance = 1.0;
        config.behavior.roll_grace = 2.0;
        config.behavior.roll_interval = 0.5;
        let mut machine = BehaviorMachine::new(config, Vec2::new(1.0, 0.0), 0.0).unwrap();
        let mut world = open_world();

        let mut switched_at = None;
        for _ in 0..240 {
            let out = step(&mut machine, &mut world);
            if out.state == BehaviorState::ToTarget {
                switched_at = Some(world.time);
                break;
            }
        }
        let switched_at = switched_at.unwrap();
        assert!(switched_at >= 2.0 && switched_at < 2.6, "switched at {switched_at}");
    }

    #[test]
    fn test_toppled_target_suppresses_roll() {
        let mut config = AgentConfig::default();
        config.behavior.roll_chance = 1.0;
        config.behavior.roll_grace = 0.0;
        let mut machine = BehaviorMachine::new(config, Vec2::new(1.0, 0.0), 0.0).unwrap();
        let mut world = open_world();
        world.target.toppled = true;

        for _ in 0..300 {
            assert_eq!(step(&mut machine, &mut world).state, BehaviorState::Patrol);
        }
    }

    #[test]
    fn test_transition_clears_scratch() {
        let mut world = open_world();
        let mut machine = machine_at(Vec2::new(1.0, 0.0));
        machine.force_transition(&world, BehaviorState::Sit);
        for _ in 0..10 {
            step(&mut machine, &mut world);
        }
        assert!(machine.scratch.phase_time > 0.0);

        machine.force_transition(&world, BehaviorState::Patrol);
        assert_eq!(machine.scratch.phase_time, 0.0);
        assert_eq!(machine.scratch.state_time, 0.0);
        assert_eq!(machine.previous(), Some(BehaviorState::Sit));
    }

    #[test]
    fn test_keep_away_pushes_out() {
        let world = open_world();
        let mut machine = machine_at(world.target.position + Vec2::new(0.1, 0.0));
        let planner = Arc::clone(&machine.planner);
        let nav = world.nav(&planner);
        machine.keep_away_from_target(&nav);
        assert_relative_eq!(
            machine.agent().position.distance(world.target.position),
            machine.config().target_keep_away,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_distraction_placement() {
        let mut world = open_world();
        let machine = machine_at(Vec2::new(1.0, 0.0));
        assert!(machine.place_distraction(&mut world, Vec2::new(-1.0, 1.0)));
        let distraction = world.distraction.unwrap();
        assert_relative_eq!(distraction.expires_at, world.time + machine.config().distraction_lifetime);
        // Only one at a time
        assert!(!machine.place_distraction(&mut world, Vec2::new(2.0, -2.0)));
    }

    #[test]
    fn test_distraction_pulls_agent_and_expires() {
        let mut world = open_world();
        let mut machine = machine_at(Vec2::new(1.0, 0.0));
        world.distraction = Some(Distraction::new(Vec2::new(2.0, 0.0), 0.0, 3.0));

        let mut reached = false;
        let mut expired = false;
        for _ in 0..300 {
            let out = step(&mut machine, &mut world);
            reached |= out.events.contains(&BehaviorEvent::DistractionReached);
            if out.events.contains(&BehaviorEvent::DistractionExpired) {
                expired = true;
                assert_eq!(out.state, BehaviorState::Patrol);
                break;
            }
        }
        assert!(reached);
        assert!(expired);
        assert!(world.distraction.is_none());
    }

    #[test]
    fn test_cut_off_anchor_switches_to_bypass() {
        let mut world = open_world();
        let anchor = Vec2::new(-6.25, -3.9);
        // Ring of clutter sealing the anchor in
        world.movables = (0..10)
            .map(|i| {
                let angle = i as f32 * TAU / 10.0;
                MovableObject::loose(i, anchor + Vec2::from_polar(angle) * 0.45, 0.12)
            })
            .collect();
        let mut machine = machine_at(Vec2::new(-7.3, -2.4));
        machine.force_transition(&world, BehaviorState::ToTarget);
        machine.climb.anchor = Some(anchor);

        let out = step(&mut machine, &mut world);
        assert_eq!(out.state, BehaviorState::ToTarget);
        assert!(machine.scratch.bypass);
        assert_eq!(out.status, "Approaching jump point (bypassing clutter)");
        assert_eq!(machine.climb_plan().anchor, Some(anchor));
    }
}
