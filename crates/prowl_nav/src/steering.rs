//! Local steering: turns a planned path into per-tick motion
//!
//! Each grounded tick chases the next unconsumed waypoint. Facing turns at a
//! capped rate; a fan of candidate headings around the chase bearing is
//! scored and the best one that stays clear of obstacles is taken.

use crate::agent::{MoveOptions, NavAgent, NavWorld};
use crate::obstacle::ObstacleSet;
use log::trace;
use prowl_math::{angle_delta, clamp, lerp, wrap_angle, Vec2};

/// Heading offsets tried around the chase bearing, smallest first
pub const STEER_OFFSETS: [f32; 13] = [
    0.0, 0.2, -0.2, 0.42, -0.42, 0.66, -0.66, 0.92, -0.92, 1.22, -1.22, 1.48, -1.48,
];

/// Chase points closer than this are treated as reached without moving
const CHASE_REACHED: f32 = 0.06;
/// Goal movement under which an existing path is kept
const PATH_KEEP_EPSILON: f32 = 0.05;
/// Heading error span over which the slow-turn scale ramps down
const SLOW_TURN_SPAN: f32 = 0.9;
const SLOW_TURN_MIN_SCALE: f32 = 0.2;
/// Turning in place accrues stuck time at this fraction of dt
const TURN_STUCK_RATE: f32 = 0.4;
const TURN_STUCK_REPATH: f32 = 0.4;
const NO_STEER_REPATH: f32 = 0.3;
const NO_STEER_NUDGE: f32 = 0.55;
/// Candidates facing further than this from the body are skipped until stuck
const FACING_GATE: f32 = 0.95;
const FACING_GATE_STUCK: f32 = 0.26;
/// Minimum forward progress before a candidate counts as backtracking
const BACKTRACK_PROGRESS: f32 = -0.08;
const DYNAMIC_AHEAD_PENALTY: f32 = 0.95;
/// Stall is only counted while farther than this from the chase point
const STALL_MIN_DISTANCE: f32 = 0.18;
const STUCK_DECAY: f32 = 0.9;

/// Heading picked by local steering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerChoice {
    pub yaw: f32,
    pub direction: Vec2,
    pub score: f32,
}

impl NavAgent {
    /// Advance one tick toward `target`
    ///
    /// `level` is the height the agent moves at; above ground level the motion
    /// is a plain interpolation with no obstacle avoidance. Returns true once
    /// within the arrive radius of `target`.
    pub fn move_toward(
        &mut self,
        world: &NavWorld,
        target: Vec2,
        dt: f32,
        speed: f32,
        level: f32,
        options: MoveOptions,
    ) -> bool {
        let config = world.planner.config();
        let grounded = level <= crate::agent::GROUND_LEVEL;
        let clearance = world.clearance();
        let mut direct = options.direct;
        let mut ignore_dynamic = options.ignore_dynamic;
        let mut chase = target;
        self.height = level;

        if grounded {
            if direct {
                let statics = world.static_obstacles(self.position);
                if statics.is_blocked(target, clearance)
                    || !statics.has_clear_exit_line(self.position, target, clearance)
                {
                    direct = false;
                    ignore_dynamic = false;
                }
            }
            if !direct {
                let goal_changed = self.nav.goal.distance(target) > config.goal_epsilon;
                let repath_due = world.now >= self.nav.next_repath_time;
                let force = goal_changed || repath_due;
                self.ensure_path(world, target, force, !ignore_dynamic);

                if self.nav.path.len() > 1 {
                    chase = self.next_chase_point(config.waypoint_radius);
                    let segment_obstacles = if ignore_dynamic {
                        world.static_obstacles(self.position)
                    } else {
                        world.dynamic_obstacles(self.position)
                    };
                    if !segment_obstacles.has_clear_exit_line(self.position, chase, clearance) {
                        self.ensure_path(world, target, true, !ignore_dynamic);
                        if self.nav.path.len() > 1 {
                            chase = self.next_chase_point(config.waypoint_radius);
                        }
                    }
                }
                if self.nav.path.len() <= 1 {
                    self.nav.last_speed = 0.0;
                    return false;
                }
            }
        }

        let to_chase = chase - self.position;
        let d = to_chase.length();
        if d < CHASE_REACHED {
            self.nav.last_speed = 0.0;
            return self.position.distance(target) < config.arrive_radius;
        }

        let mut turn_budget = config.max_turn_rate * dt;
        let heading_error = self.rotate_toward(to_chase.yaw(), &mut turn_budget);
        let mut step = d.min(speed * dt);

        if grounded {
            let error = heading_error.abs();
            if error > config.turn_slow_threshold {
                let t = clamp((error - config.turn_slow_threshold) / SLOW_TURN_SPAN, 0.0, 1.0);
                step *= lerp(1.0, SLOW_TURN_MIN_SCALE, t);
            }
            if error > config.turn_stop_threshold {
                self.nav.last_speed = 0.0;
                self.nav.stuck_timer += dt * TURN_STUCK_RATE;
                if self.nav.stuck_timer > TURN_STUCK_REPATH && world.now >= self.nav.next_repath_time {
                    self.ensure_path(world, target, true, !ignore_dynamic);
                }
                return false;
            }

            let statics = world.static_obstacles(self.position);
            let dynamics = (!ignore_dynamic).then(|| world.dynamic_obstacles(self.position));
            let Some(steer) = self.choose_ground_steer(world, chase, step, &statics, dynamics.as_ref()) else {
                self.nav.stuck_timer += dt;
                self.nav.last_speed = 0.0;
                if self.nav.stuck_timer > NO_STEER_NUDGE && self.nav.pending_nudge.is_none() {
                    self.nav.pending_nudge = self.nudge_blocking_movable(world);
                }
                if self.nav.stuck_timer > NO_STEER_REPATH && world.now >= self.nav.next_repath_time {
                    self.ensure_path(world, target, true, !ignore_dynamic);
                }
                if self.nav.stuck_timer > config.stuck_path_reset {
                    self.nav.clear_path();
                }
                return false;
            };

            let before = self.position;
            let facing_error = angle_delta(steer.yaw, self.yaw).abs();
            let forward_scale = clamp(1.0 - facing_error / 1.7, 0.26, 1.0);
            self.position += steer.direction * (step * forward_scale);
            self.nav.last_steer_yaw = Some(steer.yaw);
            self.rotate_toward(steer.yaw, &mut turn_budget);

            let moved = self.position.distance(before);
            if moved < config.stuck_speed * dt && d > STALL_MIN_DISTANCE {
                self.nav.stuck_timer += dt;
                if self.nav.stuck_timer > config.stuck_repath && world.now >= self.nav.next_repath_time {
                    self.ensure_path(world, target, true, !ignore_dynamic);
                }
            } else {
                self.nav.stuck_timer = (self.nav.stuck_timer - dt * STUCK_DECAY).max(0.0);
            }
            self.nav.last_speed = moved / dt.max(1e-5);
            return self.position.distance(target) < config.arrive_radius;
        }

        let before = self.position;
        self.position += to_chase * (step / d);
        self.nav.last_speed = self.position.distance(before) / dt.max(1e-5);
        self.position.distance(target) < config.arrive_radius
    }

    /// Plan to `target` unless the current path already leads there
    ///
    /// Only grounded agents plan. `use_dynamic` includes clutter in the plan.
    pub fn ensure_path(&mut self, world: &NavWorld, target: Vec2, force: bool, use_dynamic: bool) {
        if !self.is_grounded() {
            return;
        }
        if !force && self.nav.path.len() > 1 && self.nav.goal.distance(target) < PATH_KEEP_EPSILON {
            return;
        }
        let obstacles = if use_dynamic {
            world.dynamic_obstacles(self.position)
        } else {
            world.static_obstacles(self.position)
        };
        let mut path = world.planner.compute_path(self.position, target, &obstacles);
        if path.len() > 1 {
            path.current_index = 1;
        }
        trace!(
            "Replanned to ({:.2}, {:.2}): {} waypoints, {:.2} to go (dynamic: {})",
            target.x,
            target.z,
            path.len(),
            path.remaining_distance(self.position),
            use_dynamic
        );
        self.nav.path = path;
        self.nav.goal = target;
        self.nav.next_repath_time = world.now + world.planner.config().repath_interval;
    }

    /// Skip waypoints already within reach and return the one to chase
    fn next_chase_point(&mut self, reach: f32) -> Vec2 {
        let position = self.position;
        let path = &mut self.nav.path;
        let last = path.len() - 1;
        path.current_index = path.current_index.clamp(1, last);
        while path.current_index < last
            && path.current_waypoint().map_or(false, |w| position.distance(w) < reach)
        {
            path.advance();
        }
        path.waypoints[path.current_index]
    }

    /// Turn toward `yaw` by at most the remaining budget; returns the heading
    /// error measured before turning
    pub fn rotate_toward(&mut self, yaw: f32, budget: &mut f32) -> f32 {
        let delta = angle_delta(yaw, self.yaw);
        let applied = clamp(delta, -*budget, *budget);
        self.yaw = wrap_angle(self.yaw + applied);
        *budget -= applied.abs();
        delta
    }

    /// Score the heading fan toward `target`; backtracking candidates are
    /// only considered when nothing else survives
    pub fn choose_ground_steer(
        &self,
        world: &NavWorld,
        target: Vec2,
        step: f32,
        statics: &ObstacleSet,
        dynamics: Option<&ObstacleSet>,
    ) -> Option<SteerChoice> {
        let config = world.planner.config();
        let clearance = world.clearance();
        let to_goal = target - self.position;
        let goal_len = to_goal.length().max(0.001);
        let goal_yaw = to_goal.yaw();
        let previous_yaw = self.nav.last_steer_yaw.unwrap_or(goal_yaw);
        let look_ahead = step.max(config.look_ahead.min(step * 2.2));

        let evaluate = |offset: f32, allow_backtrack: bool| -> Option<SteerChoice> {
            let yaw = goal_yaw + offset;
            let direction = Vec2::from_yaw(yaw);
            let facing_error = angle_delta(yaw, self.yaw).abs();
            if self.nav.stuck_timer < FACING_GATE_STUCK && facing_error > FACING_GATE {
                return None;
            }

            let probe = self.position + direction * step;
            if statics.is_blocked(probe, clearance) {
                return None;
            }
            if dynamics.is_some_and(|d| d.is_blocked(probe, clearance)) {
                return None;
            }

            let progress = to_goal.dot(direction) / goal_len;
            if !allow_backtrack && progress < BACKTRACK_PROGRESS {
                return None;
            }

            let ahead = self.position + direction * look_ahead;
            if statics.is_blocked(ahead, clearance) {
                return None;
            }
            let dynamic_ahead = dynamics.is_some_and(|d| d.is_blocked(ahead, clearance));

            let mut score = offset.abs() * 0.52
                + (1.0 - progress) * 1.4
                + target.distance_squared(probe) * 0.015
                + angle_delta(yaw, previous_yaw).abs() * config.steer_switch_penalty
                + facing_error * config.steer_facing_penalty;
            if dynamic_ahead {
                score += DYNAMIC_AHEAD_PENALTY;
            }
            Some(SteerChoice { yaw, direction, score })
        };

        let pick = |allow_backtrack: bool| {
            STEER_OFFSETS
                .iter()
                .filter_map(|&offset| evaluate(offset, allow_backtrack))
                .fold(None, |best: Option<SteerChoice>, c| match best {
                    Some(b) if b.score <= c.score => Some(b),
                    _ => Some(c),
                })
        };
        pick(false).or_else(|| pick(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::path::NavPath;
    use crate::planner::GridPlanner;
    use crate::scene::{MovableObject, RoomLayout};
    use prowl_math::consts::PI;

    #[test]
    fn test_rotate_respects_budget() {
        let mut agent = NavAgent::new(Vec2::ZERO, 0.0);
        let mut budget = 0.1;
        let error = agent.rotate_toward(PI * 0.5, &mut budget);
        assert!((error - PI * 0.5).abs() < 1e-5);
        assert!((agent.yaw - 0.1).abs() < 1e-5);
        assert!(budget.abs() < 1e-6);

        // Budget exhausted: no further rotation this tick
        agent.rotate_toward(PI * 0.5, &mut budget);
        assert!((agent.yaw - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_chase_point_skips_reached_waypoints() {
        let mut agent = NavAgent::new(Vec2::ZERO, 0.0);
        agent.nav.path = NavPath::new(vec![
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 0.05),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ]);
        assert_eq!(agent.next_chase_point(0.15), Vec2::new(0.0, 1.0));
        assert_eq!(agent.nav.path.current_index, 2);

        // The last waypoint is never skipped
        agent.position = Vec2::new(1.0, 1.0);
        agent.nav.path.current_index = 3;
        assert_eq!(agent.next_chase_point(0.15), Vec2::new(1.0, 1.0));
        assert_eq!(agent.nav.path.current_index, 3);
    }

    #[test]
    fn test_walks_straight_to_clear_target() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::new(NavConfig::default());
        let mut agent = NavAgent::new(Vec2::new(0.0, 0.0), 0.0);
        let target = Vec2::new(0.0, 2.0);

        let mut arrived = false;
        for tick in 0..240 {
            let world = NavWorld::new(&layout, &[], None, &planner, tick as f32 / 60.0);
            if agent.move_toward(&world, target, 1.0 / 60.0, 1.0, 0.0, MoveOptions::planned()) {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert!(agent.position.distance(target) < 0.14);
    }

    #[test]
    fn test_unreachable_target_holds_position() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let mut agent = NavAgent::new(Vec2::new(0.0, 0.0), 0.0);
        let world = NavWorld::new(&layout, &[], None, &planner, 0.0);
        // Inside the hamper
        let arrived = agent.move_toward(&world, Vec2::new(-5.8, 2.4), 0.016, 1.0, 0.0, MoveOptions::planned());
        assert!(!arrived);
        assert_eq!(agent.position, Vec2::ZERO);
        assert_eq!(agent.nav.last_speed, 0.0);
    }

    #[test]
    fn test_steer_avoids_clutter_ahead() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let movables = vec![MovableObject::loose(1, Vec2::new(0.0, 0.55), 0.1)];
        let agent = NavAgent::new(Vec2::ZERO, 0.0);
        let world = NavWorld::new(&layout, &movables, None, &planner, 0.0);
        let target = Vec2::new(0.0, 3.0);
        let step = 0.2;

        let statics = world.static_obstacles(agent.position);
        let dynamics = world.dynamic_obstacles(agent.position);
        let ignoring = agent.choose_ground_steer(&world, target, step, &statics, None);
        assert_eq!(ignoring.map(|s| s.yaw), Some(0.0));

        let steer = agent
            .choose_ground_steer(&world, target, step, &statics, Some(&dynamics))
            .expect("a side heading survives");
        assert!(steer.yaw.abs() > 0.6);
        let probe = agent.position + steer.direction * step;
        assert!(!dynamics.is_blocked(probe, world.clearance()));
    }

    #[test]
    fn test_airborne_motion_is_linear() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let mut agent = NavAgent::new(Vec2::new(-5.8, 1.0), 0.0);
        let world = NavWorld::new(&layout, &[], None, &planner, 0.0);
        // Straight across the hamper at surface height
        agent.move_toward(&world, Vec2::new(-5.8, 3.0), 0.1, 1.0, 1.1, MoveOptions::planned());
        assert!((agent.position.z - 1.1).abs() < 1e-4);
        assert!(agent.nav.path.is_empty());
        assert!((agent.height - 1.1).abs() < 1e-6);
    }
}
