//! Stuck and trap recovery
//!
//! Clutter can close in around the agent faster than steering notices. A
//! throttled check accumulates trap pressure from overlaps, obstacle
//! intrusion, a caged-by-clutter test and stalled progress. Once the pressure
//! crosses the threshold the agent is moved to the nearest navigable point and
//! the closest blocking movable is pushed away.

use crate::agent::{NavAgent, NavWorld};
use crate::obstacle::ObstacleSet;
use crate::scene::MovableObject;
use log::{info, warn};
use prowl_math::consts::TAU;
use prowl_math::Vec2;

/// Extra radius on the agent when measuring overlap with movables
const OVERLAP_PADDING: f32 = 0.04;
/// Movables above this are ignored by the overlap metric
const OVERLAP_HEIGHT_CAP: f32 = 1.25;
/// Separated obstacles closer than this count as near intrusion
const NEAR_PADDING: f32 = 0.08;
/// Probe distance for the exits around a navigable point
const EXIT_RADIUS: f32 = 0.26;
const EXIT_DIRECTIONS: usize = 8;
const MIN_EXITS: usize = 2;
/// Recovery ring search: first radius, last radius, spacing
const RECOVERY_RINGS: (f32, f32, f32) = (0.16, 2.8, 0.12);
/// Landing spot ring search: first radius, last radius, spacing
const SAFE_GROUND_RINGS: (f32, f32, f32) = (0.36, 2.4, 0.24);
/// Goals closer than this count as reached for stall detection
const NEAR_GOAL: f32 = 0.18;
const STALL_STUCK_TIME: f32 = 0.16;
const TRAP_DECAY: f32 = 2.2;
const CAGE_BOOST: f32 = 1.9;
/// Trap pressure reseeded after a failed search so the next check retries
const RETRY_TRAP_TIME: f32 = 0.12;
/// Recovery points this close to the agent are not worth a teleport
const MIN_RECOVERY_DISTANCE: f32 = 0.1;
/// Nudge reach and height limit
const NUDGE_REACH: f32 = 0.54;
const NUDGE_HEIGHT_CAP: f32 = 1.2;
const NUDGE_SEPARATION: f32 = 0.08;
const NUDGE_IMPULSE: f32 = 0.95;
const NUDGE_LIFT: f32 = 0.62;

/// Movables overlapping the agent's padded radius
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovableOverlap {
    pub count: usize,
    pub max_penetration: f32,
}

/// Agent disc against the full obstacle set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObstacleIntrusion {
    pub intersect_count: usize,
    pub near_count: usize,
    pub max_penetration: f32,
    pub max_nearness: f32,
}

/// Position and velocity correction for one movable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nudge {
    /// Index into the movable slice the nudge was computed from
    pub index: usize,
    pub id: u32,
    pub position: Vec2,
    pub velocity: [f32; 3],
}

impl Nudge {
    /// Write the correction back and wake the object
    pub fn apply(&self, movables: &mut [MovableObject]) {
        let Some(item) = movables.get_mut(self.index) else {
            return;
        };
        if item.id != self.id {
            return;
        }
        item.position = self.position;
        item.velocity = self.velocity;
        item.settled = false;
    }
}

/// Result of one [`NavAgent::recover_if_trapped`] call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoveryOutcome {
    /// The agent was moved to a recovery point
    pub recovered: bool,
    /// Push to apply to a blocking movable
    pub nudge: Option<Nudge>,
}

/// Radii `start, start + step, ..` up to `end` inclusive
fn rings(start: f32, end: f32, step: f32) -> impl Iterator<Item = f32> {
    let count = ((end - start) / step + 1e-4).floor().max(0.0) as usize + 1;
    (0..count).map(move |i| start + step * i as f32)
}

/// `count` evenly spaced points on a circle
fn ring_points(center: Vec2, radius: f32, count: usize) -> impl Iterator<Item = Vec2> {
    (0..count).map(move |i| center + Vec2::from_polar(i as f32 / count as f32 * TAU) * radius)
}

/// Closest point to `preferred` passing `accept`, searched ring by ring
fn nearest_on_rings(
    preferred: Vec2,
    (start, end, step): (f32, f32, f32),
    steps_per_unit: f32,
    min_steps: usize,
    accept: impl Fn(Vec2) -> bool,
) -> Option<Vec2> {
    for radius in rings(start, end, step) {
        let steps = ((radius * steps_per_unit).floor() as usize).max(min_steps);
        let best = ring_points(preferred, radius, steps)
            .filter(|&p| accept(p))
            .min_by(|a, b| {
                a.distance_squared(preferred)
                    .partial_cmp(&b.distance_squared(preferred))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Free, with at least two free exits around it
fn is_navigable(obstacles: &ObstacleSet, p: Vec2, clearance: f32) -> bool {
    if obstacles.is_blocked(p, clearance) {
        return false;
    }
    ring_points(p, EXIT_RADIUS, EXIT_DIRECTIONS)
        .filter(|&e| !obstacles.is_blocked(e, clearance))
        .take(MIN_EXITS)
        .count()
        >= MIN_EXITS
}

/// Nearest navigable point to `preferred`
///
/// With `include_movables` clutter counts as an obstacle (including items the
/// agent touches); without it only fixed geometry does.
pub fn find_recovery_point(world: &NavWorld, preferred: Vec2, include_movables: bool) -> Option<Vec2> {
    let obstacles = world
        .snapshot(preferred)
        .build_obstacles(include_movables, include_movables);
    let clearance = world.clearance();
    if is_navigable(&obstacles, preferred, clearance) {
        return Some(preferred);
    }
    nearest_on_rings(preferred, RECOVERY_RINGS, 34.0, 12, |p| {
        is_navigable(&obstacles, p, clearance)
    })
}

/// Closest free ground point to `preferred`, or `preferred` itself when the
/// search finds nothing
///
/// Used for landing spots. `agent_position` decides which nearby clutter is
/// skipped.
pub fn find_safe_ground_point(world: &NavWorld, preferred: Vec2, agent_position: Vec2) -> Vec2 {
    let obstacles = world.snapshot(agent_position).build_obstacles(true, false);
    let clearance = world.clearance();
    if !obstacles.is_blocked(preferred, clearance) {
        return preferred;
    }
    nearest_on_rings(preferred, SAFE_GROUND_RINGS, 16.0, 8, |p| {
        !obstacles.is_blocked(p, clearance)
    })
    .unwrap_or(preferred)
}

impl NavAgent {
    /// Count and depth of movables overlapping the agent
    pub fn movable_overlap(&self, world: &NavWorld) -> MovableOverlap {
        let radius = world.planner.config().body_radius + OVERLAP_PADDING;
        let mut overlap = MovableOverlap::default();
        for item in world.movables {
            if item.held || item.height > OVERLAP_HEIGHT_CAP {
                continue;
            }
            let min_dist = radius + item.radius() * 0.98;
            let penetration = min_dist - item.position.distance(self.position);
            if penetration > 0.0 {
                overlap.count += 1;
                overlap.max_penetration = overlap.max_penetration.max(penetration);
            }
        }
        overlap
    }

    /// Penetration and near misses against every obstacle, clutter included
    pub fn obstacle_intrusion(&self, world: &NavWorld) -> ObstacleIntrusion {
        let radius = world.planner.config().body_radius;
        let obstacles = world.dynamic_obstacles(self.position);
        let mut intrusion = ObstacleIntrusion::default();
        for obstacle in &obstacles.obstacles {
            let contact = obstacle.contact(self.position, radius, NEAR_PADDING);
            if contact.penetration > 0.0 {
                intrusion.intersect_count += 1;
                intrusion.max_penetration = intrusion.max_penetration.max(contact.penetration);
            } else if contact.nearness > 0.0 {
                intrusion.near_count += 1;
                intrusion.max_nearness = intrusion.max_nearness.max(contact.nearness);
            }
        }
        intrusion
    }

    /// Free directions exist under fixed geometry but clutter seals all of them
    pub fn is_caged(&self, world: &NavWorld) -> bool {
        let config = world.planner.config();
        let statics = world.static_obstacles(self.position);
        let dynamics = world.dynamic_obstacles(self.position);
        let clearance = world.clearance();
        let mut static_free = 0;
        let mut dynamic_free = 0;
        for &radius in &config.cage_radii {
            for p in ring_points(self.position, radius, config.cage_directions as usize) {
                if statics.is_blocked(p, clearance) {
                    continue;
                }
                static_free += 1;
                if !dynamics.is_blocked(p, clearance) {
                    dynamic_free += 1;
                }
            }
        }
        static_free >= config.cage_min_static_free && dynamic_free == 0
    }

    /// Push for the nearest low movable within reach, if any
    pub fn nudge_blocking_movable(&self, world: &NavWorld) -> Option<Nudge> {
        let reach_sq = NUDGE_REACH * NUDGE_REACH;
        let (index, item) = world
            .movables
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.held && item.height <= NUDGE_HEIGHT_CAP)
            .map(|(i, item)| (i, item, item.position.distance_squared(self.position)))
            .filter(|&(_, _, d)| d < reach_sq)
            .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, item, _)| (i, item))?;

        let away = item.position - self.position;
        let normal = if away.length() < 1e-4 {
            Vec2::from_yaw(self.yaw)
        } else {
            away.normalize()
        };
        // Far enough that the overlap metric reads zero afterwards
        let overlap_radius = world.planner.config().body_radius + OVERLAP_PADDING;
        let separation = overlap_radius + item.radius() + NUDGE_SEPARATION;
        let push = normal * NUDGE_IMPULSE;
        Some(Nudge {
            index,
            id: item.id,
            position: self.position + normal * separation,
            velocity: [
                item.velocity[0] + push.x,
                item.velocity[1].max(NUDGE_LIFT),
                item.velocity[2] + push.z,
            ],
        })
    }

    /// Throttled trap check; teleports out once trap pressure builds up
    ///
    /// `goal` is the current behavioral ground goal. After a teleport a fresh
    /// clutter-aware path toward it is planned immediately.
    pub fn recover_if_trapped(&mut self, world: &NavWorld, goal: Option<Vec2>) -> RecoveryOutcome {
        let config = world.planner.config();
        let mut outcome = RecoveryOutcome::default();
        if !self.is_grounded() {
            self.nav.suspend_trap_tracking(world.now);
            return outcome;
        }

        let Some(last_position) = self.nav.trap_check_position else {
            self.nav.trap_check_position = Some(self.position);
            self.nav.trap_check_at = world.now;
            return outcome;
        };
        let sample_dt = world.now - self.nav.trap_check_at;
        if sample_dt < config.trap_check_interval {
            return outcome;
        }
        let moved = self.position.distance(last_position);
        self.nav.trap_check_at = world.now;
        self.nav.trap_check_position = Some(self.position);

        let overlap = self.movable_overlap(world);
        let intrusion = self.obstacle_intrusion(world);
        let caged = self.is_caged(world);
        let near_goal = goal.is_some_and(|g| g.distance(self.position) < NEAR_GOAL);
        let stalled = goal.is_some()
            && !near_goal
            && moved < config.trap_min_move
            && self.nav.stuck_timer > STALL_STUCK_TIME;
        let near_intrusion = intrusion.near_count > 0 && moved < config.trap_min_move * 1.25;
        let trapped = intrusion.intersect_count > 0 || near_intrusion || overlap.count > 0 || caged || stalled;

        if !trapped {
            self.nav.trap_timer = (self.nav.trap_timer - sample_dt * TRAP_DECAY).max(0.0);
            return outcome;
        }

        let overlap_pressure = if overlap.count > 0 {
            1.0 + overlap.max_penetration * 3.2
        } else {
            1.0
        };
        let intrusion_pressure = if intrusion.intersect_count > 0 {
            1.0 + intrusion.max_penetration * 4.0
        } else if intrusion.near_count > 0 {
            1.0 + intrusion.max_nearness * 3.0
        } else {
            1.0
        };
        let cage_boost = if caged { CAGE_BOOST } else { 1.0 };
        self.nav.trap_timer += sample_dt * overlap_pressure.max(intrusion_pressure) * cage_boost;
        if self.nav.trap_timer < config.trap_threshold {
            return outcome;
        }

        let recovery = find_recovery_point(world, self.position, true)
            .or_else(|| find_recovery_point(world, self.position, false))
            .filter(|p| p.distance(self.position) >= MIN_RECOVERY_DISTANCE);

        let Some(point) = recovery else {
            warn!(
                "Agent trapped at ({:.2}, {:.2}) with no recovery point; nudging clutter",
                self.position.x, self.position.z
            );
            outcome.nudge = self.nudge_blocking_movable(world);
            self.nav.trap_timer = RETRY_TRAP_TIME;
            return outcome;
        };

        info!(
            "Recovering agent from ({:.2}, {:.2}) to ({:.2}, {:.2}) (overlaps: {}, intrusions: {}, caged: {})",
            self.position.x, self.position.z, point.x, point.z, overlap.count, intrusion.intersect_count, caged
        );
        self.teleport(point, world.now);
        self.nav.goal = point;
        self.nav.trap_check_position = Some(point);
        outcome.recovered = true;
        outcome.nudge = self.nudge_blocking_movable(world);

        if let Some(goal) = goal {
            self.ensure_path(world, goal, true, true);
        }
        outcome
    }
}
