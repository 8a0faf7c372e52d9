//! Time-limited distraction targets

use prowl_math::Vec2;
use prowl_nav::{find_safe_ground_point, NavWorld};
use serde::{Deserialize, Serialize};

/// Distractions are kept this far from the walls
const WALL_INSET: f32 = 0.6;
/// Spots are checked with a slightly reduced clearance
const SPOT_CLEARANCE_SCALE: f32 = 0.9;
/// Extra gap required around low clutter
const CLUTTER_GAP: f32 = 0.28;

/// A floor spot the agent abandons everything for until it expires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distraction {
    pub position: Vec2,
    pub expires_at: f32,
}

impl Distraction {
    pub fn new(position: Vec2, now: f32, lifetime: f32) -> Self {
        Self {
            position,
            expires_at: now + lifetime,
        }
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.expires_at
    }
}

/// Pull a requested spot inside the room
pub fn clamp_to_room(world: &NavWorld, spot: Vec2) -> Vec2 {
    world.layout.bounds.shrink(WALL_INSET).clamp_point(spot)
}

/// Can a distraction go at `spot`
///
/// The spot must be clear of fixed geometry, keep a gap from low clutter, and
/// be reachable from where the agent would start walking: its own position,
/// or the landing point below the surface when `on_surface` is set.
pub fn is_valid_spot(world: &NavWorld, agent_position: Vec2, on_surface: bool, spot: Vec2) -> bool {
    let config = world.planner.config();
    let statics = world.static_obstacles(agent_position);
    if statics.is_blocked(spot, config.clearance * SPOT_CLEARANCE_SCALE) {
        return false;
    }

    let crowded = world
        .movables
        .iter()
        .filter(|m| m.height <= config.movable_height_limit)
        .any(|m| m.position.distance(spot) < m.radius() + CLUTTER_GAP);
    if crowded {
        return false;
    }

    let start = if on_surface {
        find_safe_ground_point(world, world.layout.surface.approach, agent_position)
    } else {
        agent_position
    };
    let obstacles = world.snapshot(agent_position).build_obstacles(true, false);
    world.planner.can_reach(start, spot, &obstacles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use prowl_nav::{GridPlanner, MovableObject, RoomLayout};

    #[test]
    fn test_expiry() {
        let distraction = Distraction::new(Vec2::ZERO, 2.0, 7.0);
        assert!(!distraction.is_expired(8.9));
        assert!(distraction.is_expired(9.0));
    }

    #[test]
    fn test_spot_validation() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let movables = vec![MovableObject::loose(1, Vec2::new(3.0, -2.0), 0.16)];
        let world = NavWorld::new(&layout, &movables, None, &planner, 0.0);
        let agent = Vec2::new(1.5, 1.7);

        assert!(is_valid_spot(&world, agent, false, Vec2::new(0.0, -1.0)));
        // Inside the hamper
        assert!(!is_valid_spot(&world, agent, false, Vec2::new(-5.8, 2.4)));
        // Right next to clutter
        assert!(!is_valid_spot(&world, agent, false, Vec2::new(3.2, -2.0)));
        // Agent on the desk starts from its landing point
        assert!(is_valid_spot(&world, Vec2::new(-3.9, -3.7), true, Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_clamp_to_room() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let world = NavWorld::new(&layout, &[], None, &planner, 0.0);
        let clamped = clamp_to_room(&world, Vec2::new(-20.0, 20.0));
        assert_relative_eq!(clamped.x, -7.4, epsilon = 1e-5);
        assert_relative_eq!(clamped.z, 3.4, epsilon = 1e-5);
        assert_eq!(clamp_to_room(&world, Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0));
    }
}
