//! Random patrol targets

use prowl_math::{lerp, Vec2};
use prowl_nav::{find_safe_ground_point, NavWorld};
use rand::Rng;

const SAMPLE_ATTEMPTS: usize = 90;
/// Extra inset from the walls beyond the navigation margin
const WALL_INSET: f32 = 0.12;
/// Patrol targets closer than this are rejected
const MIN_DISTANCE: f32 = 0.65;

/// Pick a reachable floor point away from `from`
///
/// Samples uniformly inside the room, rejecting points that are blocked
/// (clutter included), too close, or unreachable. Falls back to the nearest
/// free ground point around `from`.
pub fn pick_patrol_point<R: Rng + ?Sized>(world: &NavWorld, from: Vec2, rng: &mut R) -> Vec2 {
    let planner = world.planner;
    let obstacles = world.dynamic_obstacles(from);
    let clearance = world.clearance();
    let area = world.layout.bounds.shrink(planner.config().margin + WALL_INSET);

    if !area.is_degenerate() {
        for _ in 0..SAMPLE_ATTEMPTS {
            let candidate = Vec2::new(
                lerp(area.min_x, area.max_x, rng.gen::<f32>()),
                lerp(area.min_z, area.max_z, rng.gen::<f32>()),
            );
            if obstacles.is_blocked(candidate, clearance) {
                continue;
            }
            if candidate.distance_squared(from) < MIN_DISTANCE * MIN_DISTANCE {
                continue;
            }
            if !planner.can_reach(from, candidate, &obstacles) {
                continue;
            }
            return candidate;
        }
    }

    find_safe_ground_point(world, from, from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prowl_nav::{GridPlanner, MovableObject, RoomLayout};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_patrol_points_are_reachable() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let movables = vec![
            MovableObject::loose(1, Vec2::new(0.5, 0.5), 0.16),
            MovableObject::flat(2, Vec2::new(-1.0, -1.0), 0.17, 0.11, 0.4),
        ];
        let world = NavWorld::new(&layout, &movables, None, &planner, 0.0);
        let obstacles = world.dynamic_obstacles(Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(3);

        let from = Vec2::new(1.5, 1.7);
        for _ in 0..10 {
            let point = pick_patrol_point(&world, from, &mut rng);
            assert!(point.distance(from) >= MIN_DISTANCE);
            assert!(!obstacles.is_blocked(point, planner.clearance()));
            assert!(planner.can_reach(from, point, &obstacles));
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let layout = RoomLayout::study_room();
        let planner = GridPlanner::default();
        let world = NavWorld::new(&layout, &[], None, &planner, 0.0);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            assert_eq!(
                pick_patrol_point(&world, Vec2::ZERO, &mut a),
                pick_patrol_point(&world, Vec2::ZERO, &mut b)
            );
        }
    }

    #[test]
    fn test_tiny_room_falls_back_near_agent() {
        let mut layout = RoomLayout::study_room().without_furniture();
        layout.containers.clear();
        layout.bounds = prowl_math::Rect::new(-0.6, 0.6, -0.6, 0.6);
        let planner = GridPlanner::default();
        let world = NavWorld::new(&layout, &[], None, &planner, 0.0);
        let mut rng = StdRng::seed_from_u64(5);

        // No sample can be 0.65 away inside a room this small
        let point = pick_patrol_point(&world, Vec2::ZERO, &mut rng);
        assert_eq!(point, Vec2::ZERO);
    }
}
