//! Integration tests for the grid planner
//!
//! Clear-line shortcut, blocked goals, detours around inflated containers,
//! starts inside clearance, and re-validation of planned paths.

use prowl_nav::*;

fn study_statics(planner: &GridPlanner) -> ObstacleSet {
    let layout = RoomLayout::study_room();
    let world = NavWorld::new(&layout, &[], None, planner, 0.0);
    world.static_obstacles(Vec2::ZERO)
}

/// Every point along the path, sampled finer than the planner samples
fn assert_path_clear(path: &NavPath, obstacles: &ObstacleSet, clearance: f32) {
    for (a, b) in path.segments() {
        let samples = (a.distance(b) / 0.05).ceil().max(1.0) as usize;
        for i in 1..=samples {
            let p = a.lerp(b, i as f32 / samples as f32);
            assert!(!obstacles.is_blocked(p, clearance), "path passes through {p:?}");
        }
    }
}

#[test]
fn test_clear_line_returns_endpoints() {
    let planner = GridPlanner::default();
    let obstacles = study_statics(&planner);
    let clearance = planner.clearance();
    let points = [
        Vec2::new(1.5, 1.7),
        Vec2::new(0.0, 0.0),
        Vec2::new(4.0, -4.0),
        Vec2::new(-1.0, 3.0),
        Vec2::new(3.5, 0.5),
    ];

    let mut checked = 0;
    for &start in &points {
        for &goal in &points {
            if start == goal || !obstacles.has_clear_travel_line(start, goal, clearance) {
                continue;
            }
            if obstacles.is_blocked(goal, clearance) {
                continue;
            }
            let path = planner.compute_path(start, goal, &obstacles);
            assert_eq!(path.waypoints, vec![start, goal]);
            checked += 1;
        }
    }
    assert!(checked > 10);
}

#[test]
fn test_goal_inside_obstacle_gives_empty_path() {
    let planner = GridPlanner::default();
    let obstacles = study_statics(&planner);
    let start = Vec2::new(1.5, 1.7);

    // Hamper center, trash can center, a desk leg
    for goal in [Vec2::new(-5.8, 2.4), Vec2::new(2.6, 2.4), Vec2::new(-5.6, -4.7)] {
        let path = planner.compute_path(start, goal, &obstacles);
        assert!(path.is_empty(), "expected no path to {goal:?}");
        assert!(!planner.can_reach(start, goal, &obstacles));
    }
}

#[test]
fn test_routes_around_inflated_container() {
    let planner = GridPlanner::default();
    let clearance = planner.clearance();
    let room = Rect::new(-8.0, 6.0, -6.0, 4.0).shrink(planner.config().margin);
    // Centered on the start-goal line (z is about 2.0 at x = -2) so only a detour connects them
    let container = Obstacle::boxed(Vec2::new(-2.0, 2.0), 0.45, 0.45).inflated(0.5);
    let obstacles = ObstacleSet::new(room, vec![container]);

    let start = Vec2::new(1.5, 1.7);
    let goal = Vec2::new(-5.8, 2.4);
    assert!(!obstacles.has_clear_travel_line(start, goal, clearance));

    let path = planner.compute_path(start, goal, &obstacles);
    assert!(path.len() >= 3, "expected a detour, got {:?}", path.waypoints);
    assert_eq!(path.waypoints[0], start);
    assert_eq!(path.destination(), Some(goal));
    assert!(planner.is_path_traversable(&path, &obstacles, clearance));
    for &p in &path.waypoints {
        assert!(!obstacles.is_blocked(p, clearance));
    }
    assert_path_clear(&path, &obstacles, clearance - 0.1);
}

#[test]
fn test_planned_paths_are_traversable() {
    let planner = GridPlanner::default();
    let clearance = planner.clearance();
    let mut obstacles = study_statics(&planner);
    obstacles.push(Obstacle::oriented(Vec2::new(0.0, -1.0), 1.4, 0.15, 0.6));
    obstacles.push(Obstacle::circle(Vec2::new(-2.5, 0.5), 0.5));
    obstacles.push(Obstacle::boxed(Vec2::new(3.0, -2.5), 0.3, 1.2));

    let candidates: Vec<Vec2> = [
        (-7.0, 3.0),
        (-6.5, -5.0),
        (-1.0, -3.0),
        (-2.5, 2.5),
        (1.5, 1.7),
        (0.5, -2.5),
        (4.5, -4.5),
        (5.0, 3.0),
        (-4.0, 0.5),
    ]
    .iter()
    .map(|&(x, z)| Vec2::new(x, z))
    .filter(|&p| !obstacles.is_blocked(p, clearance))
    .collect();
    assert!(candidates.len() >= 7);

    let mut planned = 0;
    for &start in &candidates {
        for &goal in &candidates {
            if start == goal {
                continue;
            }
            let path = planner.compute_path(start, goal, &obstacles);
            if path.is_empty() {
                continue;
            }
            planned += 1;
            assert_eq!(path.waypoints[0], start);
            assert_eq!(path.destination(), Some(goal));
            assert!(
                planner.is_path_traversable(&path, &obstacles, clearance),
                "{start:?} -> {goal:?} not traversable: {:?}",
                path.waypoints
            );
        }
    }
    // Everything in this room is connected
    assert_eq!(planned, candidates.len() * (candidates.len() - 1));
}

#[test]
fn test_start_inside_clearance_walks_out_then_around() {
    let planner = GridPlanner::default();
    let clearance = planner.clearance();
    let post = Obstacle::circle(Vec2::ZERO, 0.3);
    let obstacles = ObstacleSet::new(Rect::new(-4.0, 4.0, -4.0, 4.0), vec![post]);

    for k in 0..16 {
        let dir = Vec2::from_polar(k as f32 * std::f32::consts::TAU / 16.0);
        // Outside the post itself but inside its inflated ring
        let start = dir * 0.45;
        let goal = -dir * 2.5;
        assert!(obstacles.is_blocked(start, clearance));

        let path = planner.compute_path(start, goal, &obstacles);
        assert!(path.len() >= 3, "no detour from {start:?}: {:?}", path.waypoints);
        assert_eq!(path.waypoints[0], start);
        assert_eq!(path.destination(), Some(goal));
        assert!(!obstacles.is_blocked(path.waypoints[1], clearance));
        assert!(
            planner.is_path_traversable(&path, &obstacles, clearance),
            "{start:?} -> {goal:?} not traversable: {:?}",
            path.waypoints
        );
        assert!(planner.can_reach(start, goal, &obstacles));

        // First edge only moves away from the post
        let (a, b) = (path.waypoints[0], path.waypoints[1]);
        let mut last = a.length();
        for i in 1..=20 {
            let r = a.lerp(b, i as f32 / 20.0).length();
            assert!(r >= last - 1e-3, "first edge from {start:?} dips toward the post");
            last = r;
        }
        let rest = NavPath::new(path.waypoints[1..].to_vec());
        assert_path_clear(&rest, &obstacles, clearance - 0.02);
    }
}

#[test]
fn test_smoothing_is_stable_under_revalidation() {
    let planner = GridPlanner::default();
    let clearance = planner.clearance();
    let mut obstacles = study_statics(&planner);
    obstacles.push(Obstacle::boxed(Vec2::new(0.0, 0.0), 0.2, 2.5));

    let path = planner.compute_path(Vec2::new(-2.0, 0.5), Vec2::new(2.0, -0.5), &obstacles);
    assert!(!path.is_empty());

    let again = planner.smooth(&path.waypoints, &obstacles, clearance);
    assert_eq!(again, path.waypoints);
    assert!(planner.is_path_traversable(&NavPath::new(again), &obstacles, clearance));
}

#[test]
fn test_clutter_makes_path_stale() {
    let planner = GridPlanner::default();
    let clearance = planner.clearance();
    let layout = RoomLayout::study_room();
    let start = Vec2::new(-1.0, 0.0);
    let goal = Vec2::new(3.0, 0.0);

    let empty = NavWorld::new(&layout, &[], None, &planner, 0.0);
    let path = planner.compute_path(start, goal, &empty.dynamic_obstacles(start));
    assert_eq!(path.len(), 2);

    let movables = vec![MovableObject::flat(1, Vec2::new(1.0, 0.0), 0.17, 0.11, 0.0)];
    let cluttered = NavWorld::new(&layout, &movables, None, &planner, 0.0);
    let obstacles = cluttered.dynamic_obstacles(start);
    assert!(!planner.is_path_traversable(&path, &obstacles, clearance));

    let replanned = planner.compute_path(start, goal, &obstacles);
    assert!(replanned.len() >= 3);
    assert!(planner.is_path_traversable(&replanned, &obstacles, clearance));
}
