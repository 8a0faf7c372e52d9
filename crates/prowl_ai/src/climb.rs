//! Jump anchor selection and climb targets

use prowl_math::{clamp, Vec2};
use prowl_nav::{NavWorld, RaisedSurface};

/// Hook point distance outside the surface edge
const EDGE_OUT: f32 = 0.24;
/// Landing point distance inside the surface edge
const TOP_IN: f32 = 0.34;
/// Lateral inset when the hook sits on an x edge
const LATERAL_INSET_Z: f32 = 0.24;
/// Lateral inset when the hook sits on a z edge
const LATERAL_INSET_X: f32 = 0.3;
/// Score penalty for an anchor whose route is currently cluttered
const CLUTTER_PENALTY: f32 = 2.2;
/// Anchors are checked with a slightly reduced clearance
const ANCHOR_CLEARANCE_SCALE: f32 = 0.85;

/// Edge hook and landing point for one anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpTargets {
    pub hook: Vec2,
    pub top: Vec2,
}

/// Climb plan that survives the jump-up sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClimbPlan {
    pub anchor: Option<Vec2>,
    pub targets: Option<JumpTargets>,
}

impl ClimbPlan {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Forget the targets but keep the anchor
    pub fn clear_targets(&mut self) {
        self.targets = None;
    }
}

fn usable_anchors<'a>(world: &NavWorld<'a>, from: Vec2) -> impl Iterator<Item = Vec2> + 'a {
    let statics = world.static_obstacles(from);
    let clearance = world.planner.config().clearance * ANCHOR_CLEARANCE_SCALE;
    world
        .layout
        .surface
        .jump_anchors
        .iter()
        .copied()
        .filter(move |&a| !statics.is_blocked(a, clearance))
}

/// Closest statically free anchor, or the first anchor when none is free
pub fn nearest_anchor(world: &NavWorld, from: Vec2) -> Vec2 {
    let surface = &world.layout.surface;
    usable_anchors(world, from)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
        .or_else(|| surface.jump_anchors.first().copied())
        .unwrap_or(surface.approach)
}

/// Anchor with the shortest static route, penalizing routes blocked by
/// clutter right now
pub fn best_anchor(world: &NavWorld, from: Vec2) -> Vec2 {
    let planner = world.planner;
    let clearance = planner.clearance();
    let statics = world.static_obstacles(from);
    let dynamics = world.dynamic_obstacles(from);

    let mut best = None;
    let mut best_score = f32::INFINITY;
    for anchor in usable_anchors(world, from) {
        let path = planner.compute_path(from, anchor, &statics);
        if !planner.is_path_traversable(&path, &statics, clearance) {
            continue;
        }
        let cluttered = !planner.is_path_traversable(&path, &dynamics, clearance);
        let score = path.total_length() + if cluttered { CLUTTER_PENALTY } else { 0.0 };
        if score < best_score {
            best_score = score;
            best = Some(anchor);
        }
    }
    best.unwrap_or_else(|| nearest_anchor(world, from))
}

/// Hook and landing points on the surface edge nearest the anchor
pub fn jump_targets(surface: &RaisedSurface, anchor: Vec2) -> JumpTargets {
    let rel = anchor - surface.center;
    let (hx, hz) = (surface.half_x(), surface.half_z());

    if rel.x.abs() >= rel.z.abs() {
        let side = if rel.x < 0.0 { -1.0 } else { 1.0 };
        let z = clamp(
            anchor.z,
            surface.center.z - hz + LATERAL_INSET_Z,
            surface.center.z + hz - LATERAL_INSET_Z,
        );
        JumpTargets {
            hook: Vec2::new(surface.center.x + side * (hx + EDGE_OUT), z),
            top: Vec2::new(surface.center.x + side * (hx - TOP_IN), z),
        }
    } else {
        let side = if rel.z < 0.0 { -1.0 } else { 1.0 };
        let x = clamp(
            anchor.x,
            surface.center.x - hx + LATERAL_INSET_X,
            surface.center.x + hx - LATERAL_INSET_X,
        );
        JumpTargets {
            hook: Vec2::new(x, surface.center.z + side * (hz + EDGE_OUT)),
            top: Vec2::new(x, surface.center.z + side * (hz - TOP_IN)),
        }
    }
}
