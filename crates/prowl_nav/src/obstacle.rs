//! Obstacle shapes and point/line clearance queries

use prowl_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default spacing of samples along a travel line
pub const DEFAULT_LINE_SAMPLE_STEP: f32 = 0.18;
/// Length of the first move checked when leaving an obstacle
const EXIT_LEAD_STEP: f32 = 0.02;
/// Depth change tolerated while leaving an obstacle
const EXIT_DEPTH_TOLERANCE: f32 = 1e-4;

/// Navigation obstacle footprint on the floor plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Obstacle {
    /// Axis-aligned box with half-extents
    Box {
        x: f32,
        z: f32,
        half_x: f32,
        half_z: f32,
    },
    /// Box rotated by `yaw` around its center
    OrientedBox {
        x: f32,
        z: f32,
        half_x: f32,
        half_z: f32,
        yaw: f32,
    },
    /// Disc with radius
    Circle {
        x: f32,
        z: f32,
        radius: f32,
    },
}

/// How deep a disc sits inside an obstacle, or how close it is to touching
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contact {
    /// Overlap depth (0 when separated)
    pub penetration: f32,
    /// `padding - gap` for separated discs within `padding` (0 otherwise)
    pub nearness: f32,
}

impl Obstacle {
    /// Create an axis-aligned box
    pub fn boxed(center: Vec2, half_x: f32, half_z: f32) -> Self {
        Self::Box {
            x: center.x,
            z: center.z,
            half_x,
            half_z,
        }
    }

    /// Create a rotated box
    pub fn oriented(center: Vec2, half_x: f32, half_z: f32, yaw: f32) -> Self {
        Self::OrientedBox {
            x: center.x,
            z: center.z,
            half_x,
            half_z,
            yaw,
        }
    }

    /// Create a circle
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::Circle {
            x: center.x,
            z: center.z,
            radius,
        }
    }

    /// Same shape grown outward by `amount` on every side
    pub fn inflated(self, amount: f32) -> Self {
        match self {
            Self::Box { x, z, half_x, half_z } => Self::Box {
                x,
                z,
                half_x: half_x + amount,
                half_z: half_z + amount,
            },
            Self::OrientedBox { x, z, half_x, half_z, yaw } => Self::OrientedBox {
                x,
                z,
                half_x: half_x + amount,
                half_z: half_z + amount,
                yaw,
            },
            Self::Circle { x, z, radius } => Self::Circle {
                x,
                z,
                radius: radius + amount,
            },
        }
    }

    /// Footprint center
    pub fn center(&self) -> Vec2 {
        match *self {
            Self::Box { x, z, .. } | Self::OrientedBox { x, z, .. } | Self::Circle { x, z, .. } => {
                Vec2::new(x, z)
            }
        }
    }

    /// Offset of `p` from the center, expressed in the shape's local frame
    fn local_offset(&self, p: Vec2) -> Vec2 {
        let d = p - self.center();
        match *self {
            Self::OrientedBox { yaw, .. } => d.rotate_into(yaw),
            _ => d,
        }
    }

    /// Is `p` strictly inside this obstacle inflated by `clearance`
    pub fn contains(&self, p: Vec2, clearance: f32) -> bool {
        let local = self.local_offset(p);
        match *self {
            Self::Box { half_x, half_z, .. } | Self::OrientedBox { half_x, half_z, .. } => {
                local.x.abs() < half_x + clearance && local.z.abs() < half_z + clearance
            }
            Self::Circle { radius, .. } => {
                let rr = radius + clearance;
                local.length_squared() < rr * rr
            }
        }
    }

    /// Distance from `p` to the footprint edge, negative inside
    ///
    /// Exact for circles and outside boxes; inside a box it is the distance to
    /// the nearest side.
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        let local = self.local_offset(p);
        match *self {
            Self::Circle { radius, .. } => local.length() - radius,
            Self::Box { half_x, half_z, .. } | Self::OrientedBox { half_x, half_z, .. } => {
                let ox = local.x.abs() - half_x;
                let oz = local.z.abs() - half_z;
                if ox <= 0.0 && oz <= 0.0 {
                    ox.max(oz)
                } else {
                    Vec2::new(ox.max(0.0), oz.max(0.0)).length()
                }
            }
        }
    }

    /// Contact of a disc of `radius` at `p` against this obstacle
    pub fn contact(&self, p: Vec2, radius: f32, padding: f32) -> Contact {
        let local = self.local_offset(p);
        let mut contact = Contact::default();
        match *self {
            Self::Circle { radius: r, .. } => {
                let signed = local.length() - (r + radius);
                contact.penetration = (-signed).max(0.0);
                if signed > 0.0 && signed < padding {
                    contact.nearness = padding - signed;
                }
            }
            Self::Box { half_x, half_z, .. } | Self::OrientedBox { half_x, half_z, .. } => {
                let ox = local.x.abs() - (half_x + radius);
                let oz = local.z.abs() - (half_z + radius);
                if ox <= 0.0 && oz <= 0.0 {
                    contact.penetration = (-ox).min(-oz);
                } else {
                    let gap = Vec2::new(ox.max(0.0), oz.max(0.0)).length();
                    if gap < padding {
                        contact.nearness = padding - gap;
                    }
                }
            }
        }
        contact
    }
}

/// A snapshot of obstacles plus the navigable room interior
///
/// Rebuilt per query from live scene state; never cached across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleSet {
    /// Navigable interior (room bounds minus margin)
    pub bounds: Rect,
    /// Obstacle footprints
    pub obstacles: Vec<Obstacle>,
    /// Sample spacing used by line checks
    pub sample_step: f32,
}

impl ObstacleSet {
    /// Create a set over an interior rectangle
    pub fn new(bounds: Rect, obstacles: Vec<Obstacle>) -> Self {
        Self {
            bounds,
            obstacles,
            sample_step: DEFAULT_LINE_SAMPLE_STEP,
        }
    }

    /// Set line sample spacing
    pub fn with_sample_step(mut self, step: f32) -> Self {
        self.sample_step = step;
        self
    }

    /// Add an obstacle
    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Is the point outside the interior or inside any obstacle inflated by `clearance`
    ///
    /// A degenerate interior blocks everything.
    pub fn is_blocked(&self, p: Vec2, clearance: f32) -> bool {
        if self.bounds.is_degenerate() || !self.bounds.contains(p) {
            return true;
        }
        self.obstacles.iter().any(|obs| obs.contains(p, clearance))
    }

    /// Is every sample along `a -> b` clear
    ///
    /// The start point itself is not sampled, so an agent slightly inside an
    /// inflated obstacle can still find a way out.
    pub fn has_clear_travel_line(&self, a: Vec2, b: Vec2, clearance: f32) -> bool {
        let delta = b - a;
        let dist = delta.length();
        if dist < 0.001 {
            return true;
        }
        let step = if self.sample_step > 0.0 {
            self.sample_step
        } else {
            DEFAULT_LINE_SAMPLE_STEP
        };
        let samples = ((dist / step).ceil() as usize).max(2);
        (1..=samples).all(|i| {
            let t = i as f32 / samples as f32;
            !self.is_blocked(a + delta * t, clearance)
        })
    }

    /// Like [`has_clear_travel_line`](Self::has_clear_travel_line), but a
    /// start inside inflated obstacles may walk out of them
    ///
    /// Samples inside an obstacle that already contains `a` are accepted
    /// while they move no deeper into it, and the first short move must not
    /// head deeper either. Once the line leaves those
    /// obstacles, every sample must be clear again.
    pub fn has_clear_exit_line(&self, a: Vec2, b: Vec2, clearance: f32) -> bool {
        let trapping: Vec<&Obstacle> = self
            .obstacles
            .iter()
            .filter(|obs| obs.contains(a, clearance))
            .collect();
        if trapping.is_empty() {
            return self.has_clear_travel_line(a, b, clearance);
        }
        if self.bounds.is_degenerate() {
            return false;
        }

        let delta = b - a;
        let dist = delta.length();
        if dist < 0.001 {
            return true;
        }
        let step = if self.sample_step > 0.0 {
            self.sample_step
        } else {
            DEFAULT_LINE_SAMPLE_STEP
        };
        let lead = a + delta * (EXIT_LEAD_STEP / dist).min(1.0);
        if trapping
            .iter()
            .any(|obs| obs.signed_distance(lead) < obs.signed_distance(a) - EXIT_DEPTH_TOLERANCE)
        {
            return false;
        }
        let samples = ((dist / step).ceil() as usize).max(2);
        let mut escaping = true;
        let mut previous = a;
        (1..=samples).all(|i| {
            let p = a + delta * (i as f32 / samples as f32);
            if !self.bounds.contains(p) {
                return false;
            }
            let inside_trapping = escaping && trapping.iter().any(|obs| obs.contains(p, clearance));
            if !inside_trapping {
                escaping = false;
                return !self.obstacles.iter().any(|obs| obs.contains(p, clearance));
            }
            let outward = trapping
                .iter()
                .filter(|obs| obs.contains(p, clearance))
                .all(|obs| obs.signed_distance(p) >= obs.signed_distance(previous) - EXIT_DEPTH_TOLERANCE);
            let others_clear = !self
                .obstacles
                .iter()
                .any(|obs| !trapping.contains(&obs) && obs.contains(p, clearance));
            previous = p;
            outward && others_clear
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Rect {
        Rect::new(-5.0, 5.0, -5.0, 5.0)
    }

    #[test]
    fn test_box_contains() {
        let obs = Obstacle::boxed(Vec2::new(1.0, 1.0), 0.5, 0.25);
        assert!(obs.contains(Vec2::new(1.4, 1.2), 0.0));
        assert!(!obs.contains(Vec2::new(1.6, 1.0), 0.0));
        assert!(obs.contains(Vec2::new(1.6, 1.0), 0.2));
    }

    #[test]
    fn test_oriented_box_contains() {
        // Long axis rotated onto +z
        let obs = Obstacle::oriented(Vec2::ZERO, 1.0, 0.1, std::f32::consts::FRAC_PI_2);
        assert!(obs.contains(Vec2::new(0.0, 0.8), 0.0));
        assert!(!obs.contains(Vec2::new(0.8, 0.0), 0.0));
    }

    #[test]
    fn test_circle_contact() {
        let obs = Obstacle::circle(Vec2::ZERO, 0.5);
        let inside = obs.contact(Vec2::new(0.6, 0.0), 0.2, 0.08);
        assert!((inside.penetration - 0.1).abs() < 1e-5);

        let near = obs.contact(Vec2::new(0.75, 0.0), 0.2, 0.08);
        assert_eq!(near.penetration, 0.0);
        assert!((near.nearness - 0.03).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_bounds_is_blocked() {
        let set = ObstacleSet::new(room(), Vec::new());
        assert!(set.is_blocked(Vec2::new(5.5, 0.0), 0.0));
        assert!(!set.is_blocked(Vec2::new(4.5, 0.0), 0.0));
    }

    #[test]
    fn test_degenerate_bounds_block_everything() {
        let set = ObstacleSet::new(Rect::new(0.0, 0.0, 0.0, 1.0), Vec::new());
        assert!(set.is_blocked(Vec2::new(0.0, 0.5), 0.0));
    }

    #[test]
    fn test_blocked_is_monotonic_in_clearance() {
        let set = ObstacleSet::new(
            room(),
            vec![
                Obstacle::boxed(Vec2::new(1.0, 0.0), 0.4, 0.4),
                Obstacle::oriented(Vec2::new(-2.0, 2.0), 0.6, 0.2, 0.7),
                Obstacle::circle(Vec2::new(-1.0, -2.0), 0.5),
            ],
        );
        let clearances = [0.0, 0.05, 0.1, 0.22, 0.4, 0.8];
        for ix in -20..=20 {
            for iz in -20..=20 {
                let p = Vec2::new(ix as f32 * 0.25, iz as f32 * 0.25);
                let mut was_blocked = false;
                for &c in &clearances {
                    let blocked = set.is_blocked(p, c);
                    assert!(!was_blocked || blocked, "point {p:?} unblocked at clearance {c}");
                    was_blocked = blocked;
                }
            }
        }
    }

    #[test]
    fn test_travel_line() {
        let set = ObstacleSet::new(room(), vec![Obstacle::circle(Vec2::ZERO, 0.5)]);
        assert!(!set.has_clear_travel_line(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), 0.1));
        assert!(set.has_clear_travel_line(Vec2::new(-2.0, 1.0), Vec2::new(2.0, 1.0), 0.1));
        // Start inside is fine as long as the rest of the line is clear
        assert!(set.has_clear_travel_line(Vec2::new(0.0, 0.55), Vec2::new(0.0, 2.0), 0.1));
    }

    #[test]
    fn test_exit_line_from_inside_clearance() {
        let set = ObstacleSet::new(room(), vec![Obstacle::circle(Vec2::ZERO, 0.3)]);
        let start = Vec2::new(0.45, 0.0);
        let out = Vec2::new(1.5, 0.0);
        // Samples close to the start are still inside the inflated circle
        assert!(!set.has_clear_travel_line(start, Vec2::new(0.45, 0.6), 0.22));
        assert!(set.has_clear_exit_line(start, Vec2::new(0.45, 0.6), 0.22));
        assert!(set.has_clear_exit_line(start, out, 0.22));
        // Heading through the obstacle is not an exit
        assert!(!set.has_clear_exit_line(start, Vec2::new(-1.5, 0.0), 0.22));
    }

    #[test]
    fn test_signed_distance() {
        let disc = Obstacle::circle(Vec2::ZERO, 0.5);
        assert!((disc.signed_distance(Vec2::new(1.0, 0.0)) - 0.5).abs() < 1e-6);
        assert!((disc.signed_distance(Vec2::new(0.0, 0.2)) + 0.3).abs() < 1e-6);

        let crate_box = Obstacle::boxed(Vec2::ZERO, 1.0, 0.5);
        assert!((crate_box.signed_distance(Vec2::new(0.2, 0.1)) + 0.4).abs() < 1e-6);
        assert!((crate_box.signed_distance(Vec2::new(4.0, 4.5)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_exit_line_still_blocked_by_other_obstacles() {
        let set = ObstacleSet::new(
            room(),
            vec![Obstacle::circle(Vec2::ZERO, 0.3), Obstacle::boxed(Vec2::new(1.0, 0.0), 0.1, 0.5)],
        );
        assert!(!set.has_clear_exit_line(Vec2::new(0.45, 0.0), Vec2::new(1.5, 0.0), 0.22));
        // A free start behaves exactly like a travel line
        let free = Vec2::new(-2.0, 2.0);
        assert_eq!(
            set.has_clear_exit_line(free, Vec2::new(2.0, 2.0), 0.22),
            set.has_clear_travel_line(free, Vec2::new(2.0, 2.0), 0.22)
        );
    }
}
