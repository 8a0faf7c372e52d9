//! Planned polylines

use prowl_math::Vec2;

/// Planned path from start to goal
///
/// A usable path has at least two waypoints. An empty path means "no path":
/// the goal was blocked or unreachable when the plan was made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavPath {
    /// Waypoints along the path, start first
    pub waypoints: Vec<Vec2>,
    /// Next waypoint to chase
    pub current_index: usize,
}

impl NavPath {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            current_index: 0,
        }
    }

    /// "No path"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if path is empty
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Get current waypoint
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.current_index).copied()
    }

    /// Get final destination
    pub fn destination(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// Advance to next waypoint
    pub fn advance(&mut self) {
        if self.current_index < self.waypoints.len() {
            self.current_index += 1;
        }
    }

    /// Consecutive waypoint pairs
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.waypoints.windows(2).map(|w| (w[0], w[1]))
    }

    /// Distance still to travel from `from` through the unconsumed waypoints
    pub fn remaining_distance(&self, from: Vec2) -> f32 {
        let Some(next) = self.current_waypoint() else {
            return 0.0;
        };
        from.distance(next)
            + self.waypoints[self.current_index..]
                .windows(2)
                .map(|w| w[0].distance(w[1]))
                .sum::<f32>()
    }

    /// Get total path length
    pub fn total_length(&self) -> f32 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }
}
