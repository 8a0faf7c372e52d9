//! Navigation configuration

use crate::error::{NavError, Result};
use serde::{Deserialize, Serialize};

/// Finest planning grid accepted; keeps the A* node count bounded per room
pub const MIN_CELL_SIZE: f32 = 0.05;

/// Tuning for obstacle queries, planning, steering and recovery
///
/// Distances are in room units, times in simulation seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Inset from the room walls that counts as blocked
    pub margin: f32,

    /// Default clearance for point queries that don't name one
    pub clearance: f32,

    /// Agent collision radius
    pub body_radius: f32,

    /// Subtracted from the body radius to get the planning clearance
    pub clearance_epsilon: f32,

    /// Grid cell size for A*
    pub cell_size: f32,

    /// Spacing of point samples along a travel line
    pub line_sample_step: f32,

    /// Square rings searched when snapping a blocked endpoint to a free cell
    pub snap_rings: u32,

    /// Neighbor radius in cells for A* expansion
    pub neighbor_radius: f32,

    /// Cap on neighbors per expansion (closest first)
    pub max_neighbors: usize,

    /// Goal movement that forces a replan
    pub goal_epsilon: f32,

    /// Periodic repath deadline
    pub repath_interval: f32,

    /// Distance at which a waypoint counts as consumed
    pub waypoint_radius: f32,

    /// Distance at which the final target counts as reached
    pub arrive_radius: f32,

    /// Maximum yaw rate (radians per second)
    pub max_turn_rate: f32,

    /// Heading error above which translation slows
    pub turn_slow_threshold: f32,

    /// Heading error above which the agent turns in place
    pub turn_stop_threshold: f32,

    /// Maximum look-ahead distance for candidate headings
    pub look_ahead: f32,

    /// Penalty per radian of change from last tick's steer heading
    pub steer_switch_penalty: f32,

    /// Penalty per radian between candidate heading and facing
    pub steer_facing_penalty: f32,

    /// Speed below which progress counts as stalled
    pub stuck_speed: f32,

    /// Stuck time that forces a replan
    pub stuck_repath: f32,

    /// Stuck time that drops the current path entirely
    pub stuck_path_reset: f32,

    /// Movables higher than this are ignored by the obstacle model
    pub movable_height_limit: f32,

    /// Movables closer than this to the agent are skipped unless requested
    pub nearby_exclusion: f32,

    /// Extra radius added to loose movables
    pub loose_radius_boost: f32,

    /// Interval between trap checks
    pub trap_check_interval: f32,

    /// Displacement per check below which the agent counts as stalled
    pub trap_min_move: f32,

    /// Accumulated trap pressure that triggers recovery
    pub trap_threshold: f32,

    /// Probe radii for the caged-by-clutter check
    pub cage_radii: [f32; 2],

    /// Probe directions per radius for the caged check
    pub cage_directions: u32,

    /// Statically free probes needed before clutter can count as a cage
    pub cage_min_static_free: u32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            margin: 0.22,
            clearance: 0.2,
            body_radius: 0.24,
            clearance_epsilon: 0.02,
            cell_size: 0.2,
            line_sample_step: 0.18,
            snap_rings: 8,
            neighbor_radius: 2.3,
            max_neighbors: 24,
            goal_epsilon: 0.1,
            repath_interval: 0.8,
            waypoint_radius: 0.15,
            arrive_radius: 0.14,
            max_turn_rate: 7.5,
            turn_slow_threshold: 0.55,
            turn_stop_threshold: 1.45,
            look_ahead: 0.42,
            steer_switch_penalty: 0.35,
            steer_facing_penalty: 0.28,
            stuck_speed: 0.08,
            stuck_repath: 0.36,
            stuck_path_reset: 1.15,
            movable_height_limit: 0.34,
            nearby_exclusion: 0.22,
            loose_radius_boost: 0.07,
            trap_check_interval: 0.2,
            trap_min_move: 0.03,
            trap_threshold: 0.1,
            cage_radii: [0.28, 0.42],
            cage_directions: 16,
            cage_min_static_free: 3,
        }
    }
}

impl NavConfig {
    /// Coarser grid and smaller neighbor fan for constrained tick budgets
    pub fn coarse() -> Self {
        Self {
            cell_size: 0.3,
            neighbor_radius: 1.5,
            max_neighbors: 8,
            ..Default::default()
        }
    }

    /// Set agent collision radius
    pub fn with_body_radius(mut self, radius: f32) -> Self {
        self.body_radius = radius;
        self
    }

    /// Set grid cell size
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Clearance used by every planning and steering query
    ///
    /// The agent's own radius minus a small epsilon so the planner and the
    /// agent's footprint don't double-count.
    pub fn path_clearance(&self) -> f32 {
        (self.body_radius - self.clearance_epsilon).max(0.01)
    }

    /// Check that every knob is usable
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("cell_size", self.cell_size),
            ("line_sample_step", self.line_sample_step),
            ("body_radius", self.body_radius),
            ("max_turn_rate", self.max_turn_rate),
            ("repath_interval", self.repath_interval),
            ("trap_check_interval", self.trap_check_interval),
            ("neighbor_radius", self.neighbor_radius),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(NavError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        if self.cell_size < MIN_CELL_SIZE {
            return Err(NavError::InvalidConfig(format!(
                "cell_size must be at least {MIN_CELL_SIZE}, got {}",
                self.cell_size
            )));
        }

        let non_negative = [
            ("margin", self.margin),
            ("clearance", self.clearance),
            ("clearance_epsilon", self.clearance_epsilon),
            ("stuck_repath", self.stuck_repath),
            ("stuck_path_reset", self.stuck_path_reset),
            ("trap_threshold", self.trap_threshold),
        ];
        for (name, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(NavError::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.turn_stop_threshold < self.turn_slow_threshold {
            return Err(NavError::InvalidConfig(
                "turn_stop_threshold must not be below turn_slow_threshold".to_string(),
            ));
        }
        if self.cage_directions == 0 {
            return Err(NavError::InvalidConfig("cage_directions must be at least 1".to_string()));
        }
        if self.max_neighbors == 0 {
            return Err(NavError::InvalidConfig("max_neighbors must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(NavConfig::default().validate().is_ok());
        assert!(NavConfig::coarse().validate().is_ok());
    }

    #[test]
    fn test_path_clearance() {
        let config = NavConfig::default().with_body_radius(0.24);
        assert!((config.path_clearance() - 0.22).abs() < 1e-6);
        assert_eq!(NavConfig::default().with_body_radius(0.0).path_clearance(), 0.01);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(NavConfig::default().with_cell_size(0.0).validate().is_err());
        assert!(NavConfig::default().with_cell_size(0.01).validate().is_err());
        assert!(NavConfig::default().with_cell_size(MIN_CELL_SIZE).validate().is_ok());
        let config = NavConfig {
            turn_stop_threshold: 0.1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(NavError::InvalidConfig(_))));
    }
}
