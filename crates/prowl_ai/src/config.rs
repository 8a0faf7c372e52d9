//! Behavior tuning and agent configuration

use crate::error::{AiError, Result};
use prowl_math::Vec2;
use prowl_nav::NavConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Durations of the climb sequence, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpTiming {
    /// Turn-to-face at the anchor before launching
    pub prepare: f32,
    /// Arc from the anchor to the edge hook
    pub launch: f32,
    /// Pause hanging on the edge
    pub hook: f32,
    /// Arc from the hook onto the surface
    pub pull: f32,
    /// Settle after landing on top
    pub settle: f32,
}

impl Default for JumpTiming {
    fn default() -> Self {
        Self {
            prepare: 0.34,
            launch: 0.38,
            hook: 0.22,
            pull: 0.34,
            settle: 0.3,
        }
    }
}

/// Phases of a swipe, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeTiming {
    pub windup: f32,
    pub strike: f32,
    pub recover: f32,
    /// Fraction of the strike phase at which the hit lands
    pub hit_fraction: f32,
}

impl SwipeTiming {
    /// Total swipe duration
    pub fn total(&self) -> f32 {
        self.windup + self.strike + self.recover.max(0.01)
    }

    /// Phase time at which the hit is guaranteed to have fired
    pub fn hit_time(&self) -> f32 {
        self.windup + self.strike * self.hit_fraction
    }
}

impl Default for SwipeTiming {
    fn default() -> Self {
        Self {
            windup: 0.3,
            strike: 0.16,
            recover: 0.36,
            hit_fraction: 0.55,
        }
    }
}

/// Behavior state machine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub patrol_speed: f32,
    pub approach_speed: f32,
    /// Walking speed on the raised surface
    pub surface_speed: f32,
    pub distraction_speed: f32,

    /// Seconds between approach rolls while patrolling
    pub roll_interval: f32,
    /// Chance per roll of heading for the surface
    pub roll_chance: f32,
    /// No approach rolls before this simulation time
    pub roll_grace: f32,

    pub jump: JumpTiming,
    pub launch_arc: f32,
    pub pull_arc: f32,
    /// Hook height below the surface top
    pub hook_drop: f32,
    /// Facing gain while preparing a jump, per second
    pub prepare_turn_gain: f32,
    pub descend_duration: f32,
    pub descend_arc: f32,
    /// Jump-down duration when a distraction pulls the agent off the surface
    pub distraction_descend_duration: f32,

    pub swipe: SwipeTiming,
    pub sit_duration: f32,

    /// Anchor is re-selected after this long in the approach state
    pub approach_timeout: f32,
    /// Stuck time that triggers an anchor re-selection
    pub anchor_replan_stuck: f32,
    pub anchor_replan_cooldown: f32,
    /// Seconds between clutter-bypass reachability checks
    pub bypass_check_interval: f32,
    /// Direct steering engages within this distance of the anchor
    pub approach_lock_radius: f32,
    /// ..and releases beyond this one
    pub approach_unlock_radius: f32,

    /// Standing point relative to the interaction target
    pub interaction_offset: Vec2,
    /// Close enough to start the swipe
    pub interaction_reach: f32,
    /// Minimum distance kept from an upright target while on the surface
    pub target_keep_away: f32,

    /// Stuck time that forces a dynamic-aware replan
    pub stuck_rescue: f32,
    /// Stuck time that nudges the nearest blocking movable
    pub stuck_nudge: f32,
    /// Stuck time that abandons the current errand
    pub stuck_reset: f32,

    /// Lifetime of a placed distraction
    pub distraction_lifetime: f32,

    /// Tick delta cap
    pub max_delta_time: f32,
    /// RNG seed for patrol sampling and approach rolls
    pub seed: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            patrol_speed: 0.95,
            approach_speed: 0.92,
            surface_speed: 0.65,
            distraction_speed: 1.0,
            roll_interval: 4.0,
            roll_chance: 0.55,
            roll_grace: 3.0,
            jump: JumpTiming::default(),
            launch_arc: 0.4,
            pull_arc: 0.26,
            hook_drop: 0.18,
            prepare_turn_gain: 5.5,
            descend_duration: 0.64,
            descend_arc: 0.34,
            distraction_descend_duration: 0.62,
            swipe: SwipeTiming::default(),
            sit_duration: 1.25,
            approach_timeout: 8.0,
            anchor_replan_stuck: 0.46,
            anchor_replan_cooldown: 0.55,
            bypass_check_interval: 0.45,
            approach_lock_radius: 0.4,
            approach_unlock_radius: 0.56,
            interaction_offset: Vec2::new(-0.36, 0.02),
            interaction_reach: 0.18,
            target_keep_away: 0.3,
            stuck_rescue: 0.7,
            stuck_nudge: 1.1,
            stuck_reset: 2.6,
            distraction_lifetime: 7.0,
            max_delta_time: 0.05,
            seed: 7,
        }
    }
}

impl BehaviorConfig {
    /// Check that every knob is usable
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("patrol_speed", self.patrol_speed),
            ("approach_speed", self.approach_speed),
            ("surface_speed", self.surface_speed),
            ("distraction_speed", self.distraction_speed),
            ("roll_interval", self.roll_interval),
            ("jump.launch", self.jump.launch),
            ("jump.pull", self.jump.pull),
            ("descend_duration", self.descend_duration),
            ("distraction_descend_duration", self.distraction_descend_duration),
            ("max_delta_time", self.max_delta_time),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(AiError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("roll_grace", self.roll_grace),
            ("jump.prepare", self.jump.prepare),
            ("jump.hook", self.jump.hook),
            ("jump.settle", self.jump.settle),
            ("swipe.windup", self.swipe.windup),
            ("swipe.strike", self.swipe.strike),
            ("swipe.recover", self.swipe.recover),
            ("sit_duration", self.sit_duration),
            ("target_keep_away", self.target_keep_away),
        ];
        for (name, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(AiError::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }

        if !(0.0..=1.0).contains(&self.roll_chance) {
            return Err(AiError::InvalidConfig(format!(
                "roll_chance must be within [0, 1], got {}",
                self.roll_chance
            )));
        }
        if !(0.0..=1.0).contains(&self.swipe.hit_fraction) {
            return Err(AiError::InvalidConfig(format!(
                "swipe.hit_fraction must be within [0, 1], got {}",
                self.swipe.hit_fraction
            )));
        }
        if self.approach_unlock_radius < self.approach_lock_radius {
            return Err(AiError::InvalidConfig(
                "approach_unlock_radius must not be smaller than approach_lock_radius".into(),
            ));
        }
        if !(self.stuck_rescue <= self.stuck_nudge && self.stuck_nudge <= self.stuck_reset) {
            return Err(AiError::InvalidConfig(
                "stuck thresholds must satisfy rescue <= nudge <= reset".into(),
            ));
        }
        Ok(())
    }

    /// Zero every wait so a climb cycle runs on jump durations alone
    pub fn instant(mut self) -> Self {
        self.jump.prepare = 0.0;
        self.jump.hook = 0.0;
        self.jump.settle = 0.0;
        self.sit_duration = 0.0;
        self.roll_grace = 0.0;
        self
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub nav: NavConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl AgentConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.nav.validate()?;
        self.behavior.validate()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
        assert!(BehaviorConfig::default().instant().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = AgentConfig::from_json_str(r#"{"behavior": {"roll_chance": 1.0, "seed": 42}}"#).unwrap();
        assert_eq!(config.behavior.roll_chance, 1.0);
        assert_eq!(config.behavior.seed, 42);
        assert_eq!(config.behavior.sit_duration, 1.25);
        assert_eq!(config.nav, NavConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = AgentConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(AgentConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let result = AgentConfig::from_json_str(r#"{"behavior": {"roll_chance": 1.5}}"#);
        assert!(matches!(result, Err(AiError::InvalidConfig(_))));

        let result = AgentConfig::from_json_str(r#"{"nav": {"cell_size": 0.0}}"#);
        assert!(matches!(result, Err(AiError::Nav(_))));

        let result = AgentConfig::from_json_str("{not json");
        assert!(matches!(result, Err(AiError::Json(_))));
    }

    #[test]
    fn test_hit_time_is_inside_strike() {
        let swipe = SwipeTiming::default();
        assert!(swipe.hit_time() > swipe.windup);
        assert!(swipe.hit_time() < swipe.windup + swipe.strike);
        assert!(swipe.total() > swipe.hit_time());
    }
}
