//! Everything the behavior core reads and writes outside the agent

use crate::distraction::Distraction;
use crate::error::Result;
use prowl_math::Vec2;
use prowl_nav::{GridPlanner, MovableObject, NavWorld, Nudge, RoomLayout, TargetObject};
use serde::{Deserialize, Serialize};

/// Room state shared with the object layer
///
/// The behavior core reads it every tick. It writes back nudged movables and
/// clears an expired distraction; knocking the target over after a swipe hit
/// is left to whoever owns object physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub layout: RoomLayout,
    #[serde(default)]
    pub movables: Vec<MovableObject>,
    pub target: TargetObject,
    #[serde(default)]
    pub distraction: Option<Distraction>,
    /// Simulation time in seconds
    #[serde(default)]
    pub time: f32,
}

impl World {
    pub fn new(layout: RoomLayout, target: TargetObject) -> Self {
        Self {
            layout,
            movables: Vec::new(),
            target,
            distraction: None,
            time: 0.0,
        }
    }

    /// Study room with a cup on the desk
    pub fn study_room() -> Self {
        let layout = RoomLayout::study_room();
        let target = TargetObject::new(Vec2::new(-3.6, -3.7), layout.surface.top_y + 0.01, 0.12);
        Self::new(layout, target)
    }

    pub fn with_movables(mut self, movables: Vec<MovableObject>) -> Self {
        self.movables = movables;
        self
    }

    /// Navigation view for one query
    pub fn nav<'a>(&'a self, planner: &'a GridPlanner) -> NavWorld<'a> {
        NavWorld::new(&self.layout, &self.movables, Some(&self.target), planner, self.time)
    }

    pub fn apply_nudge(&mut self, nudge: &Nudge) {
        nudge.apply(&mut self.movables);
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let world: Self = serde_json::from_str(json)?;
        world.layout.validate()?;
        Ok(world)
    }

    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::study_room()
    }
}
