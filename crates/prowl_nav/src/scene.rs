//! Room layout and the live objects the obstacle model reads
//!
//! The layout is static configuration. Movables and the interaction target are
//! owned by the object layer; the navigation core only reads them (and writes
//! nudges back through [`crate::recovery::Nudge`]).

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::obstacle::{Obstacle, ObstacleSet};
use prowl_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A fixed piece of the room: container shell or furniture leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub name: String,
    /// Physical footprint
    pub footprint: Obstacle,
    /// Outward padding applied when used as a navigation obstacle
    #[serde(default)]
    pub padding: f32,
}

impl Fixture {
    pub fn new(name: impl Into<String>, footprint: Obstacle, padding: f32) -> Self {
        Self {
            name: name.into(),
            footprint,
            padding,
        }
    }

    /// Footprint inflated by its padding
    pub fn obstacle(&self) -> Obstacle {
        self.footprint.inflated(self.padding)
    }
}

/// Raised surface the agent climbs onto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaisedSurface {
    pub center: Vec2,
    pub size_x: f32,
    pub size_z: f32,
    /// Height of the top face
    pub top_y: f32,
    /// Ground point used to pick a landing spot when jumping down
    pub approach: Vec2,
    /// Candidate ground points to jump up from
    pub jump_anchors: Vec<Vec2>,
}

impl RaisedSurface {
    /// Top face footprint
    pub fn footprint(&self) -> Rect {
        Rect::from_center_size(self.center, self.size_x, self.size_z)
    }

    pub fn half_x(&self) -> f32 {
        self.size_x * 0.5
    }

    pub fn half_z(&self) -> f32 {
        self.size_z * 0.5
    }
}

/// Static room description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLayout {
    /// Floor extent (walls)
    pub bounds: Rect,
    /// Target containers (hamper, trash can)
    pub containers: Vec<Fixture>,
    /// Other fixed volumes on the floor (surface legs)
    pub furniture: Vec<Fixture>,
    pub surface: RaisedSurface,
}

impl RoomLayout {
    /// Reference study room: a desk against the back wall, a hamper and a
    /// trash can near the front.
    pub fn study_room() -> Self {
        let desk_center = Vec2::new(-4.15, -3.9);
        let leg_offsets = [(-1.45, -0.8), (1.45, -0.8), (-1.45, 0.8), (1.45, 0.8)];
        let furniture = leg_offsets
            .iter()
            .enumerate()
            .map(|(i, &(dx, dz))| {
                Fixture::new(
                    format!("desk_leg_{i}"),
                    Obstacle::boxed(desk_center + Vec2::new(dx, dz), 0.06, 0.06),
                    0.03,
                )
            })
            .collect();

        Self {
            bounds: Rect::new(-8.0, 6.0, -6.0, 4.0),
            containers: vec![
                Fixture::new("hamper", Obstacle::boxed(Vec2::new(-5.8, 2.4), 0.45, 0.45), 0.02),
                Fixture::new("trash_can", Obstacle::circle(Vec2::new(2.6, 2.4), 0.35), 0.12),
            ],
            furniture,
            surface: RaisedSurface {
                center: desk_center,
                size_x: 3.1,
                size_z: 1.8,
                top_y: 1.08,
                approach: Vec2::new(-2.55, -3.1),
                jump_anchors: vec![
                    Vec2::new(-2.05, -3.9),
                    Vec2::new(-3.2, -2.45),
                    Vec2::new(-4.9, -2.45),
                    Vec2::new(-6.25, -3.9),
                ],
            },
        }
    }

    /// Same room without furniture volumes
    pub fn without_furniture(mut self) -> Self {
        self.furniture.clear();
        self
    }

    /// Navigable interior after the wall margin
    pub fn interior(&self, margin: f32) -> Rect {
        self.bounds.shrink(margin)
    }

    /// Container shells and furniture as navigation obstacles
    pub fn static_obstacles(&self) -> impl Iterator<Item = Obstacle> + '_ {
        self.containers
            .iter()
            .chain(self.furniture.iter())
            .map(Fixture::obstacle)
    }

    /// Check the layout can host an agent and a climb
    pub fn validate(&self) -> Result<()> {
        if self.bounds.is_degenerate() {
            return Err(NavError::InvalidLayout("room bounds have no interior".into()));
        }
        if self.surface.size_x <= 0.0 || self.surface.size_z <= 0.0 {
            return Err(NavError::InvalidLayout("raised surface has no area".into()));
        }
        if self.surface.jump_anchors.is_empty() {
            return Err(NavError::InvalidLayout("raised surface has no jump anchors".into()));
        }
        Ok(())
    }
}

impl Default for RoomLayout {
    fn default() -> Self {
        Self::study_room()
    }
}

/// Coarse shape of a movable object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovableShape {
    /// Round-ish clutter, treated as a disc
    Loose { radius: f32 },
    /// Flat item lying on the floor, treated as a box aligned to its yaw
    Flat { half_x: f32, half_z: f32 },
}

impl MovableShape {
    /// Radius of the disc that encloses the footprint
    pub fn radius(&self) -> f32 {
        match *self {
            Self::Loose { radius } => radius,
            Self::Flat { half_x, half_z } => half_x.max(half_z),
        }
    }
}

/// Object owned by the physics layer that the agent may bump into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovableObject {
    pub id: u32,
    pub shape: MovableShape,
    pub position: Vec2,
    /// Height of the object's base above the floor
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub velocity: [f32; 3],
    /// At rest (not tumbling); only settled objects block navigation
    #[serde(default = "default_true")]
    pub settled: bool,
    /// Carried by the player; never an obstacle
    #[serde(default)]
    pub held: bool,
}

fn default_true() -> bool {
    true
}

impl MovableObject {
    /// Settled loose object on the floor
    pub fn loose(id: u32, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            shape: MovableShape::Loose { radius },
            position,
            height: 0.0,
            yaw: 0.0,
            velocity: [0.0; 3],
            settled: true,
            held: false,
        }
    }

    /// Settled flat object on the floor
    pub fn flat(id: u32, position: Vec2, half_x: f32, half_z: f32, yaw: f32) -> Self {
        Self {
            shape: MovableShape::Flat { half_x, half_z },
            yaw,
            ..Self::loose(id, position, 0.0)
        }
    }

    pub fn radius(&self) -> f32 {
        self.shape.radius()
    }

    /// Navigation footprint
    pub fn obstacle(&self, loose_boost: f32) -> Obstacle {
        match self.shape {
            MovableShape::Loose { radius } => Obstacle::circle(self.position, radius + loose_boost),
            MovableShape::Flat { half_x, half_z } => {
                Obstacle::oriented(self.position, half_x, half_z, self.yaw)
            }
        }
    }
}

/// The object the agent swipes at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetObject {
    pub position: Vec2,
    /// Height of the target's base
    pub height: f32,
    pub radius: f32,
    /// Knocked over or broken
    #[serde(default)]
    pub toppled: bool,
}

impl TargetObject {
    pub fn new(position: Vec2, height: f32, radius: f32) -> Self {
        Self {
            position,
            height,
            radius,
            toppled: false,
        }
    }
}

/// Immutable view of everything the obstacle model reads
#[derive(Debug, Clone, Copy)]
pub struct ObstacleSnapshot<'a> {
    pub layout: &'a RoomLayout,
    pub movables: &'a [MovableObject],
    pub target: Option<&'a TargetObject>,
    /// Agent position, used to skip clutter the agent already touches
    pub agent_position: Vec2,
    pub config: &'a NavConfig,
}

impl<'a> ObstacleSnapshot<'a> {
    /// Build the obstacle set for one query
    ///
    /// Container shells, furniture, and a low upright target are always
    /// present. Settled low movables are added when `include_movables` is set;
    /// those within the nearby exclusion radius of the agent are skipped unless
    /// `include_nearby` is also set.
    pub fn build_obstacles(&self, include_movables: bool, include_nearby: bool) -> ObstacleSet {
        let config = self.config;
        let mut set = ObstacleSet::new(
            self.layout.interior(config.margin),
            self.layout.static_obstacles().collect(),
        )
        .with_sample_step(config.line_sample_step);

        if let Some(target) = self.target {
            if !target.toppled && target.height <= config.movable_height_limit {
                set.push(Obstacle::circle(target.position, target.radius + 0.04));
            }
        }

        if include_movables {
            let exclusion_sq = config.nearby_exclusion * config.nearby_exclusion;
            for item in self.movables {
                if item.held || !item.settled || item.height > config.movable_height_limit {
                    continue;
                }
                if !include_nearby && item.position.distance_squared(self.agent_position) < exclusion_sq {
                    continue;
                }
                set.push(item.obstacle(config.loose_radius_boost));
            }
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot<'a>(
        layout: &'a RoomLayout,
        movables: &'a [MovableObject],
        config: &'a NavConfig,
        agent: Vec2,
    ) -> ObstacleSnapshot<'a> {
        ObstacleSnapshot {
            layout,
            movables,
            target: None,
            agent_position: agent,
            config,
        }
    }

    #[test]
    fn test_study_room_is_valid() {
        let layout = RoomLayout::study_room();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.static_obstacles().count(), 6);
    }

    #[test]
    fn test_static_set_blocks_hamper() {
        let layout = RoomLayout::study_room();
        let config = NavConfig::default();
        let set = snapshot(&layout, &[], &config, Vec2::ZERO).build_obstacles(false, false);
        assert!(set.is_blocked(Vec2::new(-5.8, 2.4), 0.0));
        assert!(!set.is_blocked(Vec2::new(0.0, 0.0), config.path_clearance()));
    }

    #[test]
    fn test_movable_filters() {
        let layout = RoomLayout::study_room();
        let config = NavConfig::default();
        let mut airborne = MovableObject::loose(2, Vec2::new(1.0, 0.0), 0.16);
        airborne.height = 0.8;
        let mut held = MovableObject::loose(3, Vec2::new(-1.0, 0.0), 0.16);
        held.held = true;
        let movables = vec![
            MovableObject::loose(1, Vec2::new(0.1, 0.0), 0.16),
            airborne,
            held,
            MovableObject::flat(4, Vec2::new(0.0, 1.5), 0.17, 0.11, 0.3),
        ];
        let snap = snapshot(&layout, &movables, &config, Vec2::ZERO);

        let statics = snap.build_obstacles(false, false).len();
        // The close loose item is skipped, the flat one kept
        assert_eq!(snap.build_obstacles(true, false).len(), statics + 1);
        assert_eq!(snap.build_obstacles(true, true).len(), statics + 2);
    }

    #[test]
    fn test_low_target_is_obstacle() {
        let layout = RoomLayout::study_room();
        let config = NavConfig::default();
        let base = snapshot(&layout, &[], &config, Vec2::ZERO)
            .build_obstacles(false, false)
            .len();

        let floor_target = TargetObject::new(Vec2::new(1.0, 1.0), 0.0, 0.1);
        let mut snap = snapshot(&layout, &[], &config, Vec2::ZERO);
        snap.target = Some(&floor_target);
        assert_eq!(snap.build_obstacles(false, false).len(), base + 1);

        let raised_target = TargetObject::new(Vec2::new(1.0, 1.0), 1.09, 0.1);
        snap.target = Some(&raised_target);
        assert_eq!(snap.build_obstacles(false, false).len(), base);
    }
}
