//! Behavior states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavior state of the agent
///
/// The climb cycle runs `Patrol -> ToTarget -> PrepareJump -> LaunchUp ->
/// ForepawHook -> PullUp -> JumpSettle -> ToInteractionPoint -> Swipe ->
/// JumpDown -> Sit -> Patrol`. `ToCatnip` and `Distracted` interrupt it
/// whenever a distraction is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BehaviorState {
    #[default]
    Patrol,
    ToTarget,
    PrepareJump,
    LaunchUp,
    ForepawHook,
    PullUp,
    JumpSettle,
    ToInteractionPoint,
    Swipe,
    JumpDown,
    Sit,
    ToCatnip,
    Distracted,
}

/// Animation pose set for an airborne segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JumpPhase {
    Launch,
    Pull,
    Descend,
}

impl BehaviorState {
    pub const ALL: [BehaviorState; 13] = [
        BehaviorState::Patrol,
        BehaviorState::ToTarget,
        BehaviorState::PrepareJump,
        BehaviorState::LaunchUp,
        BehaviorState::ForepawHook,
        BehaviorState::PullUp,
        BehaviorState::JumpSettle,
        BehaviorState::ToInteractionPoint,
        BehaviorState::Swipe,
        BehaviorState::JumpDown,
        BehaviorState::Sit,
        BehaviorState::ToCatnip,
        BehaviorState::Distracted,
    ];

    /// Stable label for HUDs and logs
    pub fn label(self) -> &'static str {
        match self {
            BehaviorState::Patrol => "patrol",
            BehaviorState::ToTarget => "toTarget",
            BehaviorState::PrepareJump => "prepareJump",
            BehaviorState::LaunchUp => "launchUp",
            BehaviorState::ForepawHook => "forepawHook",
            BehaviorState::PullUp => "pullUp",
            BehaviorState::JumpSettle => "jumpSettle",
            BehaviorState::ToInteractionPoint => "toInteractionPoint",
            BehaviorState::Swipe => "swipe",
            BehaviorState::JumpDown => "jumpDown",
            BehaviorState::Sit => "sit",
            BehaviorState::ToCatnip => "toCatnip",
            BehaviorState::Distracted => "distracted",
        }
    }

    /// Default human-readable status
    pub fn status(self) -> &'static str {
        match self {
            BehaviorState::Patrol => "Patrolling",
            BehaviorState::ToTarget => "Approaching jump point",
            BehaviorState::PrepareJump => "Preparing jump",
            BehaviorState::LaunchUp => "Jumping up",
            BehaviorState::ForepawHook => "Grabbing edge",
            BehaviorState::PullUp => "Pulling up",
            BehaviorState::JumpSettle => "Settling on surface",
            BehaviorState::ToInteractionPoint => "Stalking target",
            BehaviorState::Swipe => "Swiping",
            BehaviorState::JumpDown => "Jumping down",
            BehaviorState::Sit => "Sitting",
            BehaviorState::ToCatnip => "Going to catnip",
            BehaviorState::Distracted => "Distracted",
        }
    }

    /// Pose set while a jump segment drives this state
    pub fn jump_phase(self) -> Option<JumpPhase> {
        match self {
            BehaviorState::LaunchUp => Some(JumpPhase::Launch),
            BehaviorState::PullUp => Some(JumpPhase::Pull),
            BehaviorState::JumpDown => Some(JumpPhase::Descend),
            _ => None,
        }
    }

    /// States spent standing on the raised surface
    pub fn is_on_surface(self) -> bool {
        matches!(
            self,
            BehaviorState::ForepawHook
                | BehaviorState::JumpSettle
                | BehaviorState::ToInteractionPoint
                | BehaviorState::Swipe
        )
    }

    /// States that walk the floor and steer around obstacles
    pub fn is_ground_locomotion(self) -> bool {
        matches!(
            self,
            BehaviorState::Patrol | BehaviorState::ToTarget | BehaviorState::ToCatnip
        )
    }

    /// States a distraction does not interrupt
    pub fn is_distraction(self) -> bool {
        matches!(self, BehaviorState::ToCatnip | BehaviorState::Distracted)
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
