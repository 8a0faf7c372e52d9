//! Jump arc driver
//!
//! A segment interpolates ground position and height over a fixed duration
//! with a sinusoidal lift on top. The driver only reports completion; the
//! state machine performs the transition to [`JumpSegment::next`].

use crate::state::BehaviorState;
use prowl_math::{consts::PI, lerp, smoothstep, Rect, Vec2};

/// Keeps an arc above a solid footprint while passing over it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceClip {
    pub footprint: Rect,
    pub min_height: f32,
}

/// Interpolated pose for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpSample {
    pub position: Vec2,
    pub height: f32,
    pub completed: bool,
}

/// One airborne segment
#[derive(Debug, Clone, PartialEq)]
pub struct JumpSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub from_height: f32,
    pub to_height: f32,
    pub duration: f32,
    pub elapsed: f32,
    /// Peak extra height at the midpoint
    pub arc: f32,
    /// State entered on completion
    pub next: BehaviorState,
    pub ease_position: bool,
    pub ease_height: bool,
    pub clip: Option<SurfaceClip>,
}

impl JumpSegment {
    pub fn new(
        from: Vec2,
        to: Vec2,
        from_height: f32,
        to_height: f32,
        duration: f32,
        arc: f32,
        next: BehaviorState,
    ) -> Self {
        Self {
            from,
            to,
            from_height,
            to_height,
            duration: duration.max(1e-3),
            elapsed: 0.0,
            arc,
            next,
            ease_position: false,
            ease_height: false,
            clip: None,
        }
    }

    /// Smooth both position and height
    pub fn eased(mut self) -> Self {
        self.ease_position = true;
        self.ease_height = true;
        self
    }

    pub fn with_surface_clip(mut self, footprint: Rect, min_height: f32) -> Self {
        self.clip = Some(SurfaceClip { footprint, min_height });
        self
    }

    /// Normalized progress in [0, 1]
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Pose at the current progress
    pub fn sample(&self) -> JumpSample {
        let u = self.progress();
        let curve = |eased: bool| if eased { smoothstep(0.0, 1.0, u) } else { u };

        let position = self.from.lerp(self.to, curve(self.ease_position));
        if u >= 1.0 {
            return JumpSample {
                position: self.to,
                height: self.to_height,
                completed: true,
            };
        }

        let mut height = lerp(self.from_height, self.to_height, curve(self.ease_height)) + (PI * u).sin() * self.arc;
        if let Some(clip) = self.clip {
            if clip.footprint.contains(position) {
                height = height.max(clip.min_height);
            }
        }
        JumpSample {
            position,
            height,
            completed: false,
        }
    }

    /// Advance by `dt` and return the new pose
    pub fn update(&mut self, dt: f32) -> JumpSample {
        self.elapsed += dt.max(0.0);
        self.sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn segment() -> JumpSegment {
        JumpSegment::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 0.0, 1.0, 1.0, 0.4, BehaviorState::Sit)
    }

    #[test]
    fn test_linear_midpoint_has_full_arc() {
        let mut jump = segment();
        let sample = jump.update(0.5);
        assert!(!sample.completed);
        assert_relative_eq!(sample.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(sample.height, 0.5 + 0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_completes_exactly_on_target() {
        let mut jump = segment().eased();
        let mut last = jump.update(0.3);
        while !last.completed {
            last = jump.update(0.3);
        }
        assert_eq!(last.position, Vec2::new(2.0, 0.0));
        assert_eq!(last.height, 1.0);
        assert!(jump.is_complete());
    }

    #[test]
    fn test_easing_starts_slower() {
        let mut linear = segment();
        let mut eased = segment().eased();
        let a = linear.update(0.1);
        let b = eased.update(0.1);
        assert!(b.position.x < a.position.x);
    }

    #[test]
    fn test_clip_lifts_over_footprint() {
        // Dropping off a surface that spans x in [-1, 1]
        let footprint = Rect::new(-1.0, 1.0, -1.0, 1.0);
        let mut jump = JumpSegment::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 1.0, 0.0, 1.0, 0.0, BehaviorState::Sit)
            .with_surface_clip(footprint, 1.1);

        let over = jump.update(0.25);
        assert!(footprint.contains(over.position));
        assert_relative_eq!(over.height, 1.1);

        let past = jump.update(0.5);
        assert!(!footprint.contains(past.position));
        assert!(past.height < 1.0);
    }

    #[test]
    fn test_zero_duration_is_clamped() {
        let mut jump = JumpSegment::new(Vec2::ZERO, Vec2::X, 0.0, 0.0, 0.0, 0.3, BehaviorState::Patrol);
        assert!(jump.update(0.016).completed);
    }
}
