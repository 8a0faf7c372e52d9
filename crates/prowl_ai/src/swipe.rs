//! Swipe pose and hit latching

use crate::config::SwipeTiming;
use prowl_math::smootherstep;
use serde::{Deserialize, Serialize};

/// Paw pose sampled from elapsed swipe time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SwipePose {
    /// Paw lift, 0 at rest and 1 at the top of the windup
    pub lift: f32,
    /// Forward reach, negative while drawn back
    pub reach: f32,
    /// Body lean
    pub lean: f32,
    /// Inside the hit window of the strike
    pub hit: bool,
    /// Swipe finished
    pub done: bool,
}

fn phase_progress(t: f32, start: f32, length: f32) -> f32 {
    smootherstep(0.0, 1.0, (t - start) / length.max(1e-5))
}

/// Sample the swipe pose at phase time `t`
pub fn sample_swipe_pose(t: f32, timing: &SwipeTiming) -> SwipePose {
    let strike_start = timing.windup;
    let recover_start = timing.windup + timing.strike;
    let recover = timing.recover.max(0.01);
    let mut pose = SwipePose::default();

    if t < strike_start {
        let u = phase_progress(t, 0.0, timing.windup);
        pose.lift = u;
        pose.reach = -0.24 * u;
        pose.lean = 0.18 * u;
    } else if t < recover_start {
        let u = phase_progress(t, strike_start, timing.strike);
        pose.lift = 1.0 - u * 0.58;
        pose.reach = -0.24 + u * 1.22;
        pose.lean = 0.18 - u * 0.34;
        pose.hit = t >= timing.hit_time();
    } else if t < recover_start + recover {
        let u = phase_progress(t, recover_start, recover);
        pose.lift = 0.42 * (1.0 - u);
        pose.reach = 0.98 - u * 0.76;
        pose.lean = -0.16 * (1.0 - u);
    } else {
        pose.done = true;
    }
    pose
}

/// Fires the hit once per swipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitLatch {
    fired: bool,
}

impl HitLatch {
    /// True on the single tick the hit lands
    ///
    /// Fires once phase time reaches the hit time even if the tick stepped
    /// over the whole strike window.
    pub fn update(&mut self, t: f32, pose: &SwipePose, timing: &SwipeTiming) -> bool {
        if self.fired {
            return false;
        }
        if pose.hit || t >= timing.hit_time() {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_phases() {
        let timing = SwipeTiming::default();
        let rest = sample_swipe_pose(0.0, &timing);
        assert_relative_eq!(rest.lift, 0.0);

        let drawn = sample_swipe_pose(timing.windup - 1e-4, &timing);
        assert!(drawn.lift > 0.99);
        assert!(drawn.reach < -0.23);

        let struck = sample_swipe_pose(timing.windup + timing.strike - 1e-4, &timing);
        assert!(struck.hit);
        assert!(struck.reach > 0.97);

        assert!(sample_swipe_pose(timing.total() + 0.01, &timing).done);
    }

    #[test]
    fn test_hit_window_starts_mid_strike() {
        let timing = SwipeTiming::default();
        assert!(!sample_swipe_pose(timing.windup + 0.01, &timing).hit);
        assert!(sample_swipe_pose(timing.hit_time() + 0.001, &timing).hit);
        assert!(!sample_swipe_pose(timing.windup + timing.strike + 0.01, &timing).hit);
    }

    #[test]
    fn test_latch_fires_once() {
        let timing = SwipeTiming::default();
        let mut latch = HitLatch::default();
        let mut fired = 0;
        let mut t = 0.0;
        while t < timing.total() + 0.1 {
            let pose = sample_swipe_pose(t, &timing);
            if latch.update(t, &pose, &timing) {
                fired += 1;
            }
            t += 1.0 / 120.0;
        }
        assert_eq!(fired, 1);
        assert!(latch.has_fired());
    }

    #[test]
    fn test_latch_catches_skipped_strike() {
        let timing = SwipeTiming::default();
        let mut latch = HitLatch::default();
        // One long tick jumps from windup straight into recovery
        let t = timing.windup + timing.strike + 0.05;
        let pose = sample_swipe_pose(t, &timing);
        assert!(!pose.hit);
        assert!(latch.update(t, &pose, &timing));
        assert!(!latch.update(t + 0.1, &pose, &timing));
    }
}
