//! Yaw helpers

use crate::consts::{PI, TAU};

/// Wrap an angle into `(-PI, PI]`
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Shortest signed rotation taking `from` onto `to`
#[inline]
pub fn angle_delta(to: f32, from: f32) -> f32 {
    let d = to - from;
    d.sin().atan2(d.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wrap_angle() {
        assert_abs_diff_eq!(wrap_angle(3.0 * PI).abs(), PI, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_angle(-0.5), -0.5);
        assert_abs_diff_eq!(wrap_angle(TAU + 0.25), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_delta_takes_short_way() {
        assert_abs_diff_eq!(angle_delta(-3.0, 3.0), TAU - 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(angle_delta(0.4, 0.1), 0.3, epsilon = 1e-5);
    }
}
