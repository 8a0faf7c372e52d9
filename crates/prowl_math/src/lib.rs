//! # prowl_math - Ground-Plane Math
//!
//! Small math primitives shared by the navigation and behavior crates.
//! Everything lives on the floor plane: `x` runs across the room, `z` runs
//! into it, and height is tracked separately by whoever needs it.
//!
//! Yaw follows the convention `yaw = atan2(dx, dz)`, so a yaw of zero faces
//! `+z` and the heading vector is `(sin yaw, cos yaw)`.

pub mod angle;
pub mod easing;
pub mod rect;
pub mod vector;

pub use angle::*;
pub use easing::*;
pub use rect::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = std::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const EPSILON: f32 = 1e-6;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}

pub mod prelude {
    pub use crate::angle::{angle_delta, wrap_angle};
    pub use crate::easing::{smootherstep, smoothstep};
    pub use crate::rect::Rect;
    pub use crate::vector::Vec2;
    pub use crate::{clamp, lerp};
}
