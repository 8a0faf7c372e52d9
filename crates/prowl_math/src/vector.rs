//! Ground-plane vector

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Point or direction on the floor plane
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub z: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Unit heading for a yaw angle
    #[inline]
    pub fn from_yaw(yaw: f32) -> Self {
        Self::new(yaw.sin(), yaw.cos())
    }

    /// Unit vector at `angle` measured from `+x` toward `+z`
    ///
    /// Used for ring and fan sampling where only coverage matters.
    #[inline]
    pub fn from_polar(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Yaw that faces along this vector
    #[inline]
    pub fn yaw(self) -> f32 {
        self.x.atan2(self.z)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.z * other.z
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Squared distance (faster for comparisons)
    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 { self / len } else { Self::ZERO }
    }

    /// Normalize, or return `fallback` for near-zero vectors
    #[inline]
    pub fn normalize_or(self, fallback: Self) -> Self {
        let len = self.length();
        if len > 1e-4 { self / len } else { fallback }
    }

    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    #[inline]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.z, self.x)
    }

    /// Express this vector in a frame rotated by `yaw`
    #[inline]
    pub fn rotate_into(self, yaw: f32) -> Self {
        let (s, c) = yaw.sin_cos();
        Self::new(c * self.x + s * self.z, -s * self.x + c * self.z)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.z]
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline] fn add(self, rhs: Self) -> Self { Self::new(self.x + rhs.x, self.z + rhs.z) }
}
impl Sub for Vec2 {
    type Output = Self;
    #[inline] fn sub(self, rhs: Self) -> Self { Self::new(self.x - rhs.x, self.z - rhs.z) }
}
impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline] fn mul(self, rhs: f32) -> Self { Self::new(self.x * rhs, self.z * rhs) }
}
impl Div<f32> for Vec2 {
    type Output = Self;
    #[inline] fn div(self, rhs: f32) -> Self { Self::new(self.x / rhs, self.z / rhs) }
}
impl Neg for Vec2 {
    type Output = Self;
    #[inline] fn neg(self) -> Self { Self::new(-self.x, -self.z) }
}
impl AddAssign for Vec2 {
    #[inline] fn add_assign(&mut self, rhs: Self) { self.x += rhs.x; self.z += rhs.z; }
}
impl SubAssign for Vec2 {
    #[inline] fn sub_assign(&mut self, rhs: Self) { self.x -= rhs.x; self.z -= rhs.z; }
}

impl From<[f32; 2]> for Vec2 {
    fn from(arr: [f32; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.z)
    }
}
