//! Axis-aligned floor rectangles (room bounds, surface footprints)

use crate::clamp;
use crate::vector::Vec2;

/// Axis-aligned rectangle on the floor plane
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Rect {
    #[inline]
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self { min_x, max_x, min_z, max_z }
    }

    /// Rectangle centered on `center` with full extents `size_x` by `size_z`
    pub fn from_center_size(center: Vec2, size_x: f32, size_z: f32) -> Self {
        Self::new(
            center.x - size_x * 0.5,
            center.x + size_x * 0.5,
            center.z - size_z * 0.5,
            center.z + size_z * 0.5,
        )
    }

    /// Shrink every side by `margin`
    pub fn shrink(self, margin: f32) -> Self {
        Self::new(self.min_x + margin, self.max_x - margin, self.min_z + margin, self.max_z - margin)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min_x + self.max_x) * 0.5, (self.min_z + self.max_z) * 0.5)
    }

    /// True when the rectangle has no interior
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.depth() > 0.0)
    }

    /// Closed containment test
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    /// Nearest point inside the rectangle
    ///
    /// Never panics, even on an inverted rectangle.
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(clamp(p.x, self.min_x, self.max_x), clamp(p.z, self.min_z, self.max_z))
    }
}
