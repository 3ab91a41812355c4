/// Axis-aligned bounding volumes in 2D and 3D.
///
/// These are the only geometric primitives the spatial index needs:
/// per-axis extrema, enclosure, overlap and combination. Boxes are closed
/// (a box touching another one on a face intersects it).

use std::fmt::Debug;
use glam::{Vec2, Vec3};

/// Dimension-agnostic bounding box contract used by trees and frustums.
pub trait Bounds: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Point type of the space
    type Point: Copy + Debug + PartialEq + Send + Sync + 'static;

    /// Number of axes
    const DIMENSIONS: usize;

    /// Box from its two extreme corners.
    ///
    /// # Panics
    ///
    /// If `lower` exceeds `upper` on any axis or a coordinate is not finite.
    fn from_corners(lower: Self::Point, upper: Self::Point) -> Self;

    /// Lowest corner
    fn lower(&self) -> Self::Point;

    /// Highest corner
    fn upper(&self) -> Self::Point;

    /// Lowest coordinate along `axis` (0 = x, 1 = y, 2 = z)
    fn min_of(&self, axis: usize) -> f32;

    /// Highest coordinate along `axis`
    fn max_of(&self, axis: usize) -> f32;

    /// Geometric center
    fn center(&self) -> Self::Point;

    /// `true` if `other` lies entirely within `self` (faces may touch)
    fn encloses(&self, other: &Self) -> bool {
        (0..Self::DIMENSIONS).all(|axis| {
            self.min_of(axis) <= other.min_of(axis) && self.max_of(axis) >= other.max_of(axis)
        })
    }

    /// `true` if the two boxes overlap or touch
    fn intersects(&self, other: &Self) -> bool {
        (0..Self::DIMENSIONS).all(|axis| {
            self.min_of(axis) <= other.max_of(axis) && self.max_of(axis) >= other.min_of(axis)
        })
    }

    /// Smallest box enclosing both operands
    fn combine(&self, other: &Self) -> Self;

    /// `true` if the point lies inside or on the box
    fn contains_point(&self, point: Self::Point) -> bool;

    /// Box grown by `margin` on every side
    fn expanded(&self, margin: f32) -> Self;

    /// `true` if some axis has zero extent
    fn is_degenerate(&self) -> bool {
        (0..Self::DIMENSIONS).any(|axis| self.max_of(axis) <= self.min_of(axis))
    }

    /// Smallest box enclosing every box of the iterator, `None` when empty
    fn union_all<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        boxes.into_iter().fold(None, |acc: Option<Self>, b| match acc {
            Some(a) => Some(a.combine(b)),
            None => Some(*b),
        })
    }
}

// ===== AABB2 =====

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    /// Minimum corner (x, y)
    pub min: Vec2,
    /// Maximum corner (x, y)
    pub max: Vec2,
}

impl Aabb2 {
    /// Rectangle from its corners, see [`Bounds::from_corners`]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        assert!(min.is_finite() && max.is_finite(), "non-finite bounds {:?}..{:?}", min, max);
        assert!(min.cmple(max).all(), "inverted bounds {:?}..{:?}", min, max);
        Self { min, max }
    }

    /// Square of half-size `half_extent` around `center`
    pub fn from_center(center: Vec2, half_extent: f32) -> Self {
        Self::new(center - Vec2::splat(half_extent), center + Vec2::splat(half_extent))
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// The four corners, counter-clockwise from `min`
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Squared distance from a point to the rectangle (0 inside)
    pub fn distance_squared_to(&self, point: Vec2) -> f32 {
        let nearest = point.clamp(self.min, self.max);
        nearest.distance_squared(point)
    }
}

impl Bounds for Aabb2 {
    type Point = Vec2;

    const DIMENSIONS: usize = 2;

    fn from_corners(lower: Vec2, upper: Vec2) -> Self {
        Self::new(lower, upper)
    }

    fn lower(&self) -> Vec2 {
        self.min
    }

    fn upper(&self) -> Vec2 {
        self.max
    }

    fn min_of(&self, axis: usize) -> f32 {
        self.min[axis]
    }

    fn max_of(&self, axis: usize) -> f32 {
        self.max[axis]
    }

    fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    fn combine(&self, other: &Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }

    fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }
}

// ===== AABB3 =====

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb3 {
    /// Box from its corners, see [`Bounds::from_corners`]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        assert!(min.is_finite() && max.is_finite(), "non-finite bounds {:?}..{:?}", min, max);
        assert!(min.cmple(max).all(), "inverted bounds {:?}..{:?}", min, max);
        Self { min, max }
    }

    /// Cube of half-size `half_extent` around `center`
    pub fn from_center(center: Vec3, half_extent: f32) -> Self {
        Self::new(center - Vec3::splat(half_extent), center + Vec3::splat(half_extent))
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The eight corners; bit 0 of the index selects x, bit 1 y, bit 2 z
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Squared distance from a point to the box (0 inside)
    pub fn distance_squared_to(&self, point: Vec3) -> f32 {
        let nearest = point.clamp(self.min, self.max);
        nearest.distance_squared(point)
    }
}

impl Bounds for Aabb3 {
    type Point = Vec3;

    const DIMENSIONS: usize = 3;

    fn from_corners(lower: Vec3, upper: Vec3) -> Self {
        Self::new(lower, upper)
    }

    fn lower(&self) -> Vec3 {
        self.min
    }

    fn upper(&self) -> Vec3 {
        self.max
    }

    fn min_of(&self, axis: usize) -> f32 {
        self.min[axis]
    }

    fn max_of(&self, axis: usize) -> f32 {
        self.max[axis]
    }

    fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn combine(&self, other: &Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    fn contains_point(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && point.cmple(self.max).all()
    }

    fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec3::splat(margin), self.max + Vec3::splat(margin))
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
