/// Space families: a dimension bound to its boxes, zones and partition rule.
///
/// A perception tree is generic over a `Space`. `QuadSpace` partitions the
/// plane in four zones, `OctSpace` partitions volumes in eight. Both add an
/// icosep slot after the spatial zones.

use std::fmt::Debug;
use glam::{Vec2, Vec3};
use crate::bounds::{Aabb2, Aabb3, Bounds};
use crate::zone::{
    classify_oct_box, classify_quad_box, OctTreeZone, QuadTreeZone, ZoneConflict,
};

/// Dimension family of a perception tree.
pub trait Space: Copy + Debug + Send + Sync + 'static {
    /// Point type
    type Point: Copy + Debug + PartialEq + Send + Sync + 'static;

    /// Bounding volume type
    type Aabb: Bounds<Point = Self::Point>;

    /// Zone enumeration (spatial zones then icosep)
    type Zone: Copy + Debug + Eq + Send + Sync + 'static;

    /// Short name used in log messages
    const NAME: &'static str;

    /// Number of spatial zones
    const SPATIAL_ZONES: usize;

    /// Child slots per node, icosep included
    const SLOT_COUNT: usize = Self::SPATIAL_ZONES + 1;

    /// Slot index of the icosep zone
    const ICOSEP_SLOT: usize = Self::SPATIAL_ZONES;

    /// Split point of a node covering `area`
    fn split_point(area: &Self::Aabb) -> Self::Point {
        area.center()
    }

    /// Zone slot of `bounds`, or the first straddled axis
    fn classify(split: Self::Point, bounds: &Self::Aabb) -> Result<usize, ZoneConflict>;

    /// Zone slot of `bounds`, straddles mapping to [`Self::ICOSEP_SLOT`]
    fn classify_with_icosep(split: Self::Point, bounds: &Self::Aabb) -> usize {
        Self::classify(split, bounds).unwrap_or(Self::ICOSEP_SLOT)
    }

    /// Area of the child in `slot` of a node covering `area`.
    ///
    /// The icosep child covers the same area as its parent.
    fn zone_area(area: &Self::Aabb, slot: usize) -> Self::Aabb;

    /// Typed zone of a slot index
    fn zone(slot: usize) -> Self::Zone;
}

/// Split the interval `[min, max]` at `mid`, keeping the upper half if `upper`.
#[inline]
fn half(min: f32, mid: f32, max: f32, upper: bool) -> (f32, f32) {
    if upper { (mid, max) } else { (min, mid) }
}

// ===== QUAD =====

/// Two-dimensional space partitioned by quad nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuadSpace;

impl Space for QuadSpace {
    type Point = Vec2;
    type Aabb = Aabb2;
    type Zone = QuadTreeZone;

    const NAME: &'static str = "quad";
    const SPATIAL_ZONES: usize = QuadTreeZone::SPATIAL_COUNT;

    fn classify(split: Vec2, bounds: &Aabb2) -> Result<usize, ZoneConflict> {
        classify_quad_box(split, bounds.min, bounds.max).map(QuadTreeZone::ordinal)
    }

    fn zone_area(area: &Aabb2, slot: usize) -> Aabb2 {
        let Some((east, north)) = Self::zone(slot).sides() else {
            return *area;
        };
        let c = area.center();
        let (x0, x1) = half(area.min.x, c.x, area.max.x, east);
        let (y0, y1) = half(area.min.y, c.y, area.max.y, north);
        Aabb2::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    fn zone(slot: usize) -> QuadTreeZone {
        QuadTreeZone::from_ordinal(slot)
            .unwrap_or_else(|| panic!("quad slot {} out of range", slot))
    }
}

// ===== OCT =====

/// Three-dimensional space partitioned by oct nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctSpace;

impl Space for OctSpace {
    type Point = Vec3;
    type Aabb = Aabb3;
    type Zone = OctTreeZone;

    const NAME: &'static str = "oct";
    const SPATIAL_ZONES: usize = OctTreeZone::SPATIAL_COUNT;

    fn classify(split: Vec3, bounds: &Aabb3) -> Result<usize, ZoneConflict> {
        classify_oct_box(split, bounds.min, bounds.max).map(OctTreeZone::ordinal)
    }

    fn zone_area(area: &Aabb3, slot: usize) -> Aabb3 {
        let Some((east, north, back)) = Self::zone(slot).sides() else {
            return *area;
        };
        let c = area.center();
        let (x0, x1) = half(area.min.x, c.x, area.max.x, east);
        let (y0, y1) = half(area.min.y, c.y, area.max.y, north);
        let (z0, z1) = half(area.min.z, c.z, area.max.z, back);
        Aabb3::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }

    fn zone(slot: usize) -> OctTreeZone {
        OctTreeZone::from_ordinal(slot)
            .unwrap_or_else(|| panic!("oct slot {} out of range", slot))
    }
}
