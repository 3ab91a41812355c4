//! Zone classification for quad and oct partitions.
//!
//! A node splits its area with one plane per axis through its split point.
//! Axis 0 (x) separates west from east, axis 1 (y) south from north and
//! axis 2 (z) front from back. A box lies on the upper side of an axis when
//! its lower coordinate is `>=` the split, on the lower side when its upper
//! coordinate is `<` the split, and straddles the axis otherwise.
//!
//! Zone ordinals are part of the public contract: they index child slots.
//!
//! | ordinal | quad         | oct                |
//! |---------|--------------|--------------------|
//! | 0       | `SouthWest`  | `SouthWestFront`   |
//! | 1       | `NorthEast`  | `SouthWestBack`    |
//! | 2       | `SouthEast`  | `SouthEastFront`   |
//! | 3       | `NorthWest`  | `SouthEastBack`    |
//! | 4       | `Icosep`     | `NorthWestFront`   |
//! | 5       |              | `NorthWestBack`    |
//! | 6       |              | `NorthEastFront`   |
//! | 7       |              | `NorthEastBack`    |
//! | 8       |              | `Icosep`           |

use std::fmt;
use glam::{Vec2, Vec3};

/// A box straddles the split plane of one axis.
///
/// When several axes conflict, the first one in x, y, z order is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneConflict {
    /// Zero-based axis index (0 = x, 1 = y, 2 = z)
    pub axis: usize,
}

impl ZoneConflict {
    /// Negative conflict code: -1 for x, -2 for y, -3 for z
    pub fn code(&self) -> i32 {
        -(self.axis as i32 + 1)
    }
}

impl fmt::Display for ZoneConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 3] = ["x", "y", "z"];
        write!(f, "box straddles the {} split", NAMES[self.axis])
    }
}

/// Side of a split plane occupied by `[lower, upper]`.
///
/// `Some(true)` is the upper side (east / north / back),
/// `Some(false)` the lower side, `None` a straddle.
#[inline]
fn side(split: f32, lower: f32, upper: f32) -> Option<bool> {
    debug_assert!(lower <= upper, "inverted extent {}..{}", lower, upper);
    if lower >= split {
        Some(true)
    } else if upper < split {
        Some(false)
    } else {
        None
    }
}

// ===== QUAD =====

/// Child zones of a quad node, plus the icosep pseudo-zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum QuadTreeZone {
    SouthWest = 0,
    NorthEast = 1,
    SouthEast = 2,
    NorthWest = 3,
    /// Spans a split; kept at the node itself
    Icosep = 4,
}

impl QuadTreeZone {
    /// Number of spatial zones, icosep excluded
    pub const SPATIAL_COUNT: usize = 4;

    /// All zones in ordinal order, icosep last
    pub const ALL: [QuadTreeZone; 5] = [
        QuadTreeZone::SouthWest,
        QuadTreeZone::NorthEast,
        QuadTreeZone::SouthEast,
        QuadTreeZone::NorthWest,
        QuadTreeZone::Icosep,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub fn is_icosep(self) -> bool {
        self == QuadTreeZone::Icosep
    }

    /// (east, north) sides of a spatial zone, `None` for icosep
    pub fn sides(self) -> Option<(bool, bool)> {
        match self {
            QuadTreeZone::SouthWest => Some((false, false)),
            QuadTreeZone::NorthEast => Some((true, true)),
            QuadTreeZone::SouthEast => Some((true, false)),
            QuadTreeZone::NorthWest => Some((false, true)),
            QuadTreeZone::Icosep => None,
        }
    }

    fn from_sides(east: bool, north: bool) -> Self {
        match (east, north) {
            (false, false) => QuadTreeZone::SouthWest,
            (true, true) => QuadTreeZone::NorthEast,
            (true, false) => QuadTreeZone::SouthEast,
            (false, true) => QuadTreeZone::NorthWest,
        }
    }
}

/// Zone of the box `[lower, upper]` against the quad split point, or the
/// first conflicting axis.
pub fn classify_quad_box(split: Vec2, lower: Vec2, upper: Vec2) -> Result<QuadTreeZone, ZoneConflict> {
    let east = side(split.x, lower.x, upper.x).ok_or(ZoneConflict { axis: 0 })?;
    let north = side(split.y, lower.y, upper.y).ok_or(ZoneConflict { axis: 1 })?;
    Ok(QuadTreeZone::from_sides(east, north))
}

/// Same as [`classify_quad_box`], any conflict collapsing to `Icosep`.
pub fn classify_quad_box_with_icosep(split: Vec2, lower: Vec2, upper: Vec2) -> QuadTreeZone {
    classify_quad_box(split, lower, upper).unwrap_or(QuadTreeZone::Icosep)
}

// ===== OCT =====

/// Child zones of an oct node, plus the icosep pseudo-zone.
///
/// Nesting order is south/north, then west/east, then front/back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OctTreeZone {
    SouthWestFront = 0,
    SouthWestBack = 1,
    SouthEastFront = 2,
    SouthEastBack = 3,
    NorthWestFront = 4,
    NorthWestBack = 5,
    NorthEastFront = 6,
    NorthEastBack = 7,
    /// Spans a split; kept at the node itself
    Icosep = 8,
}

impl OctTreeZone {
    /// Number of spatial zones, icosep excluded
    pub const SPATIAL_COUNT: usize = 8;

    /// All zones in ordinal order, icosep last
    pub const ALL: [OctTreeZone; 9] = [
        OctTreeZone::SouthWestFront,
        OctTreeZone::SouthWestBack,
        OctTreeZone::SouthEastFront,
        OctTreeZone::SouthEastBack,
        OctTreeZone::NorthWestFront,
        OctTreeZone::NorthWestBack,
        OctTreeZone::NorthEastFront,
        OctTreeZone::NorthEastBack,
        OctTreeZone::Icosep,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub fn is_icosep(self) -> bool {
        self == OctTreeZone::Icosep
    }

    /// (east, north, back) sides of a spatial zone, `None` for icosep
    pub fn sides(self) -> Option<(bool, bool, bool)> {
        if self.is_icosep() {
            return None;
        }
        let o = self.ordinal();
        Some((o & 2 != 0, o & 4 != 0, o & 1 != 0))
    }

    fn from_sides(east: bool, north: bool, back: bool) -> Self {
        let ordinal = (north as usize) << 2 | (east as usize) << 1 | back as usize;
        Self::ALL[ordinal]
    }
}

/// Zone of the box `[lower, upper]` against the oct split point, or the
/// first conflicting axis in x, y, z order.
pub fn classify_oct_box(split: Vec3, lower: Vec3, upper: Vec3) -> Result<OctTreeZone, ZoneConflict> {
    let east = side(split.x, lower.x, upper.x).ok_or(ZoneConflict { axis: 0 })?;
    let north = side(split.y, lower.y, upper.y).ok_or(ZoneConflict { axis: 1 })?;
    let back = side(split.z, lower.z, upper.z).ok_or(ZoneConflict { axis: 2 })?;
    Ok(OctTreeZone::from_sides(east, north, back))
}

/// Same as [`classify_oct_box`], any conflict collapsing to `Icosep`.
pub fn classify_oct_box_with_icosep(split: Vec3, lower: Vec3, upper: Vec3) -> OctTreeZone {
    classify_oct_box(split, lower, upper).unwrap_or(OctTreeZone::Icosep)
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod tests;
