//! Frustum module
//!
//! Perception volumes of situated agents. A frustum classifies boxes and
//! points against itself; the culling iterator only relies on the
//! [`Frustum`] trait, so new shapes plug in without touching the tree.

mod frustum_2d;
mod frustum_3d;

pub use frustum_2d::{CircleFrustum2d, FrontConeFrustum2d, Frustum2d};
pub use frustum_3d::{
    PyramidFrustum3d, SphereFrustum3d, Frustum3d,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};

use crate::space::Space;

/// Tolerance under which a point counts as lying on a frustum boundary
pub const BOUNDARY_EPSILON: f32 = 1e-5;

/// Relation between a frustum and a box (or a point).
///
/// For boxes:
/// - `Inside`: the box lies entirely within the frustum
/// - `Outside`: no overlap
/// - `Enclosing`: the frustum lies entirely within the box
/// - `Spanning`: partial overlap
///
/// For points, `Spanning` means "on the boundary".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntersectionType {
    Inside,
    Outside,
    Enclosing,
    Spanning,
}

impl IntersectionType {
    /// Anything but `Outside`
    pub fn is_visible(self) -> bool {
        self != IntersectionType::Outside
    }
}

/// Opaque identifier of a frustum, copied into culling results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrustumId(pub u64);

/// Perception volume of an agent.
///
/// Classification must be conservative: a box reported `Outside` never
/// overlaps the volume, and a box reported `Inside` is fully contained.
pub trait Frustum<S: Space>: Send + Sync {
    fn id(&self) -> FrustumId;

    /// Apex of the volume
    fn eye(&self) -> S::Point;

    /// Distance from the eye to the near bound (0 for omnidirectional shapes)
    fn near_distance(&self) -> f32;

    /// Distance from the eye to the far bound
    fn far_distance(&self) -> f32;

    /// Classify a point; `Spanning` on the boundary
    fn classify_point(&self, point: S::Point) -> IntersectionType;

    /// Classify a box
    fn classify_box(&self, bounds: &S::Aabb) -> IntersectionType;

    /// `true` unless the box is `Outside`
    fn intersects(&self, bounds: &S::Aabb) -> bool {
        self.classify_box(bounds).is_visible()
    }

    /// Axis-aligned box enclosing the whole volume
    fn enclosing_box(&self) -> S::Aabb;
}

/// Check the distance contract shared by every shape
pub(crate) fn assert_distances(near: f32, far: f32) {
    assert!(near.is_finite() && far.is_finite(), "non-finite frustum distances {}..{}", near, far);
    assert!(near >= 0.0, "negative near distance {}", near);
    assert!(far >= near, "far distance {} below near distance {}", far, near);
}
