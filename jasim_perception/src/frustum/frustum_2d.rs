/// Planar perception volumes for quad trees.
///
/// - `CircleFrustum2d`: omnidirectional disc around the eye
/// - `FrontConeFrustum2d`: truncated view cone, a convex quadrilateral
///   bounded by a near line, a far line and two side rays

use glam::Vec2;
use crate::bounds::{Aabb2, Bounds};
use crate::space::QuadSpace;
use super::{assert_distances, Frustum, FrustumId, IntersectionType, BOUNDARY_EPSILON};

/// Half-plane `normal . p + offset >= 0`, normal pointing inward
#[derive(Debug, Clone, Copy, PartialEq)]
struct HalfPlane {
    normal: Vec2,
    offset: f32,
}

impl HalfPlane {
    fn through(point: Vec2, normal: Vec2) -> Self {
        Self { normal, offset: -normal.dot(point) }
    }

    fn distance(&self, point: Vec2) -> f32 {
        self.normal.dot(point) + self.offset
    }

    /// Corner of `bounds` furthest along the normal
    fn p_vertex(&self, bounds: &Aabb2) -> Vec2 {
        Vec2::new(
            if self.normal.x >= 0.0 { bounds.max.x } else { bounds.min.x },
            if self.normal.y >= 0.0 { bounds.max.y } else { bounds.min.y },
        )
    }

    /// Corner of `bounds` furthest against the normal
    fn n_vertex(&self, bounds: &Aabb2) -> Vec2 {
        Vec2::new(
            if self.normal.x >= 0.0 { bounds.min.x } else { bounds.max.x },
            if self.normal.y >= 0.0 { bounds.min.y } else { bounds.max.y },
        )
    }
}

// ===== CIRCLE =====

/// Omnidirectional perception: everything within `radius` of the eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleFrustum2d {
    id: FrustumId,
    eye: Vec2,
    radius: f32,
}

impl CircleFrustum2d {
    /// # Panics
    ///
    /// If `radius` is negative or not finite.
    pub fn new(id: FrustumId, eye: Vec2, radius: f32) -> Self {
        assert_distances(0.0, radius);
        Self { id, eye, radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Same perception volume centered on `eye`
    pub fn moved_to(&self, eye: Vec2) -> Self {
        Self::new(self.id, eye, self.radius)
    }
}

impl Frustum<QuadSpace> for CircleFrustum2d {
    fn id(&self) -> FrustumId {
        self.id
    }

    fn eye(&self) -> Vec2 {
        self.eye
    }

    fn near_distance(&self) -> f32 {
        0.0
    }

    fn far_distance(&self) -> f32 {
        self.radius
    }

    fn classify_point(&self, point: Vec2) -> IntersectionType {
        let distance = self.eye.distance(point);
        if distance > self.radius + BOUNDARY_EPSILON {
            IntersectionType::Outside
        } else if distance >= self.radius - BOUNDARY_EPSILON {
            IntersectionType::Spanning
        } else {
            IntersectionType::Inside
        }
    }

    fn classify_box(&self, bounds: &Aabb2) -> IntersectionType {
        let r2 = self.radius * self.radius;
        if bounds.distance_squared_to(self.eye) > r2 {
            return IntersectionType::Outside;
        }
        if bounds.corners().iter().all(|c| c.distance_squared(self.eye) <= r2) {
            return IntersectionType::Inside;
        }
        if bounds.encloses(&self.enclosing_box()) {
            return IntersectionType::Enclosing;
        }
        IntersectionType::Spanning
    }

    fn enclosing_box(&self) -> Aabb2 {
        Aabb2::from_center(self.eye, self.radius)
    }
}

// ===== FRONT CONE =====

/// Truncated view cone.
///
/// The visible region is the set of points whose distance along the view
/// direction lies in `[near, far]` and whose angle to the view direction is
/// at most `half_angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontConeFrustum2d {
    id: FrustumId,
    eye: Vec2,
    direction: Vec2,
    half_angle: f32,
    near: f32,
    far: f32,
    /// near, far, left, right
    planes: [HalfPlane; 4],
    /// near right, far right, far left, near left
    vertices: [Vec2; 4],
}

impl FrontConeFrustum2d {
    /// # Panics
    ///
    /// If `direction` is zero, `half_angle` is outside `(0, PI/2)`,
    /// `near` is negative or `far < near`.
    pub fn new(id: FrustumId, eye: Vec2, direction: Vec2, half_angle: f32, near: f32, far: f32) -> Self {
        assert_distances(near, far);
        assert!(
            half_angle > 0.0 && half_angle < std::f32::consts::FRAC_PI_2,
            "half angle {} outside (0, PI/2)",
            half_angle
        );
        let direction = direction
            .try_normalize()
            .unwrap_or_else(|| panic!("invalid view direction {:?}", direction));

        let left = Vec2::from_angle(half_angle).rotate(direction);
        let right = Vec2::from_angle(-half_angle).rotate(direction);
        let slant = 1.0 / half_angle.cos();

        let planes = [
            HalfPlane::through(eye + direction * near, direction),
            HalfPlane::through(eye + direction * far, -direction),
            HalfPlane::through(eye, Vec2::new(left.y, -left.x)),
            HalfPlane::through(eye, Vec2::new(-right.y, right.x)),
        ];
        let vertices = [
            eye + right * (near * slant),
            eye + right * (far * slant),
            eye + left * (far * slant),
            eye + left * (near * slant),
        ];

        Self { id, eye, direction, half_angle, near, far, planes, vertices }
    }

    /// Unit view direction
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn half_angle(&self) -> f32 {
        self.half_angle
    }

    /// Corners of the cone quadrilateral
    pub fn vertices(&self) -> &[Vec2; 4] {
        &self.vertices
    }

    /// Same cone placed at `eye`, looking along `direction`
    pub fn moved_to(&self, eye: Vec2, direction: Vec2) -> Self {
        Self::new(self.id, eye, direction, self.half_angle, self.near, self.far)
    }
}

impl Frustum<QuadSpace> for FrontConeFrustum2d {
    fn id(&self) -> FrustumId {
        self.id
    }

    fn eye(&self) -> Vec2 {
        self.eye
    }

    fn near_distance(&self) -> f32 {
        self.near
    }

    fn far_distance(&self) -> f32 {
        self.far
    }

    fn classify_point(&self, point: Vec2) -> IntersectionType {
        let closest = self
            .planes
            .iter()
            .map(|plane| plane.distance(point))
            .fold(f32::INFINITY, f32::min);
        if closest < -BOUNDARY_EPSILON {
            IntersectionType::Outside
        } else if closest <= BOUNDARY_EPSILON {
            IntersectionType::Spanning
        } else {
            IntersectionType::Inside
        }
    }

    fn classify_box(&self, bounds: &Aabb2) -> IntersectionType {
        // Axis-aligned separation catches boxes beside a slanted edge
        if !bounds.intersects(&self.enclosing_box()) {
            return IntersectionType::Outside;
        }

        let mut all_inside = true;
        for plane in &self.planes {
            if plane.distance(plane.p_vertex(bounds)) < 0.0 {
                return IntersectionType::Outside;
            }
            if plane.distance(plane.n_vertex(bounds)) < 0.0 {
                all_inside = false;
            }
        }

        if all_inside {
            IntersectionType::Inside
        } else if self.vertices.iter().all(|v| bounds.contains_point(*v)) {
            IntersectionType::Enclosing
        } else {
            IntersectionType::Spanning
        }
    }

    fn enclosing_box(&self) -> Aabb2 {
        let min = self.vertices.iter().fold(Vec2::splat(f32::INFINITY), |acc, v| acc.min(*v));
        let max = self.vertices.iter().fold(Vec2::splat(f32::NEG_INFINITY), |acc, v| acc.max(*v));
        Aabb2::new(min, max)
    }
}

// ===== CLOSED SET =====

/// Every planar perception volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frustum2d {
    Circle(CircleFrustum2d),
    FrontCone(FrontConeFrustum2d),
}

impl Frustum2d {
    /// Same volume placed at `eye`; `direction` is ignored by circles
    pub fn moved_to(&self, eye: Vec2, direction: Vec2) -> Self {
        match self {
            Frustum2d::Circle(f) => Frustum2d::Circle(f.moved_to(eye)),
            Frustum2d::FrontCone(f) => Frustum2d::FrontCone(f.moved_to(eye, direction)),
        }
    }
}

impl From<CircleFrustum2d> for Frustum2d {
    fn from(frustum: CircleFrustum2d) -> Self {
        Frustum2d::Circle(frustum)
    }
}

impl From<FrontConeFrustum2d> for Frustum2d {
    fn from(frustum: FrontConeFrustum2d) -> Self {
        Frustum2d::FrontCone(frustum)
    }
}

impl Frustum<QuadSpace> for Frustum2d {
    fn id(&self) -> FrustumId {
        match self {
            Frustum2d::Circle(f) => f.id(),
            Frustum2d::FrontCone(f) => f.id(),
        }
    }

    fn eye(&self) -> Vec2 {
        match self {
            Frustum2d::Circle(f) => f.eye(),
            Frustum2d::FrontCone(f) => f.eye(),
        }
    }

    fn near_distance(&self) -> f32 {
        match self {
            Frustum2d::Circle(f) => f.near_distance(),
            Frustum2d::FrontCone(f) => f.near_distance(),
        }
    }

    fn far_distance(&self) -> f32 {
        match self {
            Frustum2d::Circle(f) => f.far_distance(),
            Frustum2d::FrontCone(f) => f.far_distance(),
        }
    }

    fn classify_point(&self, point: Vec2) -> IntersectionType {
        match self {
            Frustum2d::Circle(f) => f.classify_point(point),
            Frustum2d::FrontCone(f) => f.classify_point(point),
        }
    }

    fn classify_box(&self, bounds: &Aabb2) -> IntersectionType {
        match self {
            Frustum2d::Circle(f) => f.classify_box(bounds),
            Frustum2d::FrontCone(f) => f.classify_box(bounds),
        }
    }

    fn enclosing_box(&self) -> Aabb2 {
        match self {
            Frustum2d::Circle(f) => f.enclosing_box(),
            Frustum2d::FrontCone(f) => f.enclosing_box(),
        }
    }
}

#[cfg(test)]
#[path = "frustum_2d_tests.rs"]
mod tests;
