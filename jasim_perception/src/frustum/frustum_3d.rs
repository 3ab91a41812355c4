/// Volumetric perception volumes for oct trees.
///
/// - `PyramidFrustum3d`: truncated view pyramid with six inward planes
/// - `SphereFrustum3d`: omnidirectional ball around the eye
///
/// Planes are stored as `Vec4 (A, B, C, D)` with a unit inward normal
/// `(A, B, C)`; a point P is inside a plane when `dot(plane, (P, 1)) >= 0`.

use glam::{Vec3, Vec4};
use crate::bounds::{Aabb3, Bounds};
use crate::space::OctSpace;
use super::{assert_distances, Frustum, FrustumId, IntersectionType, BOUNDARY_EPSILON};

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[inline]
fn plane_through(point: Vec3, normal: Vec3) -> Vec4 {
    normal.extend(-normal.dot(point))
}

#[inline]
fn plane_distance(plane: &Vec4, point: Vec3) -> f32 {
    plane.truncate().dot(point) + plane.w
}

// ===== PYRAMID =====

/// Truncated view pyramid.
///
/// Built from an eye, a view direction, an up hint, a vertical field of
/// view and an aspect ratio (width / height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PyramidFrustum3d {
    id: FrustumId,
    eye: Vec3,
    direction: Vec3,
    up: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    /// left, right, bottom, top, near, far
    planes: [Vec4; 6],
    /// Near corners then far corners
    corners: [Vec3; 8],
}

impl PyramidFrustum3d {
    /// # Panics
    ///
    /// If `direction` is zero or parallel to `up`, `fov_y` is outside
    /// `(0, PI)`, `aspect` is not positive, `near` is negative or
    /// `far < near`.
    pub fn new(
        id: FrustumId,
        eye: Vec3,
        direction: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        assert_distances(near, far);
        assert!(fov_y > 0.0 && fov_y < std::f32::consts::PI, "vertical fov {} outside (0, PI)", fov_y);
        assert!(aspect > 0.0 && aspect.is_finite(), "invalid aspect ratio {}", aspect);

        let forward = direction
            .try_normalize()
            .unwrap_or_else(|| panic!("invalid view direction {:?}", direction));
        let right = forward
            .cross(up)
            .try_normalize()
            .unwrap_or_else(|| panic!("up {:?} parallel to view direction {:?}", up, direction));
        let true_up = right.cross(forward);

        let tan_y = (fov_y * 0.5).tan();
        let tan_x = tan_y * aspect;

        // Side planes contain the eye; each normal leans toward the axis
        let mut planes = [Vec4::ZERO; 6];
        planes[PLANE_LEFT] = plane_through(eye, (right + forward * tan_x).normalize());
        planes[PLANE_RIGHT] = plane_through(eye, (-right + forward * tan_x).normalize());
        planes[PLANE_BOTTOM] = plane_through(eye, (true_up + forward * tan_y).normalize());
        planes[PLANE_TOP] = plane_through(eye, (-true_up + forward * tan_y).normalize());
        planes[PLANE_NEAR] = plane_through(eye + forward * near, forward);
        planes[PLANE_FAR] = plane_through(eye + forward * far, -forward);

        let corners = std::array::from_fn(|i| {
            let distance = if i < 4 { near } else { far };
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            eye + forward * distance
                + right * (sx * distance * tan_x)
                + true_up * (sy * distance * tan_y)
        });

        Self {
            id,
            eye,
            direction: forward,
            up,
            fov_y,
            aspect,
            near,
            far,
            planes,
            corners,
        }
    }

    /// Unit view direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Up hint the pyramid was built with
    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Planes indexed by `PLANE_LEFT` .. `PLANE_FAR`
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Near corners (indices 0..4) then far corners (4..8)
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    /// Same pyramid placed at `eye`, looking along `direction`
    pub fn moved_to(&self, eye: Vec3, direction: Vec3) -> Self {
        Self::new(self.id, eye, direction, self.up, self.fov_y, self.aspect, self.near, self.far)
    }
}

impl Frustum<OctSpace> for PyramidFrustum3d {
    fn id(&self) -> FrustumId {
        self.id
    }

    fn eye(&self) -> Vec3 {
        self.eye
    }

    fn near_distance(&self) -> f32 {
        self.near
    }

    fn far_distance(&self) -> f32 {
        self.far
    }

    fn classify_point(&self, point: Vec3) -> IntersectionType {
        let closest = self
            .planes
            .iter()
            .map(|plane| plane_distance(plane, point))
            .fold(f32::INFINITY, f32::min);
        if closest < -BOUNDARY_EPSILON {
            IntersectionType::Outside
        } else if closest <= BOUNDARY_EPSILON {
            IntersectionType::Spanning
        } else {
            IntersectionType::Inside
        }
    }

    /// p-vertex / n-vertex test against each plane, after an axis-aligned
    /// rejection against the corner box.
    fn classify_box(&self, bounds: &Aabb3) -> IntersectionType {
        if !bounds.intersects(&self.enclosing_box()) {
            return IntersectionType::Outside;
        }

        let mut all_inside = true;
        for plane in &self.planes {
            let normal = plane.truncate();

            // Positive vertex: corner most in the direction of the normal
            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { bounds.max.x } else { bounds.min.x },
                if normal.y >= 0.0 { bounds.max.y } else { bounds.min.y },
                if normal.z >= 0.0 { bounds.max.z } else { bounds.min.z },
            );
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return IntersectionType::Outside;
            }

            // Negative vertex: corner least in the direction of the normal
            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { bounds.min.x } else { bounds.max.x },
                if normal.y >= 0.0 { bounds.min.y } else { bounds.max.y },
                if normal.z >= 0.0 { bounds.min.z } else { bounds.max.z },
            );
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside {
            IntersectionType::Inside
        } else if self.corners.iter().all(|c| bounds.contains_point(*c)) {
            IntersectionType::Enclosing
        } else {
            IntersectionType::Spanning
        }
    }

    fn enclosing_box(&self) -> Aabb3 {
        let min = self.corners.iter().fold(Vec3::splat(f32::INFINITY), |acc, c| acc.min(*c));
        let max = self.corners.iter().fold(Vec3::splat(f32::NEG_INFINITY), |acc, c| acc.max(*c));
        Aabb3::new(min, max)
    }
}

// ===== SPHERE =====

/// Omnidirectional perception: everything within `radius` of the eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereFrustum3d {
    id: FrustumId,
    eye: Vec3,
    radius: f32,
}

impl SphereFrustum3d {
    /// # Panics
    ///
    /// If `radius` is negative or not finite.
    pub fn new(id: FrustumId, eye: Vec3, radius: f32) -> Self {
        assert_distances(0.0, radius);
        Self { id, eye, radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn moved_to(&self, eye: Vec3) -> Self {
        Self::new(self.id, eye, self.radius)
    }
}

impl Frustum<OctSpace> for SphereFrustum3d {
    fn id(&self) -> FrustumId {
        self.id
    }

    fn eye(&self) -> Vec3 {
        self.eye
    }

    fn near_distance(&self) -> f32 {
        0.0
    }

    fn far_distance(&self) -> f32 {
        self.radius
    }

    fn classify_point(&self, point: Vec3) -> IntersectionType {
        let distance = self.eye.distance(point);
        if distance > self.radius + BOUNDARY_EPSILON {
            IntersectionType::Outside
        } else if distance >= self.radius - BOUNDARY_EPSILON {
            IntersectionType::Spanning
        } else {
            IntersectionType::Inside
        }
    }

    fn classify_box(&self, bounds: &Aabb3) -> IntersectionType {
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

    fn enclosing_box(&self) -> Aabb3 {
        Aabb3::from_center(self.eye, self.radius)
    }
}

// ===== CLOSED SET =====

/// Every volumetric perception volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frustum3d {
    Pyramid(PyramidFrustum3d),
    Sphere(SphereFrustum3d),
}

impl Frustum3d {
    /// Same volume placed at `eye`; `direction` is ignored by spheres
    pub fn moved_to(&self, eye: Vec3, direction: Vec3) -> Self {
        match self {
            Frustum3d::Pyramid(f) => Frustum3d::Pyramid(f.moved_to(eye, direction)),
            Frustum3d::Sphere(f) => Frustum3d::Sphere(f.moved_to(eye)),
        }
    }
}

impl From<PyramidFrustum3d> for Frustum3d {
    fn from(frustum: PyramidFrustum3d) -> Self {
        Frustum3d::Pyramid(frustum)
    }
}

impl From<SphereFrustum3d> for Frustum3d {
    fn from(frustum: SphereFrustum3d) -> Self {
        Frustum3d::Sphere(frustum)
    }
}

impl Frustum<OctSpace> for Frustum3d {
    fn id(&self) -> FrustumId {
        match self {
            Frustum3d::Pyramid(f) => f.id(),
            Frustum3d::Sphere(f) => f.id(),
        }
    }

    fn eye(&self) -> Vec3 {
        match self {
            Frustum3d::Pyramid(f) => f.eye(),
            Frustum3d::Sphere(f) => f.eye(),
        }
    }

    fn near_distance(&self) -> f32 {
        match self {
            Frustum3d::Pyramid(f) => f.near_distance(),
            Frustum3d::Sphere(f) => f.near_distance(),
        }
    }

    fn far_distance(&self) -> f32 {
        match self {
            Frustum3d::Pyramid(f) => f.far_distance(),
            Frustum3d::Sphere(f) => f.far_distance(),
        }
    }

    fn classify_point(&self, point: Vec3) -> IntersectionType {
        match self {
            Frustum3d::Pyramid(f) => f.classify_point(point),
            Frustum3d::Sphere(f) => f.classify_point(point),
        }
    }

    fn classify_box(&self, bounds: &Aabb3) -> IntersectionType {
        match self {
            Frustum3d::Pyramid(f) => f.classify_box(bounds),
            Frustum3d::Sphere(f) => f.classify_box(bounds),
        }
    }

    fn enclosing_box(&self) -> Aabb3 {
        match self {
            Frustum3d::Pyramid(f) => f.enclosing_box(),
            Frustum3d::Sphere(f) => f.enclosing_box(),
        }
    }
}

#[cfg(test)]
#[path = "frustum_3d_tests.rs"]
mod tests;
