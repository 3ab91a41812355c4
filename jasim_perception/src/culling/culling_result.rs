/// Culling results - one record per perceived entity.

use crate::frustum::{FrustumId, IntersectionType};
use crate::tree::EntityKey;

/// How much of a perceived entity is hidden by others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OcclusionType {
    /// Fully visible
    #[default]
    NoOcclusion,
    /// Partly hidden
    PartialOcclusion,
    /// Hidden, though inside the frustum
    TotalOcclusion,
}

/// An entity seen through a frustum.
///
/// The culling pass fills `frustum`, `entity` and `intersection`. Occlusion
/// starts as `NoOcclusion` and is refined by later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CullingResult {
    pub frustum: FrustumId,
    pub entity: EntityKey,
    pub intersection: IntersectionType,
    pub occlusion: OcclusionType,
}

impl CullingResult {
    pub fn new(frustum: FrustumId, entity: EntityKey, intersection: IntersectionType) -> Self {
        Self {
            frustum,
            entity,
            intersection,
            occlusion: OcclusionType::NoOcclusion,
        }
    }

    /// Record the outcome of an occlusion pass
    pub fn set_occlusion(&mut self, occlusion: OcclusionType) {
        self.occlusion = occlusion;
    }

    /// Same result with a different occlusion
    pub fn with_occlusion(mut self, occlusion: OcclusionType) -> Self {
        self.occlusion = occlusion;
        self
    }

    /// In the frustum and not totally occluded
    pub fn is_visible(&self) -> bool {
        self.intersection.is_visible() && self.occlusion != OcclusionType::TotalOcclusion
    }
}
