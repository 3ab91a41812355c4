/// Perception culling strategies.
///
/// A PerceptionCuller determines which entities a perceiver sees through
/// its frustum. Implementations range from brute force (test every entity)
/// to the bottom-up tree walk.

use crate::frustum::{Frustum, IntersectionType};
use crate::space::Space;
use crate::tree::{EntityKey, PerceptionTree};
use super::bottom_up::BottomUpFrustumCullingIterator;
use super::culling_result::CullingResult;

/// Strategy for determining what a perceiver sees.
///
/// `&mut self` allows stateful implementations (e.g. counters or reusable
/// buffers) to keep state across ticks.
pub trait PerceptionCuller<S: Space>: Send + Sync {
    /// Cull the tree against `frustum` on behalf of `perceiver`.
    ///
    /// The tree must be committed.
    fn cull(
        &mut self,
        tree: &PerceptionTree<S>,
        perceiver: EntityKey,
        frustum: &dyn Frustum<S>,
    ) -> Vec<CullingResult>;
}

/// Brute-force culler - classifies every indexed entity.
///
/// O(n) per perceiver. Serves as a baseline and as a reference for the
/// tree-based culler.
#[derive(Debug, Clone, Default)]
pub struct BruteForceCuller {
    exclude_self: bool,
}

impl BruteForceCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave the perceiver out of its own results
    pub fn excluding_self(mut self) -> Self {
        self.exclude_self = true;
        self
    }
}

impl<S: Space> PerceptionCuller<S> for BruteForceCuller {
    fn cull(
        &mut self,
        tree: &PerceptionTree<S>,
        perceiver: EntityKey,
        frustum: &dyn Frustum<S>,
    ) -> Vec<CullingResult> {
        tree.entities()
            .filter(|(key, _)| !(self.exclude_self && *key == perceiver))
            .filter_map(|(key, bounds)| match frustum.classify_box(bounds) {
                IntersectionType::Outside => None,
                intersection => Some(CullingResult::new(frustum.id(), key, intersection)),
            })
            .collect()
    }
}

/// Tree culler - bottom-up walk from the perceiver's node.
///
/// Perceivers that are not indexed see nothing.
#[derive(Debug, Clone, Default)]
pub struct BottomUpCuller {
    exclude_self: bool,
    last_visited: usize,
}

impl BottomUpCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave the perceiver out of its own results
    pub fn excluding_self(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    /// Nodes entered by the last `cull`
    pub fn last_visited_nodes(&self) -> usize {
        self.last_visited
    }
}

impl<S: Space> PerceptionCuller<S> for BottomUpCuller {
    fn cull(
        &mut self,
        tree: &PerceptionTree<S>,
        perceiver: EntityKey,
        frustum: &dyn Frustum<S>,
    ) -> Vec<CullingResult> {
        let mut iter = BottomUpFrustumCullingIterator::new(tree, perceiver, frustum);
        let exclude_self = self.exclude_self;
        let results: Vec<CullingResult> = iter
            .by_ref()
            .filter(|result| !(exclude_self && result.entity == perceiver))
            .collect();
        self.last_visited = iter.visited_nodes();
        results
    }
}
