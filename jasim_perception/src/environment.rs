/// Environment - one simulated world and its perception index.
///
/// Enforces the tick cycle the tree relies on: a mutation phase that ends
/// with a commit, then a read phase in which any number of perceivers may
/// cull the tree, possibly in parallel. The borrow checker guarantees no
/// culling iterator outlives the read phase.

use rayon::prelude::*;
use crate::config::TreeConfig;
use crate::culling::{BottomUpFrustumCullingIterator, CullingResult, PerceptionCuller};
use crate::error::Result;
use crate::frustum::Frustum;
use crate::space::Space;
use crate::tree::{CommitStats, EntityKey, PerceptionTree, TreeBuilder, TreeManipulator, WorldEntity};

const SOURCE: &str = "jasim::Environment";

/// A named world of situated entities
#[derive(Debug, Clone)]
pub struct Environment<S: Space> {
    name: String,
    tree: PerceptionTree<S>,
    tick: u64,
    last_commit: CommitStats,
}

impl<S: Space> Environment<S> {
    /// Empty environment partitioning `world_area`
    pub fn new(name: impl Into<String>, world_area: S::Aabb, config: TreeConfig) -> Result<Self> {
        let tree = PerceptionTree::new(world_area, config)?;
        Ok(Self::from_tree(name, tree))
    }

    /// Environment populated in one pass by the bulk builder
    pub fn build<E: WorldEntity<S>>(
        name: impl Into<String>,
        builder: TreeBuilder<S>,
        entities: &[E],
    ) -> Result<Self> {
        let tree = builder.build(entities)?;
        Ok(Self::from_tree(name, tree))
    }

    /// Wrap an existing tree
    pub fn from_tree(name: impl Into<String>, tree: PerceptionTree<S>) -> Self {
        let name = name.into();
        crate::jasim_info!(
            SOURCE,
            "Environment '{}' ready: {} entities over {} nodes ({})",
            name,
            tree.len(),
            tree.node_count(),
            S::NAME
        );
        Self {
            name,
            tree,
            tick: 0,
            last_commit: CommitStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Committed perception tree
    pub fn tree(&self) -> &PerceptionTree<S> {
        &self.tree
    }

    /// Mutation phases completed so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Statistics of the commit that closed the last mutation phase
    pub fn last_commit(&self) -> CommitStats {
        self.last_commit
    }

    // ===== MUTATION PHASE =====

    /// Run a mutation phase and commit it.
    ///
    /// The closure gets the tree manipulator; whatever it leaves pending is
    /// committed before this returns.
    pub fn mutate<R>(&mut self, phase: impl FnOnce(&mut TreeManipulator<'_, S>) -> R) -> R {
        let mut manipulator = self.tree.manipulator();
        let output = phase(&mut manipulator);
        self.last_commit = manipulator.commit();
        self.tick += 1;

        crate::jasim_trace!(
            SOURCE,
            "'{}' tick {}: {} entities, {} nodes, generation {}",
            self.name,
            self.tick,
            self.tree.len(),
            self.tree.node_count(),
            self.tree.generation()
        );
        output
    }

    /// Move the world area, re-homing every entity
    pub fn resize(&mut self, world_area: S::Aabb) -> Result<CommitStats> {
        self.last_commit = self.tree.replace_root(world_area)?;
        self.tick += 1;
        Ok(self.last_commit)
    }

    // ===== READ PHASE =====

    /// Entities `perceiver` sees through `frustum`.
    ///
    /// An unknown perceiver sees nothing.
    pub fn perceive<F: Frustum<S> + ?Sized>(&self, perceiver: EntityKey, frustum: &F) -> Vec<CullingResult> {
        BottomUpFrustumCullingIterator::new(&self.tree, perceiver, frustum).collect()
    }

    /// Same as [`Self::perceive`] with a caller-chosen strategy
    pub fn perceive_with<C: PerceptionCuller<S> + ?Sized>(
        &self,
        culler: &mut C,
        perceiver: EntityKey,
        frustum: &dyn Frustum<S>,
    ) -> Vec<CullingResult> {
        culler.cull(&self.tree, perceiver, frustum)
    }

    /// Read phase for many perceivers, run in parallel.
    ///
    /// Results are returned in query order.
    pub fn perceive_all<F: Frustum<S>>(&self, queries: &[(EntityKey, F)]) -> Vec<Vec<CullingResult>> {
        queries
            .par_iter()
            .map(|(perceiver, frustum)| self.perceive(*perceiver, frustum))
            .collect()
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
