/// TreeBuilder - bulk construction of a committed perception tree.
///
/// The builder grows the tree breadth first from an open list of candidate
/// nodes. A candidate holding at most `split_count` entities, an icosep
/// candidate, or a candidate at the depth guard becomes a leaf. Any other
/// candidate classifies its entities: straddlers stay on the candidate (or
/// form an icosep candidate) and every non-empty zone becomes a child
/// candidate. A candidate whose entities all straddle stays a leaf.
///
/// The result is the tree an empty tree reaches after inserting the same
/// entities and committing once, built without per-entity descents.

use std::collections::VecDeque;
use crate::bounds::Bounds;
use crate::config::{IcosepPolicy, TreeConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::space::Space;
use super::entity::WorldEntity;
use super::node::{EntityKey, NodeKey};
use super::perception_tree::{EntityRecord, PerceptionTree};

const SOURCE: &str = "jasim::TreeBuilder";

/// Candidate node with the entities it must place
struct Candidate {
    node: NodeKey,
    entities: Vec<EntityKey>,
}

/// Builds committed trees from entity lists
#[derive(Debug, Clone)]
pub struct TreeBuilder<S: Space> {
    config: TreeConfig,
    world_area: Option<S::Aabb>,
}

impl<S: Space> TreeBuilder<S> {
    /// Margin added around a flat entity union
    const FLAT_AREA_MARGIN: f32 = 1.0;

    pub fn new(config: TreeConfig) -> Self {
        Self { config, world_area: None }
    }

    /// Use a fixed root area instead of the union of the entity volumes
    pub fn with_world_area(mut self, world_area: S::Aabb) -> Self {
        self.world_area = Some(world_area);
        self
    }

    /// Build a clean tree holding every entity of `entities`.
    ///
    /// Duplicated keys keep their last volume.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyBoundingBox` if `entities` is empty and no world area
    ///   was given
    /// - `Error::InvalidConfig` if the configuration or the given world area
    ///   is unusable
    pub fn build<E: WorldEntity<S>>(&self, entities: &[E]) -> Result<PerceptionTree<S>> {
        let area = match self.world_area {
            Some(area) => area,
            None => {
                let boxes: Vec<S::Aabb> = entities.iter().map(|e| e.bounds()).collect();
                let union = <S::Aabb as Bounds>::union_all(boxes.iter())
                    .ok_or_else(|| Engine::log_and_return_error(SOURCE, Error::EmptyBoundingBox))?;
                // A lone point or aligned entities give a flat union
                if union.is_degenerate() { union.expanded(Self::FLAT_AREA_MARGIN) } else { union }
            }
        };

        let mut tree = PerceptionTree::new(area, self.config)?;
        let root = tree.root;
        for entity in entities {
            tree.locations.insert(entity.key(), EntityRecord { node: root, bounds: entity.bounds() });
        }

        let mut open: VecDeque<Candidate> = VecDeque::new();
        open.push_back(Candidate { node: root, entities: tree.locations.keys().copied().collect() });

        while let Some(candidate) = open.pop_front() {
            self.expand(&mut tree, candidate, &mut open);
        }

        // Every node is fresh: refit all of them, deepest first
        let mut order: Vec<(u32, NodeKey)> = tree.nodes.iter().map(|(key, n)| (n.depth, key)).collect();
        order.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        for (_, key) in order {
            let node = &tree.nodes[key];
            let bounds = node
                .entities
                .iter()
                .map(|entity| tree.locations[entity].bounds)
                .chain(node.children().filter_map(|(_, child)| tree.nodes[child].bounds))
                .reduce(|a, b| a.combine(&b));
            tree.nodes[key].bounds = bounds;
        }
        tree.generation = 1;

        crate::jasim_info!(
            SOURCE,
            "Built {} tree: {} entities, {} nodes, depth {}",
            S::NAME,
            tree.len(),
            tree.node_count(),
            tree.depth()
        );
        Ok(tree)
    }

    fn expand(&self, tree: &mut PerceptionTree<S>, candidate: Candidate, open: &mut VecDeque<Candidate>) {
        let Candidate { node: key, entities } = candidate;
        let node = &tree.nodes[key];
        let leaf = entities.len() <= self.config.split_count
            || node.is_icosep()
            || node.depth >= self.config.max_depth;

        let mut groups: Vec<Vec<EntityKey>> = vec![Vec::new(); S::SLOT_COUNT];
        if !leaf {
            let split = node.split_point();
            for entity in &entities {
                groups[S::classify_with_icosep(split, &tree.locations[entity].bounds)].push(*entity);
            }
        }

        if leaf || groups[..S::SPATIAL_ZONES].iter().all(Vec::is_empty) {
            tree.nodes[key].entities = entities;
            return;
        }

        let retain_straddlers = self.config.icosep_policy == IcosepPolicy::RetainAtNode;
        for (slot, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            if slot == S::ICOSEP_SLOT && retain_straddlers {
                tree.nodes[key].entities = group;
                continue;
            }

            let child = tree.create_child(key, slot);
            for entity in &group {
                if let Some(record) = tree.locations.get_mut(entity) {
                    record.node = child;
                }
            }
            open.push_back(Candidate { node: child, entities: group });
        }
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
