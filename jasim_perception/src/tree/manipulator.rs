/// TreeManipulator - mutation phase of a perception tree.
///
/// Insertions, removals and reorders only touch entity sets (and create the
/// odd missing child). Everything structural is recorded as pending flags on
/// the touched nodes and applied in one pass by [`TreeManipulator::commit`]:
///
/// 1. **Split**: leaves holding more than `split_count` entities distribute
///    them to their zone children, cascading until every leaf fits, the
///    depth guard is reached, or nothing but straddlers remain.
/// 2. **Merge**: nodes left without entities and children are removed,
///    walking up towards the root (which is never removed).
/// 3. **Refit**: enclosing volumes are recomputed deepest first along every
///    touched path.
///
/// Batching N moves and committing once leaves the same tree as committing
/// after each move, as long as no intermediate commit would have split or
/// merged a node.

use rustc_hash::FxHashSet;
use crate::bounds::Bounds;
use crate::config::IcosepPolicy;
use crate::space::Space;
use super::entity::WorldEntity;
use super::node::{EntityKey, NodeFlags, NodeKey};
use super::perception_tree::{PerceptionTree, Placement};

const SOURCE: &str = "jasim::TreeManipulator";

/// What a commit did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Leaves split into children
    pub splits: usize,
    /// Empty nodes removed
    pub merges: usize,
    /// Enclosing volumes recomputed
    pub refits: usize,
    /// Crowded leaves left unsplit because of the depth guard
    pub depth_guard_hits: usize,
}

impl CommitStats {
    /// `true` if nodes were created or removed
    pub fn changed_structure(&self) -> bool {
        self.splits > 0 || self.merges > 0
    }
}

/// Mutable access to a tree for one mutation phase
pub struct TreeManipulator<'a, S: Space> {
    tree: &'a mut PerceptionTree<S>,
}

impl<'a, S: Space> TreeManipulator<'a, S> {
    pub(crate) fn new(tree: &'a mut PerceptionTree<S>) -> Self {
        Self { tree }
    }

    /// Read access to the tree being mutated
    pub fn tree(&self) -> &PerceptionTree<S> {
        self.tree
    }

    /// Index an entity and return the node it was stored in.
    ///
    /// An entity that is already indexed is reordered instead.
    pub fn insert<E: WorldEntity<S>>(&mut self, entity: &E) -> NodeKey {
        let key = entity.key();
        let bounds = entity.bounds();
        if let Some(node) = self.reorder(key, bounds) {
            return node;
        }

        let placement = self.tree.locate(&bounds);
        let node = self.tree.materialize(placement);
        self.tree.attach(key, node, bounds);
        node
    }

    /// Index every entity of the iterator
    pub fn insert_all<I, E>(&mut self, entities: I)
    where
        I: IntoIterator<Item = E>,
        E: WorldEntity<S>,
    {
        for entity in entities {
            self.insert(&entity);
        }
    }

    /// Drop an entity from the index.
    ///
    /// Returns `false` (and leaves the tree untouched) if it was not indexed.
    pub fn remove(&mut self, entity: EntityKey) -> bool {
        self.tree.detach(entity).is_some()
    }

    /// Update the volume of one indexed entity and re-home it if its
    /// placement changed. Returns its node, or `None` if it is not indexed.
    pub fn reorder(&mut self, entity: EntityKey, bounds: S::Aabb) -> Option<NodeKey> {
        let record = self.tree.locations.get(&entity).copied()?;
        if record.bounds == bounds {
            return Some(record.node);
        }

        let placement = self.tree.locate(&bounds);
        if placement == Placement::Existing(record.node) {
            if let Some(stored) = self.tree.locations.get_mut(&entity) {
                stored.bounds = bounds;
            }
            self.tree.mark(record.node, NodeFlags::REFIT);
            return Some(record.node);
        }

        self.tree.detach(entity);
        let node = self.tree.materialize(placement);
        self.tree.attach(entity, node, bounds);
        Some(node)
    }

    /// Re-home every entity of the iterator whose volume changed.
    ///
    /// Unknown entities are skipped. Returns how many entities changed node.
    pub fn reorder_entities<I, E>(&mut self, entities: I) -> usize
    where
        I: IntoIterator<Item = E>,
        E: WorldEntity<S>,
    {
        let mut moved = 0;
        for entity in entities {
            let key = entity.key();
            let before = self.tree.node_for(key);
            let after = self.reorder(key, entity.bounds());
            if after.is_some() && after != before {
                moved += 1;
            }
        }
        moved
    }

    /// Apply pending splits, merges and refits; the tree is clean afterwards.
    ///
    /// Committing a clean tree does nothing.
    pub fn commit(&mut self) -> CommitStats {
        let mut stats = CommitStats::default();
        if !self.tree.dirty {
            return stats;
        }

        // 1. Split crowded leaves (children created here join the work list)
        let mut work: Vec<NodeKey> = self
            .tree
            .pending
            .iter()
            .copied()
            .filter(|key| self.tree.nodes[*key].pending.contains(NodeFlags::SPLIT))
            .collect();
        while let Some(key) = work.pop() {
            self.split(key, &mut work, &mut stats);
        }

        // 2. Prune empty nodes
        let merge_seeds: Vec<NodeKey> = self
            .tree
            .pending
            .iter()
            .copied()
            .filter(|key| {
                self.tree
                    .nodes
                    .get(*key)
                    .map_or(false, |node| node.pending.contains(NodeFlags::MERGE))
            })
            .collect();
        for key in merge_seeds {
            self.prune(key, &mut stats);
        }

        // 3. Refit along touched paths
        self.refit(&mut stats);

        self.tree.dirty = false;
        self.tree.generation += 1;

        if stats.depth_guard_hits > 0 {
            crate::jasim_trace!(
                SOURCE,
                "{} crowded leaves kept at max depth {}",
                stats.depth_guard_hits,
                self.tree.config.max_depth
            );
        }
        crate::jasim_debug!(
            SOURCE,
            "Commit #{} ({}): {} splits, {} merges, {} refits, {} nodes",
            self.tree.generation,
            S::NAME,
            stats.splits,
            stats.merges,
            stats.refits,
            self.tree.nodes.len()
        );
        stats
    }

    fn split(&mut self, key: NodeKey, work: &mut Vec<NodeKey>, stats: &mut CommitStats) {
        let config = self.tree.config;
        let node = &self.tree.nodes[key];
        if !node.is_leaf() || node.is_icosep() || node.entities.len() <= config.split_count {
            return;
        }
        if node.depth >= config.max_depth {
            stats.depth_guard_hits += 1;
            return;
        }

        let split = node.split_point();
        let mut groups: Vec<Vec<EntityKey>> = vec![Vec::new(); S::SLOT_COUNT];
        for entity in &node.entities {
            let bounds = &self.tree.locations[entity].bounds;
            groups[S::classify_with_icosep(split, bounds)].push(*entity);
        }

        if groups[..S::SPATIAL_ZONES].iter().all(Vec::is_empty) {
            // Only straddlers: another level would not separate anything
            return;
        }

        let retain_straddlers = config.icosep_policy == IcosepPolicy::RetainAtNode;
        let mut kept = Vec::new();
        for (slot, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            if slot == S::ICOSEP_SLOT && retain_straddlers {
                kept = group;
                continue;
            }

            let child = self.tree.create_child(key, slot);
            for entity in &group {
                if let Some(record) = self.tree.locations.get_mut(entity) {
                    record.node = child;
                }
            }
            self.tree.nodes[child].entities = group;
            self.tree.mark(child, NodeFlags::SPLIT | NodeFlags::REFIT);
            work.push(child);
        }

        if !kept.is_empty() {
            crate::jasim_trace!(
                SOURCE,
                "{} straddlers retained at depth {}",
                kept.len(),
                self.tree.nodes[key].depth
            );
        }
        self.tree.nodes[key].entities = kept;
        self.tree.mark(key, NodeFlags::REFIT);
        stats.splits += 1;
    }

    fn prune(&mut self, key: NodeKey, stats: &mut CommitStats) {
        let mut current = key;
        loop {
            let Some(node) = self.tree.nodes.get(current) else {
                return;
            };
            if current == self.tree.root || !node.is_empty() {
                return;
            }

            let parent = node.parent;
            let slot = node.slot;
            self.tree.nodes.remove(current);
            self.tree.pending.remove(&current);
            stats.merges += 1;

            match (parent, slot) {
                (Some(parent), Some(slot)) => {
                    self.tree.nodes[parent].children[slot] = None;
                    self.tree.mark(parent, NodeFlags::REFIT);
                    current = parent;
                }
                _ => return,
            }
        }
    }

    fn refit(&mut self, stats: &mut CommitStats) {
        let seeds: Vec<NodeKey> = self.tree.pending.drain().collect();

        // Touched nodes and all their ancestors
        let mut touched: FxHashSet<NodeKey> = FxHashSet::default();
        for seed in seeds {
            let mut current = Some(seed);
            while let Some(key) = current {
                let Some(node) = self.tree.nodes.get(key) else {
                    break;
                };
                if !touched.insert(key) {
                    break;
                }
                current = node.parent;
            }
        }

        let mut order: Vec<(u32, NodeKey)> = touched
            .into_iter()
            .map(|key| (self.tree.nodes[key].depth, key))
            .collect();
        order.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (_, key) in order {
            let node = &self.tree.nodes[key];
            let entity_boxes = node
                .entities
                .iter()
                .filter_map(|entity| self.tree.locations.get(entity).map(|record| record.bounds));
            let child_boxes = node
                .children()
                .filter_map(|(_, child)| self.tree.nodes[child].bounds);
            let bounds = entity_boxes.chain(child_boxes).reduce(|a, b| a.combine(&b));

            let node = &mut self.tree.nodes[key];
            node.bounds = bounds;
            node.pending = NodeFlags::empty();
            stats.refits += 1;
        }
    }
}

#[cfg(test)]
#[path = "manipulator_tests.rs"]
mod tests;
