/// PerceptionTree - dynamic quad/oct tree indexing situated entities.
///
/// Each entity lives in exactly one node. Descending from the root, an
/// entity follows the zone its bounding volume falls in until it reaches a
/// leaf, the depth guard, or a split plane it straddles (icosep). Straddlers
/// are kept by the node itself or by its icosep child, depending on
/// [`IcosepPolicy`].
///
/// Children are created lazily. Structural maintenance (splitting crowded
/// leaves, pruning empty nodes, recomputing enclosing volumes) is deferred
/// to [`TreeManipulator::commit`]. Between a mutation and the next commit the
/// tree is dirty and must not be queried.
///
/// The entity -> node reverse index makes removal and reordering O(1) in the
/// number of entities.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::bounds::Bounds;
use crate::config::{IcosepPolicy, TreeConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::space::Space;
use super::manipulator::{CommitStats, TreeManipulator};
use super::node::{EntityKey, NodeFlags, NodeKey, PerceptionTreeNode};

const SOURCE: &str = "jasim::PerceptionTree";

/// Where an entity is stored and the volume it was indexed with
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityRecord<A> {
    pub(crate) node: NodeKey,
    pub(crate) bounds: A,
}

/// Outcome of a read-only descent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Store in this existing node
    Existing(NodeKey),
    /// Store in the missing child `slot` of `parent`
    NewChild { parent: NodeKey, slot: usize },
}

/// Dynamic spatial index over the entities of one environment
#[derive(Debug, Clone)]
pub struct PerceptionTree<S: Space> {
    pub(crate) nodes: SlotMap<NodeKey, PerceptionTreeNode<S>>,
    pub(crate) root: NodeKey,
    /// Reverse lookup: entity -> (node, indexed volume)
    pub(crate) locations: FxHashMap<EntityKey, EntityRecord<S::Aabb>>,
    /// Nodes carrying pending flags
    pub(crate) pending: FxHashSet<NodeKey>,
    pub(crate) config: TreeConfig,
    pub(crate) dirty: bool,
    pub(crate) generation: u64,
}

impl<S: Space> PerceptionTree<S> {
    /// Create an empty tree partitioning `world_area`.
    ///
    /// Entities outside the world area are accepted; they are classified
    /// against the same split planes and simply never fit a child area.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `config` is invalid or `world_area` has a
    /// zero-size axis.
    pub fn new(world_area: S::Aabb, config: TreeConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Engine::log_and_return_error(SOURCE, e))?;
        Self::check_area(&world_area)?;

        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PerceptionTreeNode::new(world_area, None, None, 0));

        Ok(Self {
            nodes,
            root,
            locations: FxHashMap::default(),
            pending: FxHashSet::default(),
            config,
            dirty: false,
            generation: 0,
        })
    }

    fn check_area(area: &S::Aabb) -> Result<()> {
        if area.is_degenerate() {
            return Err(Engine::log_and_return_error(
                SOURCE,
                Error::InvalidConfig(format!("world area {:?} has a zero-size axis", area)),
            ));
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Partition cell of the root
    pub fn world_area(&self) -> &S::Aabb {
        &self.nodes[self.root].area
    }

    /// Enclosing volume of every indexed entity, `None` when empty
    pub fn bounds(&self) -> Option<&S::Aabb> {
        self.nodes[self.root].bounds.as_ref()
    }

    pub fn node(&self, key: NodeKey) -> Option<&PerceptionTreeNode<S>> {
        self.nodes.get(key)
    }

    /// Every node with its key, in arena order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &PerceptionTreeNode<S>)> {
        self.nodes.iter()
    }

    /// Existing children of `key` in zone-ordinal order (empty if unknown)
    pub fn children(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes
            .get(key)
            .into_iter()
            .flat_map(|node| node.children().map(|(_, child)| child))
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, entity: EntityKey) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Node currently storing `entity`
    pub fn node_for(&self, entity: EntityKey) -> Option<NodeKey> {
        self.locations.get(&entity).map(|record| record.node)
    }

    /// Volume `entity` was last indexed with
    pub fn entity_bounds(&self, entity: EntityKey) -> Option<&S::Aabb> {
        self.locations.get(&entity).map(|record| &record.bounds)
    }

    /// Every indexed entity with its volume (unordered)
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &S::Aabb)> {
        self.locations.iter().map(|(key, record)| (*key, &record.bounds))
    }

    /// Depth of the deepest node (0 for a lone root)
    pub fn depth(&self) -> u32 {
        self.nodes.values().map(|node| node.depth).max().unwrap_or(0)
    }

    /// `true` between a mutation and the next commit
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of commits that changed the tree
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a mutation phase
    pub fn manipulator(&mut self) -> TreeManipulator<'_, S> {
        TreeManipulator::new(self)
    }

    // ===== WHOLE-TREE OPERATIONS =====

    /// Replace the root area and re-home every indexed entity.
    ///
    /// The node graph is rebuilt from a single root and committed, so the
    /// tree is clean on return (pending work is folded in).
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if `world_area` has a zero-size axis; the tree
    /// is left untouched.
    pub fn replace_root(&mut self, world_area: S::Aabb) -> Result<CommitStats> {
        Self::check_area(&world_area)?;

        let records: Vec<(EntityKey, S::Aabb)> = self
            .locations
            .iter()
            .map(|(key, record)| (*key, record.bounds))
            .collect();
        self.reset(world_area);

        let root = self.root;
        for (entity, bounds) in records {
            self.attach(entity, root, bounds);
        }

        crate::jasim_info!(
            SOURCE,
            "Root replaced by {:?}, re-homing {} entities",
            world_area,
            self.locations.len()
        );
        Ok(self.manipulator().commit())
    }

    /// Drop every entity and node except a fresh root over the same area
    pub fn clear(&mut self) {
        let area = self.nodes[self.root].area;
        self.reset(area);
        self.generation += 1;
    }

    fn reset(&mut self, world_area: S::Aabb) {
        self.nodes.clear();
        self.root = self.nodes.insert(PerceptionTreeNode::new(world_area, None, None, 0));
        self.locations.clear();
        self.pending.clear();
        self.dirty = false;
    }

    /// Nodes violating a structural invariant, empty when consistent.
    ///
    /// Checked per node: the enclosing volume covers every entity and child
    /// volume stored below, every stored entity points back to the node,
    /// children point back to their parent, and no non-root node is empty.
    pub fn check_invariants(&self) -> Vec<NodeKey> {
        let mut violations = Vec::new();
        for (key, node) in &self.nodes {
            let entities_ok = node.entities.iter().all(|entity| {
                self.locations
                    .get(entity)
                    .map_or(false, |record| record.node == key && node.encloses(&record.bounds))
            });
            let children_ok = node.children().all(|(slot, child)| {
                self.nodes.get(child).map_or(false, |c| {
                    c.parent == Some(key)
                        && c.slot == Some(slot)
                        && c.bounds.map_or(false, |b| node.encloses(&b))
                })
            });
            let populated = key == self.root || !node.is_empty();
            if !(entities_ok && children_ok && populated) {
                violations.push(key);
            }
        }
        violations
    }

    // ===== INTERNAL MUTATION PRIMITIVES =====

    /// Find where `bounds` belongs without touching the tree
    pub(crate) fn locate(&self, bounds: &S::Aabb) -> Placement {
        let mut key = self.root;
        loop {
            let node = &self.nodes[key];
            if node.is_leaf() || node.is_icosep() || node.depth >= self.config.max_depth {
                return Placement::Existing(key);
            }

            let slot = S::classify_with_icosep(node.split_point(), bounds);
            if slot == S::ICOSEP_SLOT && self.config.icosep_policy == IcosepPolicy::RetainAtNode {
                return Placement::Existing(key);
            }

            match node.children[slot] {
                Some(child) => key = child,
                None => return Placement::NewChild { parent: key, slot },
            }
        }
    }

    /// Resolve a placement, creating the missing child if needed
    pub(crate) fn materialize(&mut self, placement: Placement) -> NodeKey {
        match placement {
            Placement::Existing(key) => key,
            Placement::NewChild { parent, slot } => self.create_child(parent, slot),
        }
    }

    pub(crate) fn create_child(&mut self, parent: NodeKey, slot: usize) -> NodeKey {
        let (area, depth) = {
            let p = &self.nodes[parent];
            debug_assert!(p.children[slot].is_none(), "child slot {} already used", slot);
            (S::zone_area(&p.area, slot), p.depth + 1)
        };
        let child = self
            .nodes
            .insert(PerceptionTreeNode::new(area, Some(parent), Some(slot), depth));
        self.nodes[parent].children[slot] = Some(child);
        child
    }

    /// Store `entity` in `node` and flag the node for split and refit
    pub(crate) fn attach(&mut self, entity: EntityKey, node: NodeKey, bounds: S::Aabb) {
        self.nodes[node].entities.push(entity);
        self.locations.insert(entity, EntityRecord { node, bounds });
        self.mark(node, NodeFlags::SPLIT | NodeFlags::REFIT);
    }

    /// Remove `entity` from its node; `None` if it was not indexed
    pub(crate) fn detach(&mut self, entity: EntityKey) -> Option<EntityRecord<S::Aabb>> {
        let record = self.locations.remove(&entity)?;
        let entities = &mut self.nodes[record.node].entities;
        if let Some(pos) = entities.iter().position(|&e| e == entity) {
            entities.swap_remove(pos);
        }
        self.mark(record.node, NodeFlags::MERGE | NodeFlags::REFIT);
        Some(record)
    }

    pub(crate) fn mark(&mut self, node: NodeKey, flags: NodeFlags) {
        self.nodes[node].pending |= flags;
        self.pending.insert(node);
        self.dirty = true;
    }
}

#[cfg(test)]
#[path = "perception_tree_tests.rs"]
mod tests;
