/// Perception tree nodes and the keys that address them.
///
/// Nodes live in a slot-map arena owned by the tree. A node knows its parent
/// and its children by key, so both downward and upward walks are O(1) per
/// step and no node holds a reference into another.

use bitflags::bitflags;
use slotmap::new_key_type;
use crate::bounds::Bounds;
use crate::space::Space;

// ===== SLOT MAP KEYS =====

new_key_type! {
    /// Stable key of a node within its tree.
    ///
    /// A key stays valid until the node is merged away at commit.
    pub struct NodeKey;
}

new_key_type! {
    /// Stable handle of a situated entity.
    ///
    /// Entities are owned by the simulation; the tree only stores handles.
    /// Simulations typically allocate them from their own
    /// `SlotMap<EntityKey, _>`.
    pub struct EntityKey;
}

// ===== PENDING WORK =====

bitflags! {
    /// Structural work recorded on a node until the next commit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Gained entities; may exceed the split count
        const SPLIT = 1 << 0;
        /// Lost entities or children; may have become empty
        const MERGE = 1 << 1;
        /// Enclosing volume is stale
        const REFIT = 1 << 2;
    }
}

// ===== NODE =====

/// One cell of a perception tree.
///
/// Two volumes are tracked per node:
/// - `area` is the partition cell. Its center is the split point and child
///   areas are derived from it. It never changes after creation.
/// - `bounds` encloses every entity stored in the node's subtree. It is
///   recomputed at commit and is what frustums are tested against.
#[derive(Debug, Clone)]
pub struct PerceptionTreeNode<S: Space> {
    pub(crate) area: S::Aabb,
    pub(crate) bounds: Option<S::Aabb>,
    pub(crate) parent: Option<NodeKey>,
    /// Slot of this node in its parent (`None` for the root)
    pub(crate) slot: Option<usize>,
    pub(crate) depth: u32,
    /// Child keys indexed by zone ordinal, icosep last
    pub(crate) children: Box<[Option<NodeKey>]>,
    pub(crate) entities: Vec<EntityKey>,
    pub(crate) pending: NodeFlags,
}

impl<S: Space> PerceptionTreeNode<S> {
    pub(crate) fn new(area: S::Aabb, parent: Option<NodeKey>, slot: Option<usize>, depth: u32) -> Self {
        Self {
            area,
            bounds: None,
            parent,
            slot,
            depth,
            children: vec![None; S::SLOT_COUNT].into_boxed_slice(),
            entities: Vec::new(),
            pending: NodeFlags::empty(),
        }
    }

    /// Partition cell of the node
    pub fn area(&self) -> &S::Aabb {
        &self.area
    }

    /// Enclosing volume of the subtree content, `None` when empty
    pub fn bounds(&self) -> Option<&S::Aabb> {
        self.bounds.as_ref()
    }

    /// Split point used to classify entities below this node
    pub fn split_point(&self) -> S::Point {
        S::split_point(&self.area)
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Zone this node occupies in its parent, `None` for the root
    pub fn zone(&self) -> Option<S::Zone> {
        self.slot.map(S::zone)
    }

    /// Distance from the root (root = 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Child in `slot`, if created
    pub fn child(&self, slot: usize) -> Option<NodeKey> {
        self.children.get(slot).copied().flatten()
    }

    /// Existing children with their slots, in zone-ordinal order
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeKey)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.map(|key| (slot, key)))
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// Entities stored directly in this node
    pub fn entities(&self) -> &[EntityKey] {
        &self.entities
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// `true` for the icosep child of a node; such nodes are never split
    pub fn is_icosep(&self) -> bool {
        self.slot == Some(S::ICOSEP_SLOT)
    }

    /// No entity here and no child below
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.is_leaf()
    }

    /// Pending structural work
    pub fn pending(&self) -> NodeFlags {
        self.pending
    }

    /// `true` if `bounds` fits inside this node's enclosing volume
    pub fn encloses(&self, bounds: &S::Aabb) -> bool {
        self.bounds.map_or(false, |b| b.encloses(bounds))
    }
}
