/// Bottom-up frustum culling.
///
/// Perception volumes are small compared to the world and centered on the
/// perceiver, so the search starts from the node storing the perceiver
/// instead of the root:
///
/// 1. Ascend until a node's enclosing volume contains the whole frustum
///    (the pivot). The root is used when no node qualifies.
/// 2. Walk the pivot subtree top-down, pruning `Outside` nodes and
///    emitting the entities of `Inside` nodes without testing them.
///
/// Content outside the pivot subtree can still reach the frustum through
/// straddlers: entities retained by the pivot's ancestors and icosep
/// subtrees hanging off them. Those are scheduled during the ascent.
/// Spatial siblings of the ascent path lie on the other side of a split
/// plane from the frustum and are skipped.

use crate::frustum::{Frustum, IntersectionType};
use crate::space::Space;
use crate::tree::{EntityKey, NodeKey, PerceptionTree};
use super::culling_result::CullingResult;

/// Pending work of the walk
#[derive(Debug, Clone, Copy)]
enum Work {
    /// Classify `node` (unless already known inside) and walk its subtree
    Subtree { node: NodeKey, inside: bool },
    /// Test the entities stored in `node`, not its children
    Entities(NodeKey),
}

/// Node whose entities are being emitted
#[derive(Debug, Clone, Copy)]
struct Cursor {
    node: NodeKey,
    inside: bool,
    next: usize,
}

/// Lazy iterator over the entities a frustum perceives.
///
/// Yields one [`CullingResult`] per entity whose volume is not `Outside`
/// the frustum, parent entities before child entities and children in zone
/// order. The tree must be committed.
pub struct BottomUpFrustumCullingIterator<'a, S: Space, F: Frustum<S> + ?Sized> {
    tree: &'a PerceptionTree<S>,
    frustum: &'a F,
    pivot: Option<NodeKey>,
    ascended: u32,
    stack: Vec<Work>,
    cursor: Option<Cursor>,
    visited: usize,
}

impl<'a, S: Space, F: Frustum<S> + ?Sized> BottomUpFrustumCullingIterator<'a, S, F> {
    /// Start culling from the node storing `origin`.
    ///
    /// An unknown origin yields nothing.
    pub fn new(tree: &'a PerceptionTree<S>, origin: EntityKey, frustum: &'a F) -> Self {
        debug_assert!(!tree.is_dirty(), "culling an uncommitted perception tree");

        let mut iter = Self {
            tree,
            frustum,
            pivot: None,
            ascended: 0,
            stack: Vec::new(),
            cursor: None,
            visited: 0,
        };
        if let Some(start) = tree.node_for(origin) {
            iter.ascend(start);
        }
        iter
    }

    /// Start culling from the root, as a top-down search would
    pub fn from_root(tree: &'a PerceptionTree<S>, frustum: &'a F) -> Self {
        debug_assert!(!tree.is_dirty(), "culling an uncommitted perception tree");

        let root = tree.root();
        Self {
            tree,
            frustum,
            pivot: Some(root),
            ascended: 0,
            stack: vec![Work::Subtree { node: root, inside: false }],
            cursor: None,
            visited: 0,
        }
    }

    /// Node the descent starts from, `None` for an unknown origin
    pub fn pivot(&self) -> Option<NodeKey> {
        self.pivot
    }

    /// Levels climbed from the origin node to the pivot
    pub fn ascended_levels(&self) -> u32 {
        self.ascended
    }

    /// Subtrees entered so far, pruned ones included
    pub fn visited_nodes(&self) -> usize {
        self.visited
    }

    fn ascend(&mut self, start: NodeKey) {
        let tree = self.tree;
        let nodes = &tree.nodes;

        let mut pivot = start;
        loop {
            let node = &nodes[pivot];
            let enclosed = node
                .bounds
                .as_ref()
                .map_or(false, |b| self.frustum.classify_box(b) == IntersectionType::Enclosing);
            if enclosed {
                break;
            }
            match node.parent {
                Some(parent) => {
                    pivot = parent;
                    self.ascended += 1;
                }
                None => break,
            }
        }
        self.pivot = Some(pivot);

        // Straddling content above the pivot, processed after the pivot subtree
        let mut child = pivot;
        while let Some(parent_key) = nodes[child].parent {
            let parent = &nodes[parent_key];
            self.stack.push(Work::Entities(parent_key));
            if nodes[child].is_icosep() {
                for sibling in parent.children.iter().rev().flatten() {
                    if *sibling != child {
                        self.stack.push(Work::Subtree { node: *sibling, inside: false });
                    }
                }
            } else if let Some(icosep) = parent.child(S::ICOSEP_SLOT) {
                self.stack.push(Work::Subtree { node: icosep, inside: false });
            }
            child = parent_key;
        }

        self.stack.push(Work::Subtree { node: pivot, inside: false });
    }
}

impl<'a, S: Space, F: Frustum<S> + ?Sized> Iterator for BottomUpFrustumCullingIterator<'a, S, F> {
    type Item = CullingResult;

    fn next(&mut self) -> Option<CullingResult> {
        loop {
            if let Some(cursor) = self.cursor.as_mut() {
                let entities = &self.tree.nodes[cursor.node].entities;
                while cursor.next < entities.len() {
                    let entity = entities[cursor.next];
                    cursor.next += 1;

                    let intersection = if cursor.inside {
                        IntersectionType::Inside
                    } else {
                        match self.tree.entity_bounds(entity) {
                            Some(bounds) => self.frustum.classify_box(bounds),
                            None => continue,
                        }
                    };
                    if intersection != IntersectionType::Outside {
                        return Some(CullingResult::new(self.frustum.id(), entity, intersection));
                    }
                }
                self.cursor = None;
            }

            match self.stack.pop()? {
                Work::Entities(node) => {
                    self.cursor = Some(Cursor { node, inside: false, next: 0 });
                }
                Work::Subtree { node, inside } => {
                    self.visited += 1;
                    let current = &self.tree.nodes[node];

                    let inside = inside || match current.bounds.as_ref() {
                        Some(bounds) => match self.frustum.classify_box(bounds) {
                            IntersectionType::Outside => continue,
                            IntersectionType::Inside => true,
                            _ => false,
                        },
                        None => continue,
                    };

                    for child in current.children.iter().rev().flatten() {
                        self.stack.push(Work::Subtree { node: *child, inside });
                    }
                    self.cursor = Some(Cursor { node, inside, next: 0 });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bottom_up_tests.rs"]
mod tests;
