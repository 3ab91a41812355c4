use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::bounds::{Aabb2, Aabb3};
use crate::config::TreeConfig;
use crate::space::{OctSpace, QuadSpace};
use crate::zone::{OctTreeZone, QuadTreeZone};
use super::*;

fn world() -> Aabb2 {
    Aabb2::new(Vec2::ZERO, Vec2::splat(100.0))
}

fn square(x: f32, y: f32, half: f32) -> Aabb2 {
    Aabb2::from_center(Vec2::new(x, y), half)
}

fn keys(count: usize) -> Vec<EntityKey> {
    let mut arena: SlotMap<EntityKey, ()> = SlotMap::with_key();
    (0..count).map(|_| arena.insert(())).collect()
}

fn quad_tree(config: TreeConfig) -> PerceptionTree<QuadSpace> {
    PerceptionTree::new(world(), config).unwrap()
}

/// Slots from the root down to the node holding `entity`
fn path_of<S: Space>(tree: &PerceptionTree<S>, entity: EntityKey) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = tree.node_for(entity);
    while let Some(key) = current {
        let node = tree.node(key).unwrap();
        if let Some(slot) = node.slot {
            path.push(slot);
        }
        current = node.parent();
    }
    path.reverse();
    path
}

// ============================================================================
// INSERT
// ============================================================================

#[test]
fn test_insert_marks_tree_dirty_until_commit() {
    let mut tree = quad_tree(TreeConfig::default());
    let id = keys(1)[0];

    let mut m = tree.manipulator();
    let node = m.insert(&(id, square(10.0, 10.0, 1.0)));
    assert_eq!(node, m.tree().root());
    assert!(m.tree().is_dirty());
    m.commit();

    assert!(!tree.is_dirty());
    assert_eq!(tree.generation(), 1);
    assert_eq!(tree.node_for(id), Some(tree.root()));
    assert_eq!(tree.bounds(), Some(&square(10.0, 10.0, 1.0)));
}

#[test]
fn test_commit_splits_crowded_leaf() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(2));
    let ids = keys(3);
    let mut m = tree.manipulator();
    m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
    m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
    m.insert(&(ids[2], square(80.0, 10.0, 1.0)));
    let stats = m.commit();

    assert_eq!(stats.splits, 1);
    assert_eq!(stats.merges, 0);
    assert!(stats.changed_structure());
    assert_eq!(tree.node_count(), 4);
    assert_eq!(path_of(&tree, ids[0]), vec![QuadTreeZone::SouthWest.ordinal()]);
    assert_eq!(path_of(&tree, ids[1]), vec![QuadTreeZone::NorthEast.ordinal()]);
    assert_eq!(path_of(&tree, ids[2]), vec![QuadTreeZone::SouthEast.ordinal()]);
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_insert_into_internal_node_creates_child_lazily() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(1));
    let ids = keys(3);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
        m.commit();
    }
    assert_eq!(tree.node_count(), 3);

    let mut m = tree.manipulator();
    let node = m.insert(&(ids[2], square(10.0, 80.0, 1.0)));
    // created before the commit
    assert_eq!(m.tree().node_count(), 4);
    assert_eq!(m.tree().node(node).unwrap().zone(), Some(QuadTreeZone::NorthWest));
    m.commit();
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_straddler_is_retained_at_node() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(2));
    let ids = keys(4);
    let mut m = tree.manipulator();
    m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
    m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
    m.insert(&(ids[2], square(80.0, 10.0, 1.0)));
    // crosses the x split at 50
    m.insert(&(ids[3], square(50.0, 10.0, 5.0)));
    m.commit();

    let root = tree.root();
    assert_eq!(tree.node_for(ids[3]), Some(root));
    assert_eq!(tree.node(root).unwrap().entities(), &[ids[3]]);
    assert!(!tree.node(root).unwrap().is_leaf());
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_straddlers_go_to_icosep_child() {
    let config = TreeConfig::new()
        .with_split_count(2)
        .with_icosep_policy(IcosepPolicy::ChildNode);
    let mut tree = quad_tree(config);
    let ids = keys(6);
    let mut m = tree.manipulator();
    m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
    m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
    for id in &ids[2..] {
        m.insert(&(*id, square(50.0, 50.0, 3.0)));
    }
    m.commit();

    let icosep = tree.node_for(ids[2]).unwrap();
    let node = tree.node(icosep).unwrap();
    assert!(node.is_icosep());
    assert_eq!(node.zone(), Some(QuadTreeZone::Icosep));
    assert_eq!(node.area(), tree.world_area());
    // over capacity but never split
    assert_eq!(node.entities().len(), 4);
    assert!(node.is_leaf());
    assert!(tree.node(tree.root()).unwrap().entities().is_empty());

    // later straddlers follow
    let extra = keys(7)[6];
    let mut m = tree.manipulator();
    assert_eq!(m.insert(&(extra, square(50.0, 20.0, 2.0))), icosep);
    m.commit();
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_only_straddlers_are_not_split() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(2));
    let ids = keys(3);
    let mut m = tree.manipulator();
    for id in &ids {
        m.insert(&(*id, square(50.0, 50.0, 10.0)));
    }
    let stats = m.commit();
    assert_eq!(stats.splits, 0);
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn test_depth_guard_stops_cascade() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(1).with_max_depth(3));
    let ids = keys(4);
    let mut m = tree.manipulator();
    for id in &ids {
        m.insert(&(*id, square(1.0, 1.0, 0.1)));
    }
    let stats = m.commit();

    assert_eq!(stats.splits, 3);
    assert_eq!(stats.depth_guard_hits, 1);
    assert_eq!(tree.depth(), 3);
    let deepest = tree.node_for(ids[0]).unwrap();
    assert_eq!(tree.node(deepest).unwrap().entities().len(), 4);
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_oct_tree_split() {
    let area = Aabb3::new(Vec3::ZERO, Vec3::splat(100.0));
    let mut tree = PerceptionTree::<OctSpace>::new(area, TreeConfig::new().with_split_count(1)).unwrap();
    let ids = keys(2);
    let mut m = tree.manipulator();
    m.insert(&(ids[0], Aabb3::from_center(Vec3::splat(10.0), 1.0)));
    m.insert(&(ids[1], Aabb3::from_center(Vec3::new(80.0, 10.0, 80.0), 1.0)));
    m.commit();

    let a = tree.node(tree.node_for(ids[0]).unwrap()).unwrap();
    let b = tree.node(tree.node_for(ids[1]).unwrap()).unwrap();
    assert_eq!(a.zone(), Some(OctTreeZone::SouthWestFront));
    assert_eq!(b.zone(), Some(OctTreeZone::SouthEastBack));
}

// ============================================================================
// REMOVE
// ============================================================================

#[test]
fn test_remove_unknown_entity_is_a_no_op() {
    let mut tree = quad_tree(TreeConfig::default());
    let ids = keys(2);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.commit();
    }

    let mut m = tree.manipulator();
    assert!(!m.remove(ids[1]));
    assert!(!m.tree().is_dirty());
    assert_eq!(m.commit(), CommitStats::default());
    assert_eq!(tree.generation(), 1);
}

#[test]
fn test_remove_twice_is_idempotent() {
    let mut tree = quad_tree(TreeConfig::default());
    let id = keys(1)[0];
    let mut m = tree.manipulator();
    m.insert(&(id, square(10.0, 10.0, 1.0)));
    m.commit();

    assert!(m.remove(id));
    assert!(!m.remove(id));
    m.commit();

    assert!(!tree.contains(id));
    assert!(tree.is_empty());
    assert!(tree.bounds().is_none());
}

#[test]
fn test_emptied_branch_is_merged_away() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(2));
    let ids = keys(3);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.insert(&(ids[1], square(20.0, 20.0, 1.0)));
        m.insert(&(ids[2], square(30.0, 30.0, 1.0)));
        m.commit();
    }
    assert_eq!(tree.node_count(), 4);

    let mut m = tree.manipulator();
    m.remove(ids[2]);
    let stats = m.commit();
    // SW.NE is gone, SW.SW still holds two entities
    assert_eq!(stats.merges, 1);
    assert_eq!(tree.node_count(), 3);

    let mut m = tree.manipulator();
    m.remove(ids[0]);
    m.remove(ids[1]);
    let stats = m.commit();
    // leaf, then its parent: the root survives
    assert_eq!(stats.merges, 2);
    assert_eq!(tree.node_count(), 1);
    assert!(tree.check_invariants().is_empty());
}

// ============================================================================
// REORDER
// ============================================================================

#[test]
fn test_reorder_within_node_only_updates_bounds() {
    let mut tree = quad_tree(TreeConfig::default());
    let id = keys(1)[0];
    let mut m = tree.manipulator();
    m.insert(&(id, square(10.0, 10.0, 1.0)));
    m.commit();

    let moved = m.reorder_entities([(id, square(12.0, 10.0, 1.0))]);
    assert_eq!(moved, 0);
    m.commit();

    assert_eq!(tree.node_for(id), Some(tree.root()));
    assert_eq!(tree.bounds(), Some(&square(12.0, 10.0, 1.0)));
}

#[test]
fn test_reorder_moves_entity_across_leaves() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(1));
    let ids = keys(2);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
        m.commit();
    }

    let mut m = tree.manipulator();
    let moved = m.reorder_entities([(ids[0], square(80.0, 20.0, 1.0))]);
    assert_eq!(moved, 1);
    let stats = m.commit();

    // SW emptied and merged, SE created
    assert_eq!(stats.merges, 1);
    assert_eq!(path_of(&tree, ids[0]), vec![QuadTreeZone::SouthEast.ordinal()]);
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_reorder_straddler_down_into_child() {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(1));
    let ids = keys(3);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.insert(&(ids[1], square(80.0, 80.0, 1.0)));
        m.insert(&(ids[2], square(50.0, 80.0, 2.0)));
        m.commit();
    }
    assert_eq!(tree.node_for(ids[2]), Some(tree.root()));

    let mut m = tree.manipulator();
    m.reorder(ids[2], square(60.0, 60.0, 1.0));
    m.commit();
    assert_eq!(path_of(&tree, ids[2])[0], QuadTreeZone::NorthEast.ordinal());
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_reorder_unknown_entity_is_skipped() {
    let mut tree = quad_tree(TreeConfig::default());
    let id = keys(1)[0];
    let mut m = tree.manipulator();
    assert_eq!(m.reorder(id, square(1.0, 1.0, 1.0)), None);
    assert_eq!(m.reorder_entities([(id, square(1.0, 1.0, 1.0))]), 0);
    assert!(!m.tree().is_dirty());
    assert!(!m.tree().contains(id));
}

#[test]
fn test_insert_of_indexed_entity_reorders() {
    let mut tree = quad_tree(TreeConfig::default());
    let id = keys(1)[0];
    let mut m = tree.manipulator();
    m.insert(&(id, square(10.0, 10.0, 1.0)));
    m.insert(&(id, square(90.0, 90.0, 1.0)));
    m.commit();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.node(tree.root()).unwrap().entities().len(), 1);
    assert_eq!(tree.entity_bounds(id), Some(&square(90.0, 90.0, 1.0)));
}

// ============================================================================
// COMMIT BATCHING
// ============================================================================

/// Four entities per quadrant pair plus a straddler at the root
fn batching_tree() -> (PerceptionTree<QuadSpace>, Vec<EntityKey>) {
    let mut tree = quad_tree(TreeConfig::new().with_split_count(5));
    let ids = keys(9);
    {
        let mut m = tree.manipulator();
        for (i, id) in ids[..4].iter().enumerate() {
            m.insert(&(*id, square(10.0 + 8.0 * i as f32, 10.0, 1.0)));
        }
        for (i, id) in ids[4..8].iter().enumerate() {
            m.insert(&(*id, square(60.0 + 8.0 * i as f32, 80.0, 1.0)));
        }
        m.insert(&(ids[8], square(50.0, 50.0, 4.0)));
        m.commit();
    }
    (tree, ids)
}

#[test]
fn test_batched_moves_match_one_commit_per_move() {
    let (mut stepwise, ids) = batching_tree();
    let mut batched = stepwise.clone();

    // no intermediate state crosses the split count or empties a leaf
    let moves = [
        (ids[0], square(70.0, 60.0, 1.0)),
        (ids[4], square(20.0, 30.0, 1.0)),
        (ids[8], square(30.0, 40.0, 1.0)),
        (ids[1], square(50.0, 30.0, 3.0)),
        (ids[5], square(62.0, 90.0, 1.0)),
    ];

    for mv in &moves {
        let mut m = stepwise.manipulator();
        m.reorder_entities([*mv]);
        let stats = m.commit();
        assert!(!stats.changed_structure());
    }

    let mut m = batched.manipulator();
    m.reorder_entities(moves);
    m.commit();

    let shape = |tree: &PerceptionTree<QuadSpace>| -> FxHashMap<EntityKey, Vec<usize>> {
        ids.iter().map(|id| (*id, path_of(tree, *id))).collect()
    };
    assert_eq!(shape(&stepwise), shape(&batched));
    assert_eq!(stepwise.node_count(), batched.node_count());
    assert_eq!(stepwise.bounds(), batched.bounds());
    assert!(batched.check_invariants().is_empty());
}

#[test]
fn test_commit_on_clean_tree_does_nothing() {
    let (mut tree, _) = batching_tree();
    let generation = tree.generation();
    let stats = tree.manipulator().commit();
    assert_eq!(stats, CommitStats::default());
    assert_eq!(tree.generation(), generation);
}
