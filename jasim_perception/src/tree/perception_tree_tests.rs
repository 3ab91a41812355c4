use glam::Vec2;
use slotmap::SlotMap;
use crate::bounds::Aabb2;
use crate::space::QuadSpace;
use crate::zone::QuadTreeZone;
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

fn tree(split_count: usize) -> PerceptionTree<QuadSpace> {
    PerceptionTree::new(world(), TreeConfig::new().with_split_count(split_count)).unwrap()
}

/// Three entities in the south-west quadrant, split count 2
fn crowded_south_west() -> (PerceptionTree<QuadSpace>, Vec<EntityKey>) {
    let mut tree = tree(2);
    let ids = keys(3);
    {
        let mut m = tree.manipulator();
        m.insert(&(ids[0], square(10.0, 10.0, 1.0)));
        m.insert(&(ids[1], square(20.0, 20.0, 1.0)));
        m.insert(&(ids[2], square(30.0, 30.0, 1.0)));
        m.commit();
    }
    (tree, ids)
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_tree_is_a_lone_clean_root() {
    let tree = tree(8);
    assert_eq!(tree.node_count(), 1);
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert!(!tree.is_dirty());
    assert_eq!(tree.generation(), 0);
    assert_eq!(tree.depth(), 0);
    assert_eq!(*tree.world_area(), world());
    assert!(tree.bounds().is_none());

    let root = tree.node(tree.root()).unwrap();
    assert!(root.is_leaf());
    assert!(root.zone().is_none());
    assert_eq!(root.split_point(), Vec2::splat(50.0));
}

#[test]
fn test_new_rejects_flat_world_area() {
    let flat = Aabb2::new(Vec2::ZERO, Vec2::new(100.0, 0.0));
    let result = PerceptionTree::<QuadSpace>::new(flat, TreeConfig::default());
    assert!(matches!(result, Err(Error::InvalidConfig(msg)) if msg.contains("zero-size")));
}

#[test]
fn test_new_rejects_invalid_config() {
    let result = PerceptionTree::<QuadSpace>::new(world(), TreeConfig::new().with_split_count(0));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_queries_after_split() {
    let (tree, ids) = crowded_south_west();

    // root -> SW -> {SW, NE}
    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.len(), 3);

    let root = tree.root();
    let south_west: Vec<NodeKey> = tree.children(root).collect();
    assert_eq!(south_west.len(), 1);
    assert_eq!(tree.node(south_west[0]).unwrap().zone(), Some(QuadTreeZone::SouthWest));
    assert_eq!(tree.parent(south_west[0]), Some(root));
    assert_eq!(tree.parent(root), None);

    let deep = tree.node_for(ids[0]).unwrap();
    assert_eq!(tree.node_for(ids[1]), Some(deep));
    assert_eq!(tree.node(deep).unwrap().zone(), Some(QuadTreeZone::SouthWest));
    assert_eq!(tree.node(deep).unwrap().depth(), 2);

    let ne = tree.node_for(ids[2]).unwrap();
    assert_eq!(tree.node(ne).unwrap().zone(), Some(QuadTreeZone::NorthEast));
    assert_eq!(tree.parent(ne), Some(south_west[0]));

    assert_eq!(tree.entity_bounds(ids[2]), Some(&square(30.0, 30.0, 1.0)));
    assert!(tree.contains(ids[1]));
}

#[test]
fn test_unknown_entity_lookups_are_absent() {
    let (tree, _) = crowded_south_west();
    let stranger = keys(4)[3];
    assert!(!tree.contains(stranger));
    assert_eq!(tree.node_for(stranger), None);
    assert_eq!(tree.entity_bounds(stranger), None);
}

#[test]
fn test_root_bounds_enclose_all_entities() {
    let (tree, _) = crowded_south_west();
    let bounds = tree.bounds().unwrap();
    assert_eq!(bounds.min, Vec2::splat(9.0));
    assert_eq!(bounds.max, Vec2::splat(31.0));
}

#[test]
fn test_entities_iterator_lists_every_entity() {
    let (tree, ids) = crowded_south_west();
    let mut listed: Vec<EntityKey> = tree.entities().map(|(key, _)| key).collect();
    listed.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(listed, expected);
}

// ============================================================================
// INVARIANTS
// ============================================================================

#[test]
fn test_committed_tree_has_no_violations() {
    let (tree, _) = crowded_south_west();
    assert!(tree.check_invariants().is_empty());
}

#[test]
fn test_check_invariants_reports_stale_bounds() {
    let (mut tree, ids) = crowded_south_west();
    let node = tree.node_for(ids[2]).unwrap();
    tree.nodes[node].bounds = Some(square(0.0, 0.0, 0.5));

    let violations = tree.check_invariants();
    assert!(violations.contains(&node));
}

// ============================================================================
// WHOLE-TREE OPERATIONS
// ============================================================================

#[test]
fn test_replace_root_rehomes_entities() {
    let (mut tree, ids) = crowded_south_west();
    let generation = tree.generation();

    let bigger = Aabb2::new(Vec2::ZERO, Vec2::splat(400.0));
    let stats = tree.replace_root(bigger).unwrap();

    assert!(stats.splits > 0);
    assert_eq!(*tree.world_area(), bigger);
    assert_eq!(tree.len(), 3);
    assert!(!tree.is_dirty());
    assert!(tree.generation() > generation);
    assert!(tree.check_invariants().is_empty());
    for id in &ids {
        assert!(tree.node_for(*id).is_some());
    }
}

#[test]
fn test_replace_root_rejects_flat_area_and_keeps_tree() {
    let (mut tree, ids) = crowded_south_west();
    let before = tree.node_for(ids[0]);
    let flat = Aabb2::new(Vec2::ZERO, Vec2::new(0.0, 10.0));
    assert!(tree.replace_root(flat).is_err());
    assert_eq!(tree.node_for(ids[0]), before);
    assert_eq!(*tree.world_area(), world());
}

#[test]
fn test_clear_keeps_world_area() {
    let (mut tree, ids) = crowded_south_west();
    tree.clear();
    assert_eq!(tree.node_count(), 1);
    assert!(tree.is_empty());
    assert!(!tree.contains(ids[0]));
    assert_eq!(*tree.world_area(), world());
    assert!(!tree.is_dirty());
}

// ============================================================================
// DESCENT
// ============================================================================

#[test]
fn test_locate_reports_missing_child() {
    let (tree, _) = crowded_south_west();
    let placement = tree.locate(&square(80.0, 80.0, 1.0));
    assert_eq!(
        placement,
        Placement::NewChild { parent: tree.root(), slot: QuadTreeZone::NorthEast.ordinal() }
    );
}

#[test]
fn test_locate_keeps_straddler_at_node() {
    let (tree, _) = crowded_south_west();
    let placement = tree.locate(&square(50.0, 10.0, 2.0));
    assert_eq!(placement, Placement::Existing(tree.root()));
}
