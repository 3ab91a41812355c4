use glam::Vec2;
use slotmap::SlotMap;
use crate::bounds::Aabb2;
use crate::culling::BruteForceCuller;
use crate::error::Error;
use crate::frustum::{CircleFrustum2d, FrontConeFrustum2d, Frustum2d, FrustumId};
use crate::space::QuadSpace;
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

/// A row of entities along y = 40, one every 10 units
fn populated() -> (Environment<QuadSpace>, Vec<EntityKey>) {
    let ids = keys(10);
    let mut env = Environment::<QuadSpace>::new("row", world(), TreeConfig::new().with_split_count(2)).unwrap();
    env.mutate(|m| {
        for (i, id) in ids.iter().enumerate() {
            m.insert(&(*id, square(5.0 + 10.0 * i as f32, 40.0, 1.0)));
        }
    });
    (env, ids)
}

#[test]
fn test_new_rejects_flat_world() {
    let flat = Aabb2::new(Vec2::ZERO, Vec2::new(100.0, 0.0));
    let result = Environment::<QuadSpace>::new("flat", flat, TreeConfig::default());
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_mutate_commits_and_ticks() {
    let (env, ids) = populated();
    assert_eq!(env.name(), "row");
    assert_eq!(env.tick(), 1);
    assert!(!env.tree().is_dirty());
    assert_eq!(env.tree().len(), ids.len());
    assert!(env.last_commit().splits > 0);
    assert!(env.tree().check_invariants().is_empty());
}

#[test]
fn test_mutate_returns_closure_output() {
    let (mut env, ids) = populated();
    let removed = env.mutate(|m| m.remove(ids[0]) && !m.remove(ids[0]));
    assert!(removed);
    assert_eq!(env.tick(), 2);
    assert!(!env.tree().contains(ids[0]));
}

#[test]
fn test_perceive_sees_neighbors() {
    let (env, ids) = populated();
    let circle = CircleFrustum2d::new(FrustumId(1), Vec2::new(45.0, 40.0), 12.0);
    let seen: Vec<EntityKey> = env.perceive(ids[4], &circle).iter().map(|r| r.entity).collect();
    assert_eq!(seen.len(), 3);
    for neighbor in &ids[3..6] {
        assert!(seen.contains(neighbor));
    }
}

#[test]
fn test_perceive_unknown_entity_sees_nothing() {
    let (env, _) = populated();
    let stranger = keys(50)[49];
    let circle = CircleFrustum2d::new(FrustumId(1), Vec2::new(45.0, 40.0), 100.0);
    assert!(env.perceive(stranger, &circle).is_empty());
}

#[test]
fn test_perceive_with_custom_culler() {
    let (env, ids) = populated();
    let circle = CircleFrustum2d::new(FrustumId(1), Vec2::new(45.0, 40.0), 12.0);
    let mut culler = BruteForceCuller::new().excluding_self();
    let seen = env.perceive_with(&mut culler, ids[4], &circle);
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|r| r.entity != ids[4]));
}

#[test]
fn test_perceive_all_keeps_query_order() {
    let (env, ids) = populated();
    let queries: Vec<(EntityKey, Frustum2d)> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let eye = Vec2::new(5.0 + 10.0 * i as f32, 40.0);
            let cone = FrontConeFrustum2d::new(FrustumId(i as u64), eye, Vec2::X, 0.5, 0.0, 12.0);
            (*id, Frustum2d::from(cone))
        })
        .collect();

    let all = env.perceive_all(&queries);
    assert_eq!(all.len(), queries.len());
    for (i, results) in all.iter().enumerate() {
        assert!(results.iter().all(|r| r.frustum == FrustumId(i as u64)));
        assert_eq!(*results, env.perceive(queries[i].0, &queries[i].1));
    }
    // the last one looks past the end of the row
    assert_eq!(all[9].len(), 1);
}

#[test]
fn test_resize_rehomes_everything() {
    let (mut env, ids) = populated();
    let bigger = Aabb2::new(Vec2::splat(-100.0), Vec2::splat(200.0));
    env.resize(bigger).unwrap();
    assert_eq!(*env.tree().world_area(), bigger);
    assert_eq!(env.tree().len(), ids.len());
    assert_eq!(env.tick(), 2);
    assert!(env.tree().check_invariants().is_empty());
}

#[test]
fn test_build_from_entities() {
    let ids = keys(4);
    let entities: Vec<(EntityKey, Aabb2)> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, square(10.0 * i as f32, 0.0, 1.0)))
        .collect();
    let env = Environment::build("built", TreeBuilder::<QuadSpace>::new(TreeConfig::default()), &entities).unwrap();
    assert_eq!(env.tick(), 0);
    assert_eq!(env.tree().len(), 4);
    assert!(!env.tree().is_dirty());
}
