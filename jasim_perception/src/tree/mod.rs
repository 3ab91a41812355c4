//! Perception tree module
//!
//! Dynamic quad/oct tree over situated entities: node arena, mutation
//! protocol with deferred commit, and bulk construction.

mod node;
mod entity;
mod perception_tree;
mod manipulator;
mod builder;

pub use node::{EntityKey, NodeFlags, NodeKey, PerceptionTreeNode};
pub use entity::WorldEntity;
pub use perception_tree::PerceptionTree;
pub use manipulator::{CommitStats, TreeManipulator};
pub use builder::TreeBuilder;

/// Quad tree over 2D entities
pub type QuadPerceptionTree = PerceptionTree<crate::space::QuadSpace>;

/// Oct tree over 3D entities
pub type OctPerceptionTree = PerceptionTree<crate::space::OctSpace>;
