//! Culling module
//!
//! Answers "what does this agent perceive": the bottom-up frustum walk over
//! a committed perception tree, the culler strategies built on it, and the
//! per-entity results later passes refine with occlusion.

mod culling_result;
mod bottom_up;
mod culler;

pub use culling_result::{CullingResult, OcclusionType};
pub use bottom_up::BottomUpFrustumCullingIterator;
pub use culler::{BottomUpCuller, BruteForceCuller, PerceptionCuller};
