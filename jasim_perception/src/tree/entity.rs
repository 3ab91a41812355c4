/// Situated entities as seen by the tree.

use crate::space::Space;
use super::node::EntityKey;

/// Anything that can be indexed: a stable handle and a bounding volume.
///
/// The tree copies the volume when the entity is inserted or reordered and
/// does not read it back afterwards, so the simulation is free to move its
/// entities between two mutation phases.
pub trait WorldEntity<S: Space> {
    /// Stable handle
    fn key(&self) -> EntityKey;

    /// Current bounding volume
    fn bounds(&self) -> S::Aabb;
}

impl<S: Space> WorldEntity<S> for (EntityKey, S::Aabb) {
    fn key(&self) -> EntityKey {
        self.0
    }

    fn bounds(&self) -> S::Aabb {
        self.1
    }
}

impl<S: Space, E: WorldEntity<S>> WorldEntity<S> for &E {
    fn key(&self) -> EntityKey {
        (**self).key()
    }

    fn bounds(&self) -> S::Aabb {
        (**self).bounds()
    }
}
