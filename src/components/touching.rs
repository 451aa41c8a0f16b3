//! Per-entity contact set.
//!
//! [`Touching`] holds the entities currently in contact with its owner, or,
//! for sensors, currently overlapping it. It is maintained by
//! [`sync_touching`](crate::systems::touching::sync_touching) from the
//! collision and sensor events of the last physics update, and is inserted
//! automatically on any entity with a
//! [`RigidBodyConfig`](super::rigidbody::RigidBodyConfig) that starts
//! touching something.
//!
//! The set is bounded to [`MAX_TOUCHING`] entries. When full, new entries are
//! dropped with a warning rather than growing the storage.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use log::warn;

pub const MAX_TOUCHING: usize = 8;

#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct Touching {
    entities: ArrayVec<Entity, MAX_TOUCHING>,
}

impl Touching {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entity` to the set. Idempotent.
    ///
    /// Returns true only when the entity was inserted.
    pub fn add(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        if self.entities.try_push(entity).is_err() {
            warn!(
                "Touching set is full ({} entries), ignoring {:?}",
                MAX_TOUCHING, entity
            );
            return false;
        }
        true
    }

    /// Remove `entity` if present. Order of the remaining entries is not kept.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entities.iter().position(|e| *e == entity) {
            Some(index) => {
                self.entities.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.is_full()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }
}
