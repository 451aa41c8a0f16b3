//! Entity ↔ body bookkeeping.
//!
//! Entities are keyed by [`entity_key`], an explicit conversion of the bevy
//! [`Entity`] into a `u64`. The reverse direction is never reconstructed from
//! bits: the body → entity map stores the `Entity` itself.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Entity;
use log::warn;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};
use rustc_hash::FxHashMap;

/// Fixtures tracked per entity.
pub const MAX_FIXTURES: usize = 8;

pub type FixtureList = ArrayVec<ColliderHandle, MAX_FIXTURES>;

/// Registry key for an entity.
///
/// bevy packs the entity index in the low 32 bits and the generation in the
/// high 32 bits, so a recycled index with a new generation gets a new key.
#[inline]
pub fn entity_key(entity: Entity) -> u64 {
    entity.to_bits()
}

#[derive(Debug, Default)]
pub(crate) struct BodyRegistry {
    entity_to_body: FxHashMap<u64, RigidBodyHandle>,
    body_to_entity: FxHashMap<RigidBodyHandle, Entity>,
    fixtures: FxHashMap<u64, FixtureList>,
    /// Event resolution only. Kept in step with `fixtures`.
    collider_to_entity: FxHashMap<ColliderHandle, Entity>,
}

impl BodyRegistry {
    pub fn insert(&mut self, entity: Entity, body: RigidBodyHandle) {
        let key = entity_key(entity);
        self.entity_to_body.insert(key, body);
        self.body_to_entity.insert(body, entity);
        self.fixtures.insert(key, FixtureList::new());
    }

    /// Drop every mapping of `entity`. Returns its body and fixtures.
    pub fn remove(&mut self, entity: Entity) -> Option<(RigidBodyHandle, FixtureList)> {
        let key = entity_key(entity);
        let body = self.entity_to_body.remove(&key)?;
        self.body_to_entity.remove(&body);
        let fixtures = self.fixtures.remove(&key).unwrap_or_default();
        for collider in &fixtures {
            self.collider_to_entity.remove(collider);
        }
        Some((body, fixtures))
    }

    pub fn body(&self, entity: Entity) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity_key(entity)).copied()
    }

    pub fn entity(&self, body: RigidBodyHandle) -> Option<Entity> {
        self.body_to_entity.get(&body).copied()
    }

    pub fn collider_entity(&self, collider: ColliderHandle) -> Option<Entity> {
        self.collider_to_entity.get(&collider).copied()
    }

    pub fn fixtures(&self, entity: Entity) -> Option<&FixtureList> {
        self.fixtures.get(&entity_key(entity))
    }

    pub fn fixture_room(&self, entity: Entity) -> usize {
        self.fixtures(entity)
            .map(|list| list.remaining_capacity())
            .unwrap_or(0)
    }

    /// Track a new fixture. Returns false (and logs) when the list is full or
    /// the entity has no body.
    pub fn push_fixture(&mut self, entity: Entity, collider: ColliderHandle) -> bool {
        let Some(list) = self.fixtures.get_mut(&entity_key(entity)) else {
            return false;
        };
        if list.try_push(collider).is_err() {
            warn!(
                "Fixture list for {:?} is full ({} fixtures), dropping fixture",
                entity, MAX_FIXTURES
            );
            return false;
        }
        self.collider_to_entity.insert(collider, entity);
        true
    }

    pub fn len(&self) -> usize {
        self.entity_to_body.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.body_to_entity.values().copied()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (Entity, RigidBodyHandle)> + '_ {
        self.body_to_entity.iter().map(|(body, entity)| (*entity, *body))
    }

    /// True when the three primary maps agree about `entity`.
    #[cfg(test)]
    pub fn is_consistent(&self, entity: Entity) -> bool {
        let key = entity_key(entity);
        match self.entity_to_body.get(&key) {
            Some(body) => {
                self.body_to_entity.get(body) == Some(&entity) && self.fixtures.contains_key(&key)
            }
            None => {
                !self.fixtures.contains_key(&key) && !self.body_to_entity.values().any(|e| *e == entity)
            }
        }
    }
}
