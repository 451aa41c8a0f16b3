//! Contact set maintenance.
//!
//! Reads the event buffers of the last
//! [`PhysicsWorld::update`](crate::resources::physicsworld::PhysicsWorld::update)
//! and mirrors them into [`Touching`] components. Both participants of an
//! event are updated, so `a` touching `b` always implies `b` touching `a` as
//! long as both carry the component.
//!
//! Events are replayed in the order the fixed steps produced them, so a pair
//! that separated and touched again inside one update ends up touching.
use bevy_ecs::prelude::*;

use crate::components::rigidbody::RigidBodyConfig;
use crate::components::touching::Touching;
use crate::events::collision::ContactEvent;
use crate::resources::physicsworld::PhysicsWorld;

/// Apply the last update's collision and sensor events to [`Touching`] sets.
///
/// An entity with a [`RigidBodyConfig`] but no `Touching` gets one inserted on
/// its first contact. Entities that were despawned in the meantime are skipped.
pub fn sync_touching(world: &mut World) {
    world.resource_scope(|world, physics: Mut<PhysicsWorld>| {
        apply_contact_events(world, physics.contact_events());
    });
}

fn apply_contact_events(world: &mut World, events: &[ContactEvent]) {
    for event in events {
        match event {
            ContactEvent::CollisionBegin(e) => link(world, e.a, e.b),
            ContactEvent::CollisionEnd(e) => unlink(world, e.a, e.b),
            ContactEvent::SensorEnter(e) => link(world, e.sensor, e.visitor),
            ContactEvent::SensorExit(e) => unlink(world, e.sensor, e.visitor),
        }
    }
}

fn link(world: &mut World, a: Entity, b: Entity) {
    add_touching(world, a, b);
    add_touching(world, b, a);
}

fn unlink(world: &mut World, a: Entity, b: Entity) {
    remove_touching(world, a, b);
    remove_touching(world, b, a);
}

fn add_touching(world: &mut World, owner: Entity, other: Entity) {
    let Ok(mut entity) = world.get_entity_mut(owner) else {
        return;
    };
    if let Some(mut touching) = entity.get_mut::<Touching>() {
        touching.add(other);
    } else if entity.contains::<RigidBodyConfig>() {
        let mut touching = Touching::new();
        touching.add(other);
        entity.insert(touching);
    }
}

fn remove_touching(world: &mut World, owner: Entity, other: Entity) {
    if let Some(mut touching) = world.get_mut::<Touching>(owner) {
        touching.remove(other);
    }
}
