//! Collision and sensor event records produced by the physics world.
//!
//! Each [`PhysicsWorld::update`](crate::resources::physicsworld::PhysicsWorld::update)
//! clears the buffers and then fills them with the events of every fixed step
//! it runs. They stay readable until the next `update` call:
//!
//! - [`PhysicsWorld::collision_begin_events`](crate::resources::physicsworld::PhysicsWorld::collision_begin_events)
//! - [`PhysicsWorld::collision_end_events`](crate::resources::physicsworld::PhysicsWorld::collision_end_events)
//! - [`PhysicsWorld::sensor_enter_events`](crate::resources::physicsworld::PhysicsWorld::sensor_enter_events)
//! - [`PhysicsWorld::sensor_exit_events`](crate::resources::physicsworld::PhysicsWorld::sensor_exit_events)
//!
//! [`PhysicsWorld::contact_events`](crate::resources::physicsworld::PhysicsWorld::contact_events)
//! holds the same events as one list in the order they happened.
//! [`sync_touching`](crate::systems::touching::sync_touching) replays it into
//! [`Touching`](crate::components::touching::Touching) sets.
use bevy_ecs::prelude::*;
use glam::Vec2;

/// Two solid fixtures started or stopped touching.
///
/// No ordering guarantee between `a` and `b`. For end events the contact data
/// is usually empty (zero point, normal and impulse) because the contact no
/// longer exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: Entity,
    pub b: Entity,
    /// World-space contact point in pixels.
    pub point: Vec2,
    /// Unit contact normal pointing from `a` towards `b`.
    pub normal: Vec2,
    /// Total normal impulse of the contact at the time of the event.
    pub impulse: f32,
}

impl CollisionEvent {
    /// The participant that is not `entity`, if `entity` is one of them.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A fixture started or stopped overlapping a sensor fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub sensor: Entity,
    pub visitor: Entity,
}

/// One entry of the chronological event log of an update.
///
/// The per-kind lists lose the relative order of begin and end events across
/// fixed steps. Contact sets are rebuilt by replaying this log instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    CollisionBegin(CollisionEvent),
    CollisionEnd(CollisionEvent),
    SensorEnter(SensorEvent),
    SensorExit(SensorEvent),
}
