//! Physics synchronization systems.
//!
//! These systems keep the [`PhysicsWorld`] resource and the ECS components in
//! step. They are generic over the position component through
//! [`PositionLike`], so the same chain works with [`MapPosition`] or any
//! host-defined position type.
//!
//! Per-frame order, as registered by [`add_physics_systems`]:
//!
//! 1. [`init_bodies`] – create bodies for newly described entities
//! 2. [`cleanup_bodies`] – destroy bodies whose entity is gone
//! 3. [`sync_kinematic_to_physics`] – push kinematic poses
//! 4. [`sync_velocity_to_physics`] – push externally set velocities
//! 5. [`physics_step`] – advance the simulation by the frame delta
//! 6. [`sync_transform_from_physics`] – pull simulated poses
//! 7. [`sync_velocity_from_physics`] – pull simulated velocities
//! 8. [`sync_touching`] – update [`Touching`](crate::components::touching::Touching) sets
//!
//! [`update_world_time`](crate::systems::time::update_world_time) is expected
//! to run before the chain, since it takes the raw frame delta.
//!
//! [`MapPosition`]: crate::components::mapposition::MapPosition

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, error};

use crate::components::collider::ColliderConfig;
use crate::components::mapposition::PositionLike;
use crate::components::rigidbody::{BodyType, RigidBodyConfig};
use crate::components::velocity::Velocity;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::worldtime::WorldTime;
use crate::systems::touching::sync_touching;

/// Velocities closer than this (px/s, rad/s) are treated as unchanged, so that
/// resting bodies are not woken by their own read-back.
const VELOCITY_EPSILON: f32 = 1e-3;

/// Register the physics chain on `schedule`.
pub fn add_physics_systems<P: PositionLike>(schedule: &mut Schedule) {
    schedule.add_systems(
        (
            init_bodies::<P>,
            cleanup_bodies,
            sync_kinematic_to_physics::<P>,
            sync_velocity_to_physics,
            physics_step,
            sync_transform_from_physics::<P>,
            sync_velocity_from_physics,
            sync_touching,
        )
            .chain(),
    );
}

/// Create a body for every entity with a [`RigidBodyConfig`] and a position
/// that has none yet, and attach its [`ColliderConfig`] when present.
///
/// Errors are logged per entity; the rest of the batch is still processed.
/// A body whose collider fails to convert is kept without fixtures.
pub fn init_bodies<P: PositionLike>(
    mut physics: ResMut<PhysicsWorld>,
    query: Query<(Entity, &RigidBodyConfig, &P, Option<&ColliderConfig>)>,
) {
    for (entity, config, position, collider) in query.iter() {
        if physics.has_body(entity) {
            continue;
        }
        if let Err(err) = physics.create_body(entity, config, position.position(), position.rotation()) {
            error!("Failed to create body for {:?}: {}", entity, err);
            continue;
        }
        let Some(collider) = collider else {
            continue;
        };
        match physics.add_collider(entity, collider) {
            Ok(count) => debug!("Attached {} fixtures to {:?}", count, entity),
            Err(err) => error!("Failed to attach collider to {:?}: {}", entity, err),
        }
    }
}

/// Destroy bodies whose entity was despawned or lost its [`RigidBodyConfig`].
pub fn cleanup_bodies(mut physics: ResMut<PhysicsWorld>, described: Query<(), With<RigidBodyConfig>>) {
    let orphans: Vec<Entity> = physics
        .entities()
        .filter(|entity| !described.contains(*entity))
        .collect();
    for entity in orphans {
        physics.destroy_body(entity);
    }
}

/// Kinematic bodies follow their position component.
pub fn sync_kinematic_to_physics<P: PositionLike>(mut physics: ResMut<PhysicsWorld>, query: Query<(Entity, &P)>) {
    for (entity, position) in query.iter() {
        if physics.body_type(entity) == Some(BodyType::Kinematic) {
            physics.set_transform(entity, position.position(), position.rotation());
        }
    }
}

/// Dynamic bodies take the [`Velocity`] component when game code changed it.
pub fn sync_velocity_to_physics(mut physics: ResMut<PhysicsWorld>, query: Query<(Entity, &Velocity)>) {
    for (entity, velocity) in query.iter() {
        if physics.body_type(entity) != Some(BodyType::Dynamic) {
            continue;
        }
        let linear_changed = physics
            .linear_velocity(entity)
            .is_some_and(|current| !current.abs_diff_eq(velocity.linear, VELOCITY_EPSILON));
        if linear_changed {
            physics.set_linear_velocity(entity, velocity.linear);
        }
        let angular_changed = physics
            .angular_velocity(entity)
            .is_some_and(|current| (current - velocity.angular).abs() > VELOCITY_EPSILON);
        if angular_changed {
            physics.set_angular_velocity(entity, velocity.angular);
        }
    }
}

/// Advance the simulation by the scaled frame delta.
pub fn physics_step(mut physics: ResMut<PhysicsWorld>, time: Res<WorldTime>) {
    physics.update(time.delta);
}

/// Write simulated poses of dynamic bodies back into the position component.
///
/// Only poses that actually moved are written, so change detection on `P`
/// stays quiet for resting bodies.
pub fn sync_transform_from_physics<P: PositionLike>(physics: Res<PhysicsWorld>, mut query: Query<(Entity, &mut P)>) {
    for (entity, mut position) in query.iter_mut() {
        if physics.body_type(entity) != Some(BodyType::Dynamic) {
            continue;
        }
        let (Some(pos), Some(angle)) = (physics.position(entity), physics.angle(entity)) else {
            continue;
        };
        if pos != position.position() || angle != position.rotation() {
            position.set_transform(pos.x, pos.y, angle);
        }
    }
}

/// Write simulated velocities of dynamic bodies into [`Velocity`].
pub fn sync_velocity_from_physics(physics: Res<PhysicsWorld>, mut query: Query<(Entity, &mut Velocity)>) {
    for (entity, mut velocity) in query.iter_mut() {
        if physics.body_type(entity) != Some(BodyType::Dynamic) {
            continue;
        }
        let linear = physics.linear_velocity(entity).unwrap_or(Vec2::ZERO);
        let angular = physics.angular_velocity(entity).unwrap_or(0.0);
        velocity.set_if_neq(Velocity { linear, angular });
    }
}
