//! Aberred Physics library.
//!
//! Rigid-body simulation for bevy_ecs worlds, backed by rapier2d. Entities
//! describe their bodies with plain components; the
//! [`PhysicsWorld`](resources::physicsworld::PhysicsWorld) resource owns the
//! simulation and the systems in [`systems::physics`] keep both sides in sync.
//!
//! ```ignore
//! let mut world = World::new();
//! world.insert_resource(WorldTime::default());
//! world.insert_resource(PhysicsWorld::default());
//! let mut schedule = Schedule::default();
//! add_physics_systems::<MapPosition>(&mut schedule);
//!
//! loop {
//!     update_world_time(&mut world, dt);
//!     schedule.run(&mut world);
//! }
//! ```

pub mod components;
pub mod events;
pub mod resources;
pub mod systems;
