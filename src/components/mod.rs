//! ECS components for physics entities.
//!
//! Everything here is plain data. The physics world reads the descriptors
//! when it creates a body and the synchronization systems write results back.
//!
//! Submodules overview:
//! - [`collider`] – shapes, material and collision filter of a body
//! - [`mapposition`] – world-space position and rotation, plus the [`mapposition::PositionLike`] trait
//! - [`rigidbody`] – body type and body-level properties
//! - [`touching`] – bounded set of entities currently in contact
//! - [`velocity`] – linear and angular velocity

pub mod collider;
pub mod mapposition;
pub mod rigidbody;
pub mod touching;
pub mod velocity;
