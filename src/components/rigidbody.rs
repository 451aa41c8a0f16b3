//! Declarative rigid-body descriptor.
//!
//! The [`RigidBodyConfig`] component tells the physics systems that an entity
//! should be simulated, and how. It is plain data: the actual body lives in
//! the [`PhysicsWorld`](crate::resources::physicsworld::PhysicsWorld) and is
//! created by [`init_bodies`](crate::systems::physics::init_bodies) the first
//! time the entity is seen together with a position.
//!
//! The descriptor is read once, at body creation. Editing it afterwards does
//! not reconfigure the live body.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// How the simulation treats a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Never moves. Walls, floors.
    Static,
    /// Moved by game logic; pushes dynamic bodies but is not pushed back.
    Kinematic,
    /// Fully simulated.
    #[default]
    Dynamic,
}

/// Rigid-body configuration for an entity.
///
/// # Fields
/// - `body_type` - static, kinematic or dynamic
/// - `mass` - extra mass in kilograms added on top of the mass computed from
///   collider density (0.0 = density only)
/// - `gravity_scale` - multiplier applied to world gravity for this body
/// - `linear_damping` / `angular_damping` - velocity damping coefficients
/// - `fixed_rotation` - lock rotation
/// - `continuous_collision` - continuous collision detection ("bullet")
/// - `awake` - whether the body starts awake
/// - `allow_sleep` - whether the body may fall asleep when at rest
///
/// # Example
/// ```ignore
/// let rb = RigidBodyConfig::dynamic()
///     .with_linear_damping(0.5)
///     .with_fixed_rotation(true);
/// world.spawn((MapPosition::new(100.0, 50.0), rb));
/// ```
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyConfig {
    pub body_type: BodyType,
    pub mass: f32,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
    #[serde(alias = "bullet")]
    pub continuous_collision: bool,
    pub awake: bool,
    pub allow_sleep: bool,
}

impl Default for RigidBodyConfig {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 0.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            continuous_collision: false,
            awake: true,
            allow_sleep: true,
        }
    }
}

impl RigidBodyConfig {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Self::default()
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    pub fn kinematic() -> Self {
        Self::new(BodyType::Kinematic)
    }

    pub fn fixed() -> Self {
        Self::new(BodyType::Static)
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_continuous_collision(mut self, enabled: bool) -> Self {
        self.continuous_collision = enabled;
        self
    }

    pub fn with_sleep(mut self, awake: bool, allow_sleep: bool) -> Self {
        self.awake = awake;
        self.allow_sleep = allow_sleep;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }
}
