//! Velocity component.
//!
//! Optional companion of a dynamic body. The physics chain copies it into the
//! simulation before each update and writes the simulated value back after.
use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Externally controlled velocity, in pixels per second and radians per second.
///
/// Only needed when game logic wants to read or override the simulated
/// velocity of a dynamic body. Each frame the value is pushed into the
/// simulation before stepping and read back afterwards.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            linear: Vec2::new(x, y),
            angular: 0.0,
        }
    }

    pub fn with_angular(mut self, angular: f32) -> Self {
        self.angular = angular;
        self
    }
}
