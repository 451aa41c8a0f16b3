//! World-space pose of an entity and the trait the physics systems use to
//! read and write it.
//!
//! The synchronization systems never name [`MapPosition`] directly. They are
//! generic over [`PositionLike`], so a host application can keep its own
//! position component and implement the trait for it.

use bevy_ecs::component::{Component, Mutable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position-like component the physics systems can sync against.
///
/// Coordinates are in pixels, rotation in radians.
pub trait PositionLike: Component<Mutability = Mutable> {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn rotation(&self) -> f32;
    /// Overwrite the whole pose.
    fn set_transform(&mut self, x: f32, y: f32, rotation: f32);

    fn position(&self) -> Vec2 {
        Vec2::new(self.x(), self.y())
    }
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub x: f32,
    pub y: f32,
    /// Radians, clockwise on a y-down screen.
    #[serde(default)]
    pub rotation: f32,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, rotation: 0.0 }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

impl PositionLike for MapPosition {
    fn x(&self) -> f32 {
        self.x
    }
    fn y(&self) -> f32 {
        self.y
    }
    fn rotation(&self) -> f32 {
        self.rotation
    }
    fn set_transform(&mut self, x: f32, y: f32, rotation: f32) {
        self.x = x;
        self.y = y;
        self.rotation = rotation;
    }
}
