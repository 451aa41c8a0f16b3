use bevy_ecs::prelude::Entity;

/// Errors surfaced by [`PhysicsWorld`](super::PhysicsWorld).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// A collider was attached to an entity that has no body yet.
    #[error("entity {0:?} has no physics body")]
    NoBody(Entity),

    #[error("chain shapes are not implemented")]
    ChainShapeNotImplemented,

    /// Fewer than three vertices, or no convex hull could be built.
    #[error("degenerate polygon with {vertices} vertices")]
    DegeneratePolygon { vertices: usize },

    #[error("invalid {kind} shape: {reason}")]
    InvalidShape { kind: &'static str, reason: String },

    #[error("invalid body: {0}")]
    InvalidBody(String),
}
