//! Collision shapes and material properties.
//!
//! A [`ColliderConfig`] holds either a single [`ShapeEntry`], a compound list
//! of up to [`MAX_COMPOUND_SHAPES`] entries, or both. Every consumer (body
//! setup, debug overlays) walks them through [`ColliderConfig::shapes`], which
//! yields the single shape first and then the compound entries.
//!
//! All lengths are in pixels and all angles in radians. Conversion to the
//! simulation's units happens inside the physics world.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Component;
use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Maximum number of vertices in a [`Shape::Polygon`].
pub const MAX_POLYGON_VERTICES: usize = 8;
/// Maximum number of entries in a compound collider.
pub const MAX_COMPOUND_SHAPES: usize = 8;

/// Geometric shape in local space, centered on the shape entry's offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Axis-aligned (before the entry angle) rectangle.
    Box { width: f32, height: f32 },
    Circle { radius: f32 },
    /// Convex polygon, counter-clockwise vertices.
    Polygon {
        vertices: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
    },
    /// Two-sided line segment.
    Edge { start: Vec2, end: Vec2 },
    /// Polyline. Not supported by the physics world yet.
    Chain {
        vertices: Vec<Vec2>,
        #[serde(default)]
        looped: bool,
    },
}

impl Shape {
    pub fn box_shape(width: f32, height: f32) -> Self {
        Shape::Box { width, height }
    }

    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    /// Returns `None` when more than [`MAX_POLYGON_VERTICES`] vertices are given.
    pub fn polygon(vertices: &[Vec2]) -> Option<Self> {
        let vertices = ArrayVec::try_from(vertices).ok()?;
        Some(Shape::Polygon { vertices })
    }

    pub fn edge(start: Vec2, end: Vec2) -> Self {
        Shape::Edge { start, end }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "box",
            Shape::Circle { .. } => "circle",
            Shape::Polygon { .. } => "polygon",
            Shape::Edge { .. } => "edge",
            Shape::Chain { .. } => "chain",
        }
    }
}

/// A shape placed relative to the body origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    pub shape: Shape,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub angle: f32,
}

impl ShapeEntry {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            angle: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }
}

impl From<Shape> for ShapeEntry {
    fn from(shape: Shape) -> Self {
        ShapeEntry::new(shape)
    }
}

/// Category/mask/group filter, Box2D style.
///
/// Two fixtures with the same non-zero `group_index` always collide when the
/// group is positive and never collide when it is negative. Otherwise they
/// collide when each one's category is in the other's mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionFilter {
    pub category_bits: u32,
    pub mask_bits: u32,
    pub group_index: i32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: u32::MAX,
            group_index: 0,
        }
    }
}

impl CollisionFilter {
    pub fn should_collide(&self, other: &CollisionFilter) -> bool {
        if self.group_index == other.group_index && self.group_index != 0 {
            return self.group_index > 0;
        }
        (self.mask_bits & other.category_bits) != 0 && (other.mask_bits & self.category_bits) != 0
    }
}

/// Collider descriptor: shapes plus material.
///
/// # Example
/// ```ignore
/// let collider = ColliderConfig::single(Shape::circle(10.0))
///     .with_restitution(0.5)
///     .with_friction(0.1);
/// world.spawn((MapPosition::new(0.0, 0.0), RigidBodyConfig::dynamic(), collider));
/// ```
#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderConfig {
    pub shape: Option<ShapeEntry>,
    pub compound: ArrayVec<ShapeEntry, MAX_COMPOUND_SHAPES>,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Closing speed in pixels per second below which restitution is ignored.
    pub restitution_threshold: f32,
    pub is_sensor: bool,
    pub filter: CollisionFilter,
}

impl Default for ColliderConfig {
    fn default() -> Self {
        Self {
            shape: None,
            compound: ArrayVec::new(),
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
            restitution_threshold: 0.0,
            is_sensor: false,
            filter: CollisionFilter::default(),
        }
    }
}

impl ColliderConfig {
    /// Collider with one shape at the body origin.
    pub fn single(shape: impl Into<ShapeEntry>) -> Self {
        Self {
            shape: Some(shape.into()),
            ..Self::default()
        }
    }

    /// Collider built from several placed shapes. Entries past
    /// [`MAX_COMPOUND_SHAPES`] are dropped with a warning.
    pub fn compound(entries: impl IntoIterator<Item = ShapeEntry>) -> Self {
        let mut collider = Self::default();
        for entry in entries {
            collider.push_shape(entry);
        }
        collider
    }

    /// Append a compound entry. Returns false (and logs) when full.
    pub fn push_shape(&mut self, entry: ShapeEntry) -> bool {
        if self.compound.try_push(entry).is_err() {
            warn!(
                "ColliderConfig compound list is full ({} shapes), dropping shape",
                MAX_COMPOUND_SHAPES
            );
            return false;
        }
        true
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_restitution_threshold(mut self, threshold: f32) -> Self {
        self.restitution_threshold = threshold;
        self
    }

    pub fn with_sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Every shape entry once: the single shape first, then compound entries.
    pub fn shapes(&self) -> ShapeIter<'_> {
        ShapeIter {
            single: self.shape.as_ref(),
            compound: self.compound.iter(),
        }
    }

    pub fn shape_count(&self) -> usize {
        self.shapes().len()
    }
}

/// Iterator over the shape entries of a [`ColliderConfig`].
#[derive(Clone, Debug)]
pub struct ShapeIter<'a> {
    single: Option<&'a ShapeEntry>,
    compound: std::slice::Iter<'a, ShapeEntry>,
}

impl<'a> Iterator for ShapeIter<'a> {
    type Item = &'a ShapeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.single.take().or_else(|| self.compound.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.compound.len() + usize::from(self.single.is_some());
        (n, Some(n))
    }
}

impl ExactSizeIterator for ShapeIter<'_> {}
