//! Pixel ↔ meter conversion and shape translation to rapier geometry.

use glam::Vec2;
use rapier2d::prelude::*;

use super::error::PhysicsError;
use crate::components::collider::{Shape, ShapeEntry};

#[inline]
pub fn to_meters(pixels: f32, pixels_per_meter: f32) -> f32 {
    pixels / pixels_per_meter
}

#[inline]
pub fn to_pixels(meters: f32, pixels_per_meter: f32) -> f32 {
    meters * pixels_per_meter
}

#[inline]
pub(crate) fn vec_to_meters(v: Vec2, pixels_per_meter: f32) -> Vector<Real> {
    vector![v.x / pixels_per_meter, v.y / pixels_per_meter]
}

#[inline]
pub(crate) fn vec_to_pixels(v: &Vector<Real>, pixels_per_meter: f32) -> Vec2 {
    Vec2::new(v.x * pixels_per_meter, v.y * pixels_per_meter)
}

#[inline]
pub(crate) fn point_to_pixels(p: &Point<Real>, pixels_per_meter: f32) -> Vec2 {
    Vec2::new(p.x * pixels_per_meter, p.y * pixels_per_meter)
}

/// A shape ready to be attached to a body: geometry in meters plus its pose
/// relative to the body.
pub(crate) struct ConvertedShape {
    pub shape: SharedShape,
    pub position: Isometry<Real>,
}

/// Convert one shape entry into rapier geometry.
///
/// Boxes and circles keep their local pose in the returned isometry.
/// Polygons and edges have the entry rotation and offset baked into their
/// vertices before scaling, and sit at the body origin.
pub(crate) fn convert_shape(
    entry: &ShapeEntry,
    pixels_per_meter: f32,
) -> Result<ConvertedShape, PhysicsError> {
    let ppm = pixels_per_meter;
    let local = |v: Vec2| -> Point<Real> {
        let p = Vec2::from_angle(entry.angle).rotate(v) + entry.offset;
        point![p.x / ppm, p.y / ppm]
    };

    match &entry.shape {
        Shape::Box { width, height } => {
            positive(entry.shape.kind(), "width", *width)?;
            positive(entry.shape.kind(), "height", *height)?;
            Ok(ConvertedShape {
                shape: SharedShape::cuboid(
                    to_meters(width * 0.5, ppm),
                    to_meters(height * 0.5, ppm),
                ),
                position: Isometry::new(vec_to_meters(entry.offset, ppm), entry.angle),
            })
        }
        Shape::Circle { radius } => {
            positive(entry.shape.kind(), "radius", *radius)?;
            Ok(ConvertedShape {
                shape: SharedShape::ball(to_meters(*radius, ppm)),
                position: Isometry::new(vec_to_meters(entry.offset, ppm), 0.0),
            })
        }
        Shape::Polygon { vertices } => {
            if vertices.len() < 3 {
                return Err(PhysicsError::DegeneratePolygon {
                    vertices: vertices.len(),
                });
            }
            let points: Vec<Point<Real>> = vertices.iter().map(|v| local(*v)).collect();
            let shape = SharedShape::convex_polyline(points).ok_or(
                PhysicsError::DegeneratePolygon {
                    vertices: vertices.len(),
                },
            )?;
            Ok(ConvertedShape {
                shape,
                position: Isometry::identity(),
            })
        }
        Shape::Edge { start, end } => {
            if start == end {
                return Err(PhysicsError::InvalidShape {
                    kind: entry.shape.kind(),
                    reason: "start and end are the same point".to_string(),
                });
            }
            Ok(ConvertedShape {
                shape: SharedShape::segment(local(*start), local(*end)),
                position: Isometry::identity(),
            })
        }
        Shape::Chain { .. } => Err(PhysicsError::ChainShapeNotImplemented),
    }
}

fn positive(kind: &'static str, field: &str, value: f32) -> Result<(), PhysicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidShape {
            kind,
            reason: format!("{} must be positive, got {}", field, value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_unit_round_trip() {
        for ppm in [1.0, 100.0, 1000.0] {
            for px in [0.0, 1.0, -37.5, 640.0, 12345.678] {
                let back = to_pixels(to_meters(px, ppm), ppm);
                assert!((back - px).abs() <= px.abs() * 1e-6 + 1e-6, "ppm={ppm} px={px}");
            }
            let v = Vec2::new(320.0, -12.25);
            let back = vec_to_pixels(&vec_to_meters(v, ppm), ppm);
            assert!(approx_eq(back.x, v.x) && approx_eq(back.y, v.y));
        }
    }

    #[test]
    fn test_box_keeps_pose_in_isometry() {
        let entry = ShapeEntry::new(Shape::box_shape(200.0, 100.0))
            .with_offset(Vec2::new(50.0, 0.0))
            .with_angle(0.3);
        let converted = convert_shape(&entry, 100.0).unwrap();
        let cuboid = converted.shape.as_cuboid().unwrap();
        assert!(approx_eq(cuboid.half_extents.x, 1.0));
        assert!(approx_eq(cuboid.half_extents.y, 0.5));
        assert!(approx_eq(converted.position.translation.x, 0.5));
        assert!(approx_eq(converted.position.rotation.angle(), 0.3));
    }

    #[test]
    fn test_circle_scaled_and_offset() {
        let entry = ShapeEntry::new(Shape::circle(10.0)).with_offset(Vec2::new(0.0, -20.0));
        let converted = convert_shape(&entry, 10.0).unwrap();
        assert!(approx_eq(converted.shape.as_ball().unwrap().radius, 1.0));
        assert!(approx_eq(converted.position.translation.y, -2.0));
    }

    #[test]
    fn test_edge_rotated_then_translated_then_scaled() {
        let entry = ShapeEntry::new(Shape::edge(Vec2::ZERO, Vec2::new(100.0, 0.0)))
            .with_offset(Vec2::new(10.0, 10.0))
            .with_angle(FRAC_PI_2);
        let converted = convert_shape(&entry, 10.0).unwrap();
        let segment = converted.shape.as_segment().unwrap();
        assert!(approx_eq(segment.a.x, 1.0) && approx_eq(segment.a.y, 1.0));
        // (100, 0) rotated a quarter turn is (0, 100); plus offset, over 10.
        assert!(approx_eq(segment.b.x, 1.0) && approx_eq(segment.b.y, 11.0));
    }

    #[test]
    fn test_polygon_vertices_transformed() {
        let square = [
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, -10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(-10.0, 10.0),
        ];
        let entry = ShapeEntry::new(Shape::polygon(&square).unwrap()).with_offset(Vec2::new(100.0, 0.0));
        let converted = convert_shape(&entry, 10.0).unwrap();
        let polygon = converted.shape.as_convex_polygon().unwrap();
        assert_eq!(polygon.points().len(), 4);
        for p in polygon.points() {
            assert!(p.x > 8.9 && p.x < 11.1, "x = {}", p.x);
        }
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let entry = ShapeEntry::new(Shape::polygon(&[Vec2::ZERO, Vec2::X]).unwrap());
        assert_eq!(
            convert_shape(&entry, 1.0).err(),
            Some(PhysicsError::DegeneratePolygon { vertices: 2 })
        );
    }

    #[test]
    fn test_chain_is_not_implemented() {
        let entry = ShapeEntry::new(Shape::Chain {
            vertices: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            looped: true,
        });
        assert_eq!(
            convert_shape(&entry, 1.0).err(),
            Some(PhysicsError::ChainShapeNotImplemented)
        );
    }

    #[test]
    fn test_rejects_non_positive_sizes() {
        let entry = ShapeEntry::new(Shape::circle(0.0));
        assert!(matches!(
            convert_shape(&entry, 1.0),
            Err(PhysicsError::InvalidShape { kind: "circle", .. })
        ));
        let entry = ShapeEntry::new(Shape::box_shape(5.0, f32::NAN));
        assert!(convert_shape(&entry, 1.0).is_err());
    }
}
