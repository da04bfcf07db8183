/// Rays and line segments used for picking.
///
/// A `Ray` is `origin + t * direction` for `t >= 0` with a unit direction,
/// so its parameter is a distance. A `LineSegment` runs from `a` to `b`;
/// its native parameter is the fraction `t` in `[0, 1]` along `b - a`,
/// which is invariant under affine transforms.

use glam::{Mat4, Vec3};
use super::aabb::AABB;
use super::triangle::Triangle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; the direction is normalized (zero stays zero).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Carry the ray into another space. The direction is NOT renormalized.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    pub fn normalized(&self) -> Ray {
        Ray::new(self.origin, self.direction)
    }

    /// Entry and exit distances through `aabb`, clamped to `t >= 0`
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<(f32, f32)> {
        aabb.clip_line(self.origin, self.direction, 0.0, f32::INFINITY)
    }

    /// Distance to the triangle along the ray, if it is in front of the origin
    pub fn intersect_triangle(&self, triangle: &Triangle) -> Option<f32> {
        triangle
            .intersect_line(self.origin, self.direction)
            .filter(|t| *t >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec3,
    pub b: Vec3,
}

impl LineSegment {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Unnormalized direction `b - a`
    pub fn delta(&self) -> Vec3 {
        self.b - self.a
    }

    pub fn length(&self) -> f32 {
        self.delta().length()
    }

    /// Point at fraction `t` (0 = `a`, 1 = `b`)
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.a + self.delta() * t
    }

    pub fn transformed(&self, matrix: &Mat4) -> LineSegment {
        LineSegment {
            a: matrix.transform_point3(self.a),
            b: matrix.transform_point3(self.b),
        }
    }

    /// Entry and exit fractions through `aabb`, clamped to `[0, 1]`
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<(f32, f32)> {
        aabb.clip_line(self.a, self.delta(), 0.0, 1.0)
    }

    /// Fraction along the segment where it crosses the triangle
    pub fn intersect_triangle(&self, triangle: &Triangle) -> Option<f32> {
        triangle
            .intersect_line(self.a, self.delta())
            .filter(|t| (0.0..=1.0).contains(t))
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
