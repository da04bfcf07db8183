/// Triangle primitive and the Möller-Trumbore line test shared by rays and
/// segments.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Face normal (right-hand rule), zero for degenerate triangles
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalize_or_zero()
    }

    /// Möller-Trumbore test of the infinite line `origin + t * direction`.
    ///
    /// Returns the line parameter `t` of the hit (any sign); callers clamp
    /// it to their own parametrization. Both faces are hit. Lines parallel
    /// to the triangle plane never hit.
    pub fn intersect_line(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;

        let h = direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = origin - self.a;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some(inv_det * edge2.dot(q))
    }
}
