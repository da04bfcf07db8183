/// Axis-aligned bounding box.
///
/// Used for node enclosing boxes (world space), component contributions
/// (local space) and octree cells. An empty box has `min = +inf` and
/// `max = -inf`, so enclosing anything into it yields that thing.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The box that contains nothing; the identity for `enclose`.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// A box covering all of space
    pub fn unbounded() -> Self {
        Self {
            min: Vec3::splat(f32::NEG_INFINITY),
            max: Vec3::splat(f32::INFINITY),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing every point (empty for no points)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.enclose_point(*p);
        }
        aabb
    }

    /// True when min > max on any axis (nothing enclosed yet)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True when both corners are finite numbers.
    ///
    /// Empty and unbounded boxes are not finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow this box to contain `point`
    pub fn enclose_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow this box to contain `other`. Empty boxes are ignored.
    pub fn enclose(&mut self, other: &AABB) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// The eight corners, bit0 = X, bit1 = Y, bit2 = Z (0 = min, 1 = max)
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Transform this box by a matrix, returning the axis-aligned envelope.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the box extents
    /// for an exact (tight) result without transforming all 8 corners.
    /// Non-finite boxes are returned unchanged.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        if !self.is_finite() {
            return *self;
        }

        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }

    /// Test if this box fully contains another box.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
        && point.y >= self.min.y && point.y <= self.max.y
        && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Test if this box overlaps or touches another box.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Clip the parametric line `origin + t * direction` against this box
    /// (slab method), restricted to `[t_min, t_max]`.
    ///
    /// Returns the entry and exit parameters of the clipped interval.
    /// An axis with a zero direction component only passes if the origin
    /// lies between that axis' slabs.
    pub fn clip_line(
        &self,
        origin: Vec3,
        direction: Vec3,
        t_min: f32,
        t_max: f32,
    ) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut near = t_min;
        let mut far = t_max;

        for i in 0..3 {
            let o = origin[i];
            let d = direction[i];

            if d.abs() <= f32::EPSILON {
                if o < self.min[i] || o > self.max[i] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (self.min[i] - o) * inv;
            let mut t1 = (self.max[i] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            near = near.max(t0);
            far = far.min(t1);
            if near > far {
                return None;
            }
        }

        Some((near, far))
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
