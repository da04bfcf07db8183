/// Oriented bounding box.
///
/// A node's local enclosing box carried into world space by its global
/// transform. The world AABB of a node is the envelope of this box.

use glam::{Mat4, Vec3};
use super::aabb::AABB;

/// Box with arbitrary orientation: center, three orthonormal axes and the
/// half length along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vec3,
    pub axes: [Vec3; 3],
    pub half_extents: Vec3,
}

impl Default for OrientedBox {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half_extents: Vec3::splat(f32::NEG_INFINITY),
        }
    }
}

impl OrientedBox {
    /// Carry a local-space box into the space of `matrix`.
    ///
    /// Scale folds into the half extents. A collapsed axis (zero scale)
    /// keeps the matching basis vector with a zero half extent.
    pub fn from_aabb(local: &AABB, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(local.center());
        let local_half = local.half_extents();
        let basis = [Vec3::X, Vec3::Y, Vec3::Z];

        let mut axes = basis;
        let mut half_extents = Vec3::ZERO;
        for i in 0..3 {
            let scaled = matrix.col(i).truncate() * local_half[i];
            let length = scaled.length();
            if length > f32::EPSILON {
                axes[i] = scaled / length;
            }
            half_extents[i] = length;
        }

        Self { center, axes, half_extents }
    }

    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.half_extents.is_finite()
    }

    /// The eight corners, bit i selects the sign along axis i
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            let mut p = self.center;
            for axis in 0..3 {
                let sign = if i & (1 << axis) == 0 { -1.0 } else { 1.0 };
                p += self.axes[axis] * self.half_extents[axis] * sign;
            }
            p
        })
    }

    /// Smallest axis-aligned box containing this box
    pub fn enclosing_aabb(&self) -> AABB {
        if !self.is_finite() {
            return AABB::empty();
        }

        let mut reach = Vec3::ZERO;
        for i in 0..3 {
            reach += self.axes[i].abs() * self.half_extents[i];
        }
        AABB::from_center_half_extents(self.center, reach)
    }
}
