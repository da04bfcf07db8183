/// Box entry test shared by every ray-like query.
///
/// Distances are always world-space lengths from the probe start, so rays
/// and segments can be merged into the same ordered candidate list.

use crate::math::{AABB, LineSegment, Ray};

pub trait LineProbe {
    /// Distance to where the probe enters a finite, non-empty box
    fn clip_box(&self, aabb: &AABB) -> Option<f32>;

    /// Entry distance with the degenerate-box policy applied:
    /// empty boxes are never hit, non-finite boxes are hit at distance 0.
    fn enter_distance(&self, aabb: &AABB) -> Option<f32> {
        if aabb.is_empty() {
            return None;
        }
        if !aabb.is_finite() {
            return Some(0.0);
        }
        self.clip_box(aabb)
    }
}

impl LineProbe for Ray {
    fn clip_box(&self, aabb: &AABB) -> Option<f32> {
        self.intersect_aabb(aabb).map(|(near, _)| near)
    }
}

impl LineProbe for LineSegment {
    fn clip_box(&self, aabb: &AABB) -> Option<f32> {
        self.intersect_aabb(aabb).map(|(near, _)| near * self.length())
    }
}
