//! CPU-side triangle meshes used for bounds and picking.
//!
//! A `MeshResource` is immutable once created and shared between nodes
//! through `Arc`. Mesh components hold one and expose it to the ray-cast
//! pipeline as the geometry provider.
//!
//! # Layout
//!
//! - `vertices`: object-space positions
//! - `indices`: triangle list, three indices per triangle
//! - `local_bounds`: cached envelope of all vertices

use glam::Vec3;
use crate::error::Result;
use crate::math::{AABB, Triangle};
use crate::engine_bail;

/// Resource UIDs of the built-in primitives
pub const PRIMITIVE_CUBE: u64 = 1;
pub const PRIMITIVE_PLANE: u64 = 2;
pub const PRIMITIVE_SPHERE: u64 = 3;

/// Sphere tessellation for the built-in primitive
const SPHERE_RINGS: u32 = 12;
const SPHERE_SECTORS: u32 = 24;

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Parameters for building a `MeshResource`.
#[derive(Debug, Clone, Default)]
pub struct MeshResourceDesc {
    pub uid: u64,
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

// ============================================================================
// MESH RESOURCE
// ============================================================================

#[derive(Debug, Clone)]
pub struct MeshResource {
    uid: u64,
    name: String,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    local_bounds: AABB,
}

impl MeshResource {
    /// Build a mesh from a descriptor.
    ///
    /// The index list must hold whole triangles and every index must
    /// reference an existing vertex.
    pub fn from_desc(desc: MeshResourceDesc) -> Result<Self> {
        if desc.indices.len() % 3 != 0 {
            engine_bail!("stellar::MeshResource",
                "Mesh '{}': index count {} is not a multiple of 3",
                desc.name, desc.indices.len());
        }

        let vertex_count = desc.vertices.len();
        if let Some(bad) = desc.indices.iter().find(|&&i| i as usize >= vertex_count) {
            engine_bail!("stellar::MeshResource",
                "Mesh '{}': index {} out of range (vertex count {})",
                desc.name, bad, vertex_count);
        }

        let local_bounds = AABB::from_points(desc.vertices.iter());

        Ok(Self {
            uid: desc.uid,
            name: desc.name,
            vertices: desc.vertices,
            indices: desc.indices,
            local_bounds,
        })
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Object-space envelope of all vertices (empty for a mesh without vertices)
    pub fn local_bounds(&self) -> &AABB {
        &self.local_bounds
    }

    /// Iterate over triangles in index order
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            Triangle::new(
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            )
        })
    }

    // ===== PRIMITIVES =====

    /// Axis-aligned unit cube centered at the origin (side 1).
    pub fn cube() -> Self {
        let h = 0.5;
        let vertices = vec![
            Vec3::new(-h, -h, -h), Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h), Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h), Vec3::new(h, -h, h),
            Vec3::new(h, h, h), Vec3::new(-h, h, h),
        ];
        #[rustfmt::skip]
        let indices = vec![
            // -Z
            0, 2, 1, 0, 3, 2,
            // +Z
            4, 5, 6, 4, 6, 7,
            // -X
            0, 4, 7, 0, 7, 3,
            // +X
            1, 2, 6, 1, 6, 5,
            // -Y
            0, 1, 5, 0, 5, 4,
            // +Y
            3, 7, 6, 3, 6, 2,
        ];
        Self::primitive(PRIMITIVE_CUBE, "cube", vertices, indices)
    }

    /// Unit plane in XZ centered at the origin, facing +Y.
    pub fn plane() -> Self {
        let h = 0.5;
        let vertices = vec![
            Vec3::new(-h, 0.0, -h), Vec3::new(h, 0.0, -h),
            Vec3::new(h, 0.0, h), Vec3::new(-h, 0.0, h),
        ];
        let indices = vec![0, 2, 1, 0, 3, 2];
        Self::primitive(PRIMITIVE_PLANE, "plane", vertices, indices)
    }

    /// UV sphere of radius 0.5 centered at the origin.
    pub fn sphere() -> Self {
        let radius = 0.5;
        let mut vertices = Vec::with_capacity(((SPHERE_RINGS + 1) * (SPHERE_SECTORS + 1)) as usize);
        for ring in 0..=SPHERE_RINGS {
            let phi = std::f32::consts::PI * ring as f32 / SPHERE_RINGS as f32;
            for sector in 0..=SPHERE_SECTORS {
                let theta = std::f32::consts::TAU * sector as f32 / SPHERE_SECTORS as f32;
                vertices.push(Vec3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.cos(),
                    radius * phi.sin() * theta.sin(),
                ));
            }
        }

        let stride = SPHERE_SECTORS + 1;
        let mut indices = Vec::with_capacity((SPHERE_RINGS * SPHERE_SECTORS * 6) as usize);
        for ring in 0..SPHERE_RINGS {
            for sector in 0..SPHERE_SECTORS {
                let a = ring * stride + sector;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        Self::primitive(PRIMITIVE_SPHERE, "sphere", vertices, indices)
    }

    fn primitive(uid: u64, name: &str, vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let local_bounds = AABB::from_points(vertices.iter());
        Self {
            uid,
            name: name.to_string(),
            vertices,
            indices,
            local_bounds,
        }
    }
}

#[cfg(test)]
#[path = "mesh_resource_tests.rs"]
mod tests;
