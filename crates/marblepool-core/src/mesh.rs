//! Triangle meshes consumed by the physics adapter.
//!
//! Model parsing lives outside the core; hosts hand meshes in through
//! [`MeshSource`]. [`MeshLibrary`] is an in-memory source preloaded with the
//! procedural shapes the table itself needs (shooting platform, ramp, pillar)
//! and a flat test table.

use std::collections::HashMap;

use glam::Vec3;

/// Key of the temporary shooting platform mesh.
pub const PLATFORM_MESH: &str = "platform";
/// Key of the ramp structure mesh.
pub const RAMP_MESH: &str = "ramp";
/// Key of the pillar structure mesh.
pub const PILLAR_MESH: &str = "pillar";
/// Key of the built-in flat table.
pub const FLAT_TABLE_MESH: &str = "table_flat";

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Axis-aligned box spanning `min..max`.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let vertices = vec![
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        let indices = vec![
            // bottom
            [0, 2, 1],
            [0, 3, 2],
            // top
            [4, 5, 6],
            [4, 6, 7],
            // -y
            [0, 1, 5],
            [0, 5, 4],
            // +x
            [1, 2, 6],
            [1, 6, 5],
            // +y
            [2, 3, 7],
            [2, 7, 6],
            // -x
            [3, 0, 4],
            [3, 4, 7],
        ];
        Self { vertices, indices }
    }

    /// Wedge rising along +x from height 0 at `-half_length` to `height` at `+half_length`.
    pub fn wedge(half_length: f32, half_width: f32, height: f32) -> Self {
        let (l, w) = (half_length, half_width);
        let vertices = vec![
            Vec3::new(-l, -w, 0.0),
            Vec3::new(l, -w, 0.0),
            Vec3::new(l, w, 0.0),
            Vec3::new(-l, w, 0.0),
            Vec3::new(l, -w, height),
            Vec3::new(l, w, height),
        ];
        let indices = vec![
            // bottom
            [0, 2, 1],
            [0, 3, 2],
            // slope
            [0, 4, 5],
            [0, 5, 3],
            // back face
            [1, 2, 5],
            [1, 5, 4],
            // sides
            [0, 1, 4],
            [3, 5, 2],
        ];
        Self { vertices, indices }
    }

    /// Returns a copy with every vertex multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v * factor).collect(),
            indices: self.indices.clone(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Lookup of meshes by asset key.
pub trait MeshSource: Send + Sync {
    fn mesh(&self, key: &str) -> Option<&TriangleMesh>;
}

/// In-memory [`MeshSource`].
#[derive(Debug, Clone, Default)]
pub struct MeshLibrary {
    meshes: HashMap<String, TriangleMesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with the procedural meshes used by the table.
    pub fn with_builtin_meshes() -> Self {
        let mut library = Self::new();
        library.insert(
            PLATFORM_MESH,
            TriangleMesh::cuboid(Vec3::new(-0.6, -0.6, -0.2), Vec3::new(0.6, 0.6, 0.0)),
        );
        library.insert(RAMP_MESH, TriangleMesh::wedge(1.0, 0.6, 0.6));
        library.insert(
            PILLAR_MESH,
            TriangleMesh::cuboid(Vec3::new(-0.25, -0.25, 0.0), Vec3::new(0.25, 0.25, 1.5)),
        );
        library.insert(
            FLAT_TABLE_MESH,
            TriangleMesh::cuboid(Vec3::new(-10.0, -6.0, -1.0), Vec3::new(10.0, 6.0, 0.0)),
        );
        library
    }

    pub fn insert(&mut self, key: impl Into<String>, mesh: TriangleMesh) {
        self.meshes.insert(key.into(), mesh);
    }
}

impl MeshSource for MeshLibrary {
    fn mesh(&self, key: &str) -> Option<&TriangleMesh> {
        self.meshes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_meshes_are_valid() {
        let library = MeshLibrary::with_builtin_meshes();
        for key in [PLATFORM_MESH, RAMP_MESH, PILLAR_MESH, FLAT_TABLE_MESH] {
            let mesh = library.mesh(key).unwrap();
            assert!(!mesh.is_empty(), "{key} has no triangles");
            for tri in &mesh.indices {
                for &i in tri {
                    assert!((i as usize) < mesh.vertices.len(), "{key} index out of range");
                }
            }
        }
        assert!(library.mesh("missing").is_none());
    }

    #[test]
    fn test_scaled_mesh() {
        let mesh = TriangleMesh::cuboid(Vec3::ZERO, Vec3::ONE).scaled(2.0);
        assert_eq!(mesh.vertices[6], Vec3::splat(2.0));
        assert_eq!(mesh.triangle_count(), 12);
    }
}
