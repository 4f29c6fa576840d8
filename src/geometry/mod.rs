//! # Geometry Source
//!
//! Meshes consumed once at startup by the GPU resource manager. A mesh is a set
//! of parallel vertex attribute arrays (positions, normals, texture coordinates)
//! plus a triangle index list, identified by a [`MeshId`].
//!
//! ## Usage
//!
//! ```rust
//! use sponza_viewer::geometry::{primitives, GeometrySource, MeshCollection};
//! use sponza_viewer::scene::MeshId;
//!
//! let geometry = MeshCollection::new(vec![primitives::unit_quad(MeshId(0))]);
//! assert_eq!(geometry.meshes()[0].index_count(), 6);
//! ```

pub mod primitives;

use cgmath::{InnerSpace, Vector3};

use crate::{error::SceneError, scene::MeshId};

/// Immutable CPU-side mesh data.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    id: MeshId,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh, checking that every vertex attribute array has the same length.
    pub fn new(
        id: MeshId,
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        texcoords: Vec<[f32; 2]>,
        indices: Vec<u32>,
    ) -> Result<Self, SceneError> {
        if normals.len() != positions.len() || texcoords.len() != positions.len() {
            return Err(SceneError::MismatchedAttributes {
                mesh: id,
                positions: positions.len(),
                normals: normals.len(),
                texcoords: texcoords.len(),
            });
        }

        Ok(Self {
            id,
            positions,
            normals,
            texcoords,
            indices,
        })
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        &self.texcoords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Averages face normals onto vertices, for sources that ship positions only.
    pub fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }

            let [v0, v1, v2] = [i0, i1, i2].map(|i| Vector3::from(positions[i]));
            let face_normal = (v1 - v0).cross(v2 - v0);

            for vertex in [i0, i1, i2] {
                normals[vertex] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|normal| {
                if normal.magnitude2() > 0.0 {
                    normal.normalize().into()
                } else {
                    normal.into()
                }
            })
            .collect()
    }
}

/// Supplies the full, ordered mesh collection of a scene.
pub trait GeometrySource {
    fn meshes(&self) -> &[Mesh];
}

/// Owned, ordered list of meshes.
#[derive(Debug, Clone, Default)]
pub struct MeshCollection {
    meshes: Vec<Mesh>,
}

impl MeshCollection {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self { meshes }
    }

    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.iter().any(|mesh| mesh.id() == id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl GeometrySource for MeshCollection {
    fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}
