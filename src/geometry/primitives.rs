//! # Primitive Shape Generation
//!
//! Procedural meshes used by the built-in demo scene and by tests.
//! All shapes carry outward normals and texture coordinates.

use super::Mesh;
use crate::scene::MeshId;

fn assemble(
    id: MeshId,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
) -> Mesh {
    // Generators always emit parallel arrays, so the length check cannot fail.
    match Mesh::new(id, positions, normals, texcoords, indices) {
        Ok(mesh) => mesh,
        Err(err) => unreachable!("primitive generator produced inconsistent arrays: {err}"),
    }
}

/// A unit quad in the XY plane facing +Z: 4 vertices, 6 indices.
pub fn unit_quad(id: MeshId) -> Mesh {
    assemble(
        id,
        vec![
            [-0.5, -0.5, 0.0],
            [0.5, -0.5, 0.0],
            [0.5, 0.5, 0.0],
            [-0.5, 0.5, 0.0],
        ],
        vec![[0.0, 0.0, 1.0]; 4],
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        vec![0, 1, 2, 2, 3, 0],
    )
}

/// Generate a unit cube centered at the origin
///
/// Vertices span -0.5 to 0.5 on all axes; each face has its own four vertices.
pub fn cube(id: MeshId) -> Mesh {
    #[rustfmt::skip]
    let positions = vec![
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    #[rustfmt::skip]
    let texcoords = vec![
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
        [1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];
    let normals = face_normals
        .iter()
        .flat_map(|normal| std::iter::repeat(*normal).take(4))
        .collect();

    // Two counter-clockwise triangles per face
    let indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    assemble(id, positions, normals, texcoords, indices)
}

/// Generate a subdivided plane in the XZ plane facing +Y
///
/// # Arguments
/// * `width`, `depth` - Extent along X and Z
/// * `subdivisions_x`, `subdivisions_z` - Quads along each axis (at least 1)
/// * `uv_repeat` - How many times texture coordinates wrap across the plane
pub fn plane(
    id: MeshId,
    width: f32,
    depth: f32,
    subdivisions_x: u32,
    subdivisions_z: u32,
    uv_repeat: f32,
) -> Mesh {
    let segs_x = subdivisions_x.max(1);
    let segs_z = subdivisions_z.max(1);

    let mut positions = Vec::new();
    let mut texcoords = Vec::new();

    for z in 0..=segs_z {
        for x in 0..=segs_x {
            let u = x as f32 / segs_x as f32;
            let v = z as f32 / segs_z as f32;
            positions.push([(u - 0.5) * width, 0.0, (v - 0.5) * depth]);
            texcoords.push([u * uv_repeat, v * uv_repeat]);
        }
    }

    let mut indices = Vec::new();
    let row = segs_x + 1;
    for z in 0..segs_z {
        for x in 0..segs_x {
            let i0 = z * row + x;
            let i1 = i0 + 1;
            let i2 = i0 + row;
            let i3 = i2 + 1;
            // Wound counter-clockwise when seen from above
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    let normals = vec![[0.0, 1.0, 0.0]; positions.len()];
    assemble(id, positions, normals, texcoords, indices)
}
