//! Error types for scene loading, device operations and the viewer lifecycle.

use crate::scene::{MaterialId, MeshId};

/// Failures while constructing or loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to load OBJ scene '{path}': {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("instance {instance} references unknown mesh {mesh:?}")]
    UnknownMesh { instance: usize, mesh: MeshId },

    #[error("instance {instance} references unknown material {material:?}")]
    UnknownMaterial { instance: usize, material: MaterialId },

    #[error("mesh {mesh:?} has {positions} positions but {normals} normals and {texcoords} texcoords")]
    MismatchedAttributes {
        mesh: MeshId,
        positions: usize,
        normals: usize,
        texcoords: usize,
    },

    #[error("scene '{0}' contains no meshes")]
    Empty(String),
}

/// Failures reported by a graphics device.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("failed to request adapter: {0}")]
    Adapter(String),

    #[error("failed to request device: {0}")]
    Device(String),

    #[error("shader '{label}' failed to compile: {details}")]
    ShaderCompilation { label: String, details: String },

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("uniform '{uniform}' expects a {expected} value, got {found}")]
    UniformType {
        uniform: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("frame commands issued outside begin_frame/end_frame")]
    NoActiveFrame,

    #[error("draw issued before a program was selected")]
    NoProgram,

    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),
}

/// Errors surfaced by the viewer lifecycle entry points.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("no GPU mesh for mesh {0:?}; resources were built from a different geometry source")]
    MissingMesh(MeshId),

    #[error("the view has not been started")]
    NotStarted,
}
