use cgmath::Matrix4;

use super::{InstanceId, MaterialId, MeshId};

/// One placement of a mesh with a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub id: InstanceId,
    pub mesh_id: MeshId,
    pub material_id: MaterialId,
    /// Object-to-world transform.
    pub transform: Matrix4<f32>,
}
