use std::collections::HashMap;

use crate::{
    error::GpuError,
    geometry::{GeometrySource, Mesh},
    gfx::{
        device::{BufferId, BufferKind, RenderDevice, VertexBinding, VertexLayoutId},
        shader_interface::MESH_VERTEX_LAYOUT,
    },
    scene::MeshId,
};

/// Device-side buffers and vertex layout for one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    pub position_buffer: BufferId,
    pub normal_buffer: BufferId,
    pub texcoord_buffer: BufferId,
    pub index_buffer: BufferId,
    pub layout: VertexLayoutId,
    pub index_count: u32,
}

impl GpuMesh {
    fn buffers(&self) -> [BufferId; 4] {
        [
            self.position_buffer,
            self.normal_buffer,
            self.texcoord_buffer,
            self.index_buffer,
        ]
    }
}

/// GPU meshes keyed by the id of the mesh they were built from.
#[derive(Debug, Default)]
pub struct MeshResources {
    meshes: HashMap<MeshId, GpuMesh>,
}

impl MeshResources {
    /// Uploads every mesh of `geometry`.
    ///
    /// On failure the buffers created so far are released before returning.
    pub fn build(
        device: &mut dyn RenderDevice,
        geometry: &dyn GeometrySource,
    ) -> Result<Self, GpuError> {
        let mut resources = Self::default();

        for mesh in geometry.meshes() {
            match upload_mesh(device, mesh) {
                Ok(gpu_mesh) => {
                    if let Some(previous) = resources.meshes.insert(mesh.id(), gpu_mesh) {
                        log::warn!("Duplicate mesh id {:?}; replacing earlier upload", mesh.id());
                        release_mesh(device, &previous);
                    }
                }
                Err(err) => {
                    resources.release(device);
                    return Err(err);
                }
            }
        }

        log::debug!("Uploaded {} meshes", resources.meshes.len());
        Ok(resources)
    }

    pub fn get(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        for (_, mesh) in self.meshes.drain() {
            release_mesh(device, &mesh);
        }
    }
}

fn upload_mesh(device: &mut dyn RenderDevice, mesh: &Mesh) -> Result<GpuMesh, GpuError> {
    let mut created = Vec::with_capacity(4);
    let result = try_upload_mesh(device, mesh, &mut created);
    if result.is_err() {
        for buffer in created {
            device.release_buffer(buffer);
        }
    }
    result
}

fn try_upload_mesh(
    device: &mut dyn RenderDevice,
    mesh: &Mesh,
    created: &mut Vec<BufferId>,
) -> Result<GpuMesh, GpuError> {
    let id = mesh.id().0;
    let sources: [(&str, BufferKind, &[u8]); 4] = [
        ("Positions", BufferKind::Vertex, bytemuck::cast_slice(mesh.positions())),
        ("Normals", BufferKind::Vertex, bytemuck::cast_slice(mesh.normals())),
        ("Texcoords", BufferKind::Vertex, bytemuck::cast_slice(mesh.texcoords())),
        ("Indices", BufferKind::Index, bytemuck::cast_slice(mesh.indices())),
    ];
    for (name, kind, bytes) in sources {
        created.push(device.create_buffer(&format!("Mesh {id} {name}"), kind, bytes)?);
    }
    let [position_buffer, normal_buffer, texcoord_buffer, index_buffer] =
        [created[0], created[1], created[2], created[3]];

    let bindings: Vec<VertexBinding> = MESH_VERTEX_LAYOUT
        .iter()
        .zip([position_buffer, normal_buffer, texcoord_buffer])
        .map(|(attribute, buffer)| VertexBinding {
            slot: attribute.slot,
            format: attribute.format,
            buffer,
        })
        .collect();
    let layout =
        device.create_vertex_layout(&format!("Mesh {id} Layout"), &bindings, index_buffer)?;

    Ok(GpuMesh {
        position_buffer,
        normal_buffer,
        texcoord_buffer,
        index_buffer,
        layout,
        index_count: mesh.index_count() as u32,
    })
}

fn release_mesh(device: &mut dyn RenderDevice, mesh: &GpuMesh) {
    device.release_vertex_layout(mesh.layout);
    for buffer in mesh.buffers() {
        device.release_buffer(buffer);
    }
}
