use cgmath::{Matrix4, Vector3};

use super::{
    Camera, CameraAnimation, Context, Instance, InstanceId, Light, Material, MaterialId, MeshId,
};
use crate::{config::SceneConfig, error::SceneError, geometry::GeometrySource};

/// Assembles a [`Context`], assigning ids and validating references.
///
/// # Examples
///
/// ```rust
/// use cgmath::{Matrix4, SquareMatrix, Vector3};
/// use sponza_viewer::geometry::{primitives, MeshCollection};
/// use sponza_viewer::scene::{MeshId, SceneBuilder};
///
/// let geometry = MeshCollection::new(vec![primitives::unit_quad(MeshId(0))]);
/// let mut builder = SceneBuilder::new();
/// let red = builder.add_material(|m| m.diffuse_colour = Vector3::new(1.0, 0.0, 0.0));
/// builder.add_instance(MeshId(0), red, Matrix4::identity());
///
/// let scene = builder.build(&geometry).unwrap();
/// assert_eq!(scene.instances().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    camera: Camera,
    camera_animation: CameraAnimation,
    ambient_light_intensity: Vector3<f32>,
    lights: Vec<Light>,
    materials: Vec<Material>,
    instances: Vec<Instance>,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            camera_animation: CameraAnimation::default(),
            ambient_light_intensity: Vector3::new(0.0, 0.0, 0.0),
            lights: Vec::new(),
            materials: Vec::new(),
            instances: Vec::new(),
        }
    }
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the camera, lights and animation path of `config`.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            camera: config.camera,
            camera_animation: config.camera_animation,
            ambient_light_intensity: config.ambient_light_intensity,
            lights: config.lights.clone(),
            ..Default::default()
        }
    }

    pub fn camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn camera_animation(mut self, animation: CameraAnimation) -> Self {
        self.camera_animation = animation;
        self
    }

    pub fn ambient_light_intensity(mut self, intensity: Vector3<f32>) -> Self {
        self.ambient_light_intensity = intensity;
        self
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Adds a material starting from [`Material::fallback`] and returns its id.
    pub fn add_material(&mut self, configure: impl FnOnce(&mut Material)) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        let mut material = Material::fallback(id);
        configure(&mut material);
        material.id = id;
        self.materials.push(material);
        id
    }

    /// Adds `material`, replacing whatever id it carried.
    pub fn push_material(&mut self, mut material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        material.id = id;
        self.materials.push(material);
        id
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn add_instance(
        &mut self,
        mesh_id: MeshId,
        material_id: MaterialId,
        transform: Matrix4<f32>,
    ) -> InstanceId {
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(Instance {
            id,
            mesh_id,
            material_id,
            transform,
        });
        id
    }

    /// Validates every instance against `geometry` and the added materials.
    pub fn build(self, geometry: &dyn GeometrySource) -> Result<Context, SceneError> {
        let meshes = geometry.meshes();

        for (index, instance) in self.instances.iter().enumerate() {
            if !meshes.iter().any(|mesh| mesh.id() == instance.mesh_id) {
                return Err(SceneError::UnknownMesh {
                    instance: index,
                    mesh: instance.mesh_id,
                });
            }
            if instance.material_id.index() >= self.materials.len() {
                return Err(SceneError::UnknownMaterial {
                    instance: index,
                    material: instance.material_id,
                });
            }
        }

        Ok(Context::from_parts(
            self.camera,
            self.camera_animation,
            self.ambient_light_intensity,
            self.lights,
            self.materials,
            self.instances,
        ))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::SquareMatrix;

    use super::*;
    use crate::geometry::{primitives, MeshCollection};

    fn quad_geometry() -> MeshCollection {
        MeshCollection::new(vec![primitives::unit_quad(MeshId(0))])
    }

    #[test]
    fn test_unknown_mesh_rejected() {
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(|_| {});
        builder.add_instance(MeshId(0), material, Matrix4::identity());
        builder.add_instance(MeshId(5), material, Matrix4::identity());

        let result = builder.build(&quad_geometry());
        assert!(matches!(
            result,
            Err(SceneError::UnknownMesh { instance: 1, mesh: MeshId(5) })
        ));
    }

    #[test]
    fn test_unknown_material_rejected() {
        let mut builder = SceneBuilder::new();
        builder.add_instance(MeshId(0), MaterialId(0), Matrix4::identity());

        let result = builder.build(&quad_geometry());
        assert!(matches!(
            result,
            Err(SceneError::UnknownMaterial { instance: 0, .. })
        ));
    }

    #[test]
    fn test_push_material_reassigns_id() {
        let mut builder = SceneBuilder::new();
        builder.add_material(|_| {});
        let id = builder.push_material(Material::fallback(MaterialId(42)));

        assert_eq!(id, MaterialId(1));
        builder.add_instance(MeshId(0), id, Matrix4::identity());
        let scene = builder.build(&quad_geometry()).unwrap();
        assert_eq!(scene.material_by_id(id).id, id);
    }

    #[test]
    fn test_from_config_carries_lights() {
        let config = SceneConfig::default();
        let builder = SceneBuilder::from_config(&config);
        let scene = builder.build(&quad_geometry()).unwrap();

        assert_eq!(scene.lights(), config.lights.as_slice());
        assert_eq!(*scene.camera(), config.camera);
    }
}
