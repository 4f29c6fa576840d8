use std::{collections::HashMap, time::Instant};

use cgmath::Vector3;

use super::{
    Camera, CameraAnimation, FirstPersonMovement, Instance, InstanceId, Light, Material,
    MaterialId, MeshId,
};

/// The scene model: camera, lights, materials and mesh instances.
///
/// Everything except the camera is fixed once the scene is built. The camera
/// only changes inside [`Context::update`], driven by first-person input or by
/// the camera animation.
pub struct Context {
    start_time: Instant,
    time_seconds: f32,
    last_update_seconds: Option<f32>,

    camera: Camera,
    camera_movement: FirstPersonMovement,
    camera_animation: CameraAnimation,
    animate_camera: bool,

    ambient_light_intensity: Vector3<f32>,
    lights: Vec<Light>,
    materials: Vec<Material>,
    instances: Vec<Instance>,
    instances_by_mesh: HashMap<MeshId, Vec<InstanceId>>,
}

impl Context {
    /// Assembles a context from already validated parts.
    ///
    /// Material and instance ids must equal their position in their vectors;
    /// [`SceneBuilder`](super::SceneBuilder) guarantees this.
    pub(crate) fn from_parts(
        camera: Camera,
        camera_animation: CameraAnimation,
        ambient_light_intensity: Vector3<f32>,
        lights: Vec<Light>,
        materials: Vec<Material>,
        instances: Vec<Instance>,
    ) -> Self {
        let mut instances_by_mesh: HashMap<MeshId, Vec<InstanceId>> = HashMap::new();
        for instance in &instances {
            instances_by_mesh
                .entry(instance.mesh_id)
                .or_default()
                .push(instance.id);
        }

        Self {
            start_time: Instant::now(),
            time_seconds: 0.0,
            last_update_seconds: None,
            camera,
            camera_movement: FirstPersonMovement::new(),
            camera_animation,
            animate_camera: false,
            ambient_light_intensity,
            lights,
            materials,
            instances,
            instances_by_mesh,
        }
    }

    /// Advances the scene to the current wall-clock time.
    ///
    /// Call once per frame, before rendering.
    pub fn update(&mut self) {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        self.update_to(elapsed);
    }

    /// Advances the scene to `time_seconds` since the scene was created.
    pub fn update_to(&mut self, time_seconds: f32) {
        let dt = self
            .last_update_seconds
            .map_or(0.0, |last| (time_seconds - last).max(0.0));
        self.last_update_seconds = Some(time_seconds);
        self.time_seconds = time_seconds;

        let up = self.up_direction();
        if self.animate_camera {
            let (position, direction) = self.camera_animation.pose_at(time_seconds, up);
            self.camera.position = position;
            self.camera.direction = direction;
            self.camera.up = up;
        } else {
            self.camera_movement.apply(&mut self.camera, up, dt);
        }
    }

    /// Flips camera animation on or off and returns the new state.
    pub fn toggle_camera_animation(&mut self) -> bool {
        self.animate_camera = !self.animate_camera;
        // Input queued against the old mode must not leak into the new one.
        self.camera_movement.reset();
        log::info!(
            "Camera animation {}",
            if self.animate_camera { "enabled" } else { "disabled" }
        );
        self.animate_camera
    }

    pub fn is_camera_animated(&self) -> bool {
        self.animate_camera
    }

    pub fn time_in_seconds(&self) -> f32 {
        self.time_seconds
    }

    pub fn up_direction(&self) -> Vector3<f32> {
        Vector3::unit_y()
    }

    pub fn ambient_light_intensity(&self) -> Vector3<f32> {
        self.ambient_light_intensity
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// First-person input; applied on the next [`update`](Self::update).
    pub fn camera_movement_mut(&mut self) -> &mut FirstPersonMovement {
        &mut self.camera_movement
    }

    pub fn camera_animation(&self) -> &CameraAnimation {
        &self.camera_animation
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// # Panics
    /// Panics if `id` was not assigned by this scene.
    pub fn material_by_id(&self, id: MaterialId) -> &Material {
        self.materials
            .get(id.index())
            .unwrap_or_else(|| panic!("material {id:?} does not exist in this scene"))
    }

    /// # Panics
    /// Panics if `id` was not assigned by this scene.
    pub fn instance_by_id(&self, id: InstanceId) -> &Instance {
        self.instances
            .get(id.index())
            .unwrap_or_else(|| panic!("instance {id:?} does not exist in this scene"))
    }

    /// Instances placing mesh `id`, in scene order. Empty for unused meshes.
    pub fn instances_by_mesh_id(&self, id: MeshId) -> &[InstanceId] {
        self.instances_by_mesh
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            light_count: self.lights.len(),
            material_count: self.materials.len(),
            instance_count: self.instances.len(),
            mesh_count: self.instances_by_mesh.len(),
        }
    }
}

/// Scene statistics for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub light_count: usize,
    pub material_count: usize,
    pub instance_count: usize,
    /// Distinct meshes referenced by at least one instance.
    pub mesh_count: usize,
}
