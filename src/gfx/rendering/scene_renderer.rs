//! Per-frame Phong rendering of a scene model through a [`RenderDevice`].

use cgmath::{Deg, Matrix4};

use crate::{
    config::RenderSettings,
    error::{GpuError, ViewerError},
    geometry::GeometrySource,
    gfx::{
        device::{ClearState, ProgramId, ProgramSource, RenderDevice, UniformValue},
        resources::GpuResources,
        shader_interface::{TextureUnit, Uniform},
        view::ViewDelegate,
    },
    imaging::ImageDecoder,
    scene::{Context, Material},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const PHONG_PROGRAM: ProgramSource<'static> = ProgramSource {
    label: "Phong",
    vertex: include_str!("shaders/phong_vs.wgsl"),
    fragment: include_str!("shaders/phong_fs.wgsl"),
};

/// What the last frame submitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub indices: u64,
}

/// Draws every instance of a scene with the Phong program.
///
/// Device resources are created in [`ViewDelegate::view_will_start`] and
/// released in [`ViewDelegate::view_did_stop`]; between the two the renderer
/// only reads them.
pub struct SceneRenderer {
    settings: RenderSettings,
    decoder: Box<dyn ImageDecoder>,
    normal_shading: bool,
    aspect_ratio: f32,
    program: Option<ProgramId>,
    resources: Option<GpuResources>,
    last_frame: FrameStats,
}

impl SceneRenderer {
    pub fn new(settings: RenderSettings, decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            settings,
            decoder,
            normal_shading: false,
            aspect_ratio: 1.0,
            program: None,
            resources: None,
            last_frame: FrameStats::default(),
        }
    }

    /// Shade by world-space normal instead of lighting.
    pub fn set_normal_shading(&mut self, enabled: bool) {
        self.normal_shading = enabled;
    }

    pub fn normal_shading(&self) -> bool {
        self.normal_shading
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn is_started(&self) -> bool {
        self.program.is_some()
    }

    pub fn resources(&self) -> Option<&GpuResources> {
        self.resources.as_ref()
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_frame
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(
                Deg(self.settings.fov_y_degrees),
                self.aspect_ratio,
                self.settings.near_plane,
                self.settings.far_plane,
            )
    }

    fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(mut resources) = self.resources.take() {
            resources.release(device);
        }
        if let Some(program) = self.program.take() {
            device.release_program(program);
        }
    }
}

impl ViewDelegate for SceneRenderer {
    fn view_will_start(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Context,
        geometry: &dyn GeometrySource,
    ) -> Result<(), ViewerError> {
        if self.is_started() {
            log::warn!("View restarted without stopping; releasing previous resources");
            self.release(device);
        }

        let program = device.create_program(&PHONG_PROGRAM)?;
        let resources =
            match GpuResources::build(device, geometry, scene.materials(), self.decoder.as_ref()) {
                Ok(resources) => resources,
                Err(err) => {
                    device.release_program(program);
                    return Err(err.into());
                }
            };

        log::info!(
            "View started: {} meshes, {} textures, {} instances, {} lights",
            resources.meshes.len(),
            resources.textures.len(),
            scene.instances().len(),
            scene.lights().len()
        );

        self.program = Some(program);
        self.resources = Some(resources);
        self.last_frame = FrameStats::default();
        Ok(())
    }

    fn view_did_reset(&mut self, device: &mut dyn RenderDevice, width: u32, height: u32) {
        self.aspect_ratio = if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        device.set_viewport(width, height);
        log::debug!("Viewport {width}x{height}, aspect {:.3}", self.aspect_ratio);
    }

    fn view_did_stop(&mut self, device: &mut dyn RenderDevice) {
        self.release(device);
        log::info!("View stopped");
    }

    fn view_render(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Context,
    ) -> Result<(), ViewerError> {
        let (Some(program), Some(resources)) = (self.program, self.resources.as_ref()) else {
            return Err(ViewerError::NotStarted);
        };

        if let Some(instance) = scene
            .instances()
            .iter()
            .find(|instance| resources.meshes.get(instance.mesh_id).is_none())
        {
            return Err(ViewerError::MissingMesh(instance.mesh_id));
        }

        let view = scene.camera().view_matrix(scene.up_direction());
        let frame = FrameInputs {
            program,
            projection_view: self.projection_matrix() * view,
            normal_shading: self.normal_shading,
        };

        device.begin_frame(&ClearState {
            colour: self.settings.clear_colour,
            depth: 1.0,
        })?;
        let drawn = encode_frame(device, &frame, resources, scene);
        let ended = device.end_frame();

        self.last_frame = drawn?;
        ended?;
        Ok(())
    }
}

struct FrameInputs {
    program: ProgramId,
    projection_view: Matrix4<f32>,
    normal_shading: bool,
}

fn encode_frame(
    device: &mut dyn RenderDevice,
    frame: &FrameInputs,
    resources: &GpuResources,
    scene: &Context,
) -> Result<FrameStats, GpuError> {
    device.use_program(frame.program)?;

    let camera_position: [f32; 3] = scene.camera().position.into();
    device.set_uniform(Uniform::CameraPosition, UniformValue::Vec3(camera_position))?;
    device.set_uniform(
        Uniform::ProjectionViewModelXform,
        UniformValue::Mat4(frame.projection_view.into()),
    )?;
    for unit in [TextureUnit::Diffuse, TextureUnit::Specular] {
        device.set_uniform(unit.sampler_uniform(), UniformValue::Int(unit.index() as i32))?;
    }
    device.set_uniform(Uniform::ToggleNormal, UniformValue::Bool(frame.normal_shading))?;

    let lights = scene.lights();
    let positions: Vec<[f32; 3]> = lights.iter().map(|l| l.position.into()).collect();
    let intensities: Vec<[f32; 3]> = lights.iter().map(|l| l.intensity.into()).collect();
    let ranges: Vec<f32> = lights.iter().map(|l| l.range).collect();
    device.set_uniform(Uniform::LightPosition, UniformValue::Vec3Array(&positions))?;
    device.set_uniform(Uniform::LightIntensity, UniformValue::Vec3Array(&intensities))?;
    device.set_uniform(Uniform::LightRange, UniformValue::FloatArray(&ranges))?;

    let mut stats = FrameStats::default();
    for instance in scene.instances() {
        let Some(mesh) = resources.meshes.get(instance.mesh_id) else {
            continue;
        };
        let material = scene.material_by_id(instance.material_id);

        device.set_uniform(Uniform::ModelXform, UniformValue::Mat4(instance.transform.into()))?;
        upload_material(device, material, resources)?;
        device.draw_indexed(mesh.layout, mesh.index_count)?;

        stats.draw_calls += 1;
        stats.indices += u64::from(mesh.index_count);
    }

    Ok(stats)
}

fn upload_material(
    device: &mut dyn RenderDevice,
    material: &Material,
    resources: &GpuResources,
) -> Result<(), GpuError> {
    device.set_uniform(
        Uniform::DiffuseMaterialColour,
        UniformValue::Vec3(material.diffuse_colour.into()),
    )?;
    device.set_uniform(
        Uniform::AmbientMaterialColour,
        UniformValue::Vec3(material.ambient_colour.into()),
    )?;
    device.set_uniform(
        Uniform::SpecularColour,
        UniformValue::Vec3(material.specular_colour.into()),
    )?;
    device.set_uniform(Uniform::Shininess, UniformValue::Float(material.shininess))?;

    let slots = [
        (
            TextureUnit::Diffuse,
            Uniform::UseDiffTexture,
            material.diffuse_texture(),
        ),
        (
            TextureUnit::Specular,
            Uniform::UseSpecTexture,
            material.specular_texture(),
        ),
    ];
    for (unit, flag, filename) in slots {
        let texture = resources.textures.resolve(filename);
        if texture.is_some() {
            device.bind_texture(unit, texture)?;
        }
        device.set_uniform(flag, UniformValue::Bool(texture.is_some()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, Point3, SquareMatrix, Vector3, Vector4};

    use super::*;
    use crate::{
        geometry::{primitives, MeshCollection},
        gfx::testing::{Call, Recorded, RecordingDevice},
        imaging::{DecodedImage, MemoryDecoder},
        scene::{Light, MaterialId, MeshId, SceneBuilder},
    };

    fn brick_decoder() -> Box<dyn ImageDecoder> {
        Box::new(
            MemoryDecoder::new()
                .with_image("brick.png", DecodedImage::from_rgba8(1, 1, vec![180, 60, 40, 255])),
        )
    }

    fn quad_geometry() -> MeshCollection {
        MeshCollection::new(vec![primitives::unit_quad(MeshId(0))])
    }

    fn red_quad_scene(geometry: &MeshCollection) -> Context {
        let mut builder = SceneBuilder::new();
        let red = builder.add_material(|m| m.diffuse_colour = Vector3::new(1.0, 0.0, 0.0));
        builder.add_instance(MeshId(0), red, Matrix4::identity());
        builder.build(geometry).unwrap()
    }

    fn started(scene: &Context, geometry: &MeshCollection) -> (SceneRenderer, RecordingDevice) {
        let mut renderer = SceneRenderer::new(RenderSettings::default(), brick_decoder());
        let mut device = RecordingDevice::new();
        renderer
            .view_will_start(&mut device, scene, geometry)
            .unwrap();
        (renderer, device)
    }

    #[test]
    fn test_single_quad_draws_once_untextured() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let (mut renderer, mut device) = started(&scene, &geometry);

        renderer.view_render(&mut device, &scene).unwrap();

        let draws = device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].index_count, 6);
        assert_eq!(draws[0].flag(Uniform::UseDiffTexture), Some(false));
        assert_eq!(draws[0].flag(Uniform::UseSpecTexture), Some(false));
        assert_eq!(
            draws[0].uniform(Uniform::DiffuseMaterialColour),
            Some(&Recorded::Vec3([1.0, 0.0, 0.0]))
        );
        assert_eq!(draws[0].textures, [None, None]);
        assert_eq!(
            renderer.last_frame_stats(),
            FrameStats {
                draw_calls: 1,
                indices: 6
            }
        );
    }

    #[test]
    fn test_shared_texture_binds_same_handle() {
        let geometry = quad_geometry();
        let mut builder = SceneBuilder::new();
        let brick = Material::fallback(MaterialId(0)).with_diffuse_texture("brick.png");
        let a = builder.push_material(brick.clone());
        let b = builder.push_material(brick);
        builder.add_instance(MeshId(0), a, Matrix4::identity());
        builder.add_instance(MeshId(0), b, Matrix4::from_scale(2.0));
        let scene = builder.build(&geometry).unwrap();

        let (mut renderer, mut device) = started(&scene, &geometry);
        assert_eq!(renderer.resources().unwrap().textures.len(), 1);

        renderer.view_render(&mut device, &scene).unwrap();

        let draws = device.draws();
        assert_eq!(draws.len(), 2);
        for draw in &draws {
            assert_eq!(draw.flag(Uniform::UseDiffTexture), Some(true));
            assert_eq!(draw.flag(Uniform::UseSpecTexture), Some(false));
        }
        assert!(draws[0].textures[0].is_some());
        assert_eq!(draws[0].textures[0], draws[1].textures[0]);
    }

    #[test]
    fn test_diffuse_and_specular_bind_to_their_units() {
        let geometry = quad_geometry();
        let mut builder = SceneBuilder::new();
        let textured = builder.push_material(
            Material::fallback(MaterialId(0))
                .with_diffuse_texture("brick.png")
                .with_specular_texture("brick_spec.png"),
        );
        builder.add_instance(MeshId(0), textured, Matrix4::identity());
        let scene = builder.build(&geometry).unwrap();

        let decoder = MemoryDecoder::new()
            .with_image("brick.png", DecodedImage::from_rgba8(1, 1, vec![180, 60, 40, 255]))
            .with_image("brick_spec.png", DecodedImage::from_rgba8(1, 1, vec![255; 4]));
        let mut renderer = SceneRenderer::new(RenderSettings::default(), Box::new(decoder));
        let mut device = RecordingDevice::new();
        renderer
            .view_will_start(&mut device, &scene, &geometry)
            .unwrap();

        let textures = &renderer.resources().unwrap().textures;
        assert_eq!(textures.len(), 2);
        let diffuse = textures.resolve(Some("brick.png"));
        let specular = textures.resolve(Some("brick_spec.png"));
        assert!(diffuse.is_some() && specular.is_some());
        assert_ne!(diffuse, specular);

        renderer.view_render(&mut device, &scene).unwrap();

        let binds: Vec<&Call> = device
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::BindTexture(..)))
            .collect();
        assert_eq!(
            binds,
            [
                &Call::BindTexture(TextureUnit::Diffuse, diffuse),
                &Call::BindTexture(TextureUnit::Specular, specular),
            ]
        );

        let draws = device.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].textures, [diffuse, specular]);
        assert_eq!(draws[0].flag(Uniform::UseDiffTexture), Some(true));
        assert_eq!(draws[0].flag(Uniform::UseSpecTexture), Some(true));
        assert_eq!(draws[0].uniform(Uniform::DiffTexSample), Some(&Recorded::Int(0)));
        assert_eq!(draws[0].uniform(Uniform::SpecTexSample), Some(&Recorded::Int(1)));
    }

    #[test]
    fn test_failed_texture_matches_missing_filename() {
        let geometry = quad_geometry();
        let mut builder = SceneBuilder::new();
        let broken = builder.push_material(
            Material::fallback(MaterialId(0))
                .with_diffuse_texture("missing.png")
                .with_specular_texture("missing_spec.png"),
        );
        let plain = builder.add_material(|_| {});
        builder.add_instance(MeshId(0), broken, Matrix4::identity());
        builder.add_instance(MeshId(0), plain, Matrix4::identity());
        let scene = builder.build(&geometry).unwrap();

        let (mut renderer, mut device) = started(&scene, &geometry);
        for _ in 0..2 {
            renderer.view_render(&mut device, &scene).unwrap();
        }

        let draws = device.draws();
        assert_eq!(draws.len(), 4);
        for pair in draws.chunks_exact(2) {
            let (broken, plain) = (&pair[0], &pair[1]);
            assert_eq!(broken.textures, plain.textures);
            for flag in [Uniform::UseDiffTexture, Uniform::UseSpecTexture] {
                assert_eq!(broken.flag(flag), Some(false));
                assert_eq!(broken.flag(flag), plain.flag(flag));
            }
        }
    }

    #[test]
    fn test_lights_uploaded_as_arrays() {
        let geometry = quad_geometry();
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(|_| {});
        builder.add_instance(MeshId(0), material, Matrix4::identity());
        builder.add_light(Light::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0), 10.0));
        builder.add_light(Light::new(Point3::new(-1.0, 0.0, 0.0), Vector3::new(0.5, 0.0, 0.0), 4.0));
        let scene = builder.build(&geometry).unwrap();

        let (mut renderer, mut device) = started(&scene, &geometry);
        device.clear_calls();
        renderer.view_render(&mut device, &scene).unwrap();

        let light_uploads: Vec<&Call> = device
            .calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::SetUniform(
                        Uniform::LightPosition | Uniform::LightIntensity | Uniform::LightRange,
                        _
                    )
                )
            })
            .collect();
        assert_eq!(
            light_uploads,
            vec![
                &Call::SetUniform(
                    Uniform::LightPosition,
                    Recorded::Vec3Array(vec![[1.0, 2.0, 3.0], [-1.0, 0.0, 0.0]])
                ),
                &Call::SetUniform(
                    Uniform::LightIntensity,
                    Recorded::Vec3Array(vec![[1.0, 1.0, 1.0], [0.5, 0.0, 0.0]])
                ),
                &Call::SetUniform(Uniform::LightRange, Recorded::FloatArray(vec![10.0, 4.0])),
            ]
        );
    }

    #[test]
    fn test_frame_order() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let (mut renderer, mut device) = started(&scene, &geometry);
        device.clear_calls();

        renderer.view_render(&mut device, &scene).unwrap();

        let calls = device.calls();
        assert_eq!(calls.first(), Some(&Call::BeginFrame));
        assert!(matches!(calls.get(1), Some(Call::UseProgram(_))));
        assert_eq!(calls.last(), Some(&Call::EndFrame));

        let position_of = |uniform: Uniform| {
            calls
                .iter()
                .position(|call| matches!(call, Call::SetUniform(u, _) if *u == uniform))
                .unwrap()
        };
        let draw = calls
            .iter()
            .position(|call| matches!(call, Call::DrawIndexed { .. }))
            .unwrap();
        assert!(position_of(Uniform::CameraPosition) < position_of(Uniform::LightPosition));
        assert!(position_of(Uniform::LightRange) < position_of(Uniform::ModelXform));
        assert!(position_of(Uniform::UseSpecTexture) < draw);
    }

    #[test]
    fn test_projection_view_upload() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let (mut renderer, mut device) = started(&scene, &geometry);
        renderer.view_did_reset(&mut device, 1600, 900);
        renderer.view_render(&mut device, &scene).unwrap();

        let expected: [[f32; 4]; 4] = (renderer.projection_matrix()
            * scene.camera().view_matrix(scene.up_direction()))
        .into();
        let draws = device.draws();
        assert_eq!(
            draws[0].uniform(Uniform::ProjectionViewModelXform),
            Some(&Recorded::Mat4(expected))
        );
        assert!(device.calls().contains(&Call::SetViewport(1600, 900)));
    }

    #[test]
    fn test_aspect_ratio() {
        let mut renderer = SceneRenderer::new(RenderSettings::default(), brick_decoder());
        let mut device = RecordingDevice::new();
        assert_eq!(renderer.aspect_ratio(), 1.0);

        renderer.view_did_reset(&mut device, 800, 400);
        assert_eq!(renderer.aspect_ratio(), 2.0);

        renderer.view_did_reset(&mut device, 800, 0);
        assert_eq!(renderer.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_projection_depth_range() {
        let renderer = SceneRenderer::new(RenderSettings::default(), brick_decoder());
        let projection = renderer.projection_matrix();

        let near = projection * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = projection * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_normal_shading_toggle() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let (mut renderer, mut device) = started(&scene, &geometry);

        renderer.set_normal_shading(true);
        renderer.view_render(&mut device, &scene).unwrap();

        assert!(renderer.normal_shading());
        assert_eq!(device.draws()[0].flag(Uniform::ToggleNormal), Some(true));
    }

    #[test]
    fn test_render_before_start() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let mut renderer = SceneRenderer::new(RenderSettings::default(), brick_decoder());
        let mut device = RecordingDevice::new();

        let result = renderer.view_render(&mut device, &scene);
        assert!(matches!(result, Err(ViewerError::NotStarted)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_missing_mesh_is_reported() {
        let scene_geometry = MeshCollection::new(vec![
            primitives::unit_quad(MeshId(0)),
            primitives::cube(MeshId(1)),
        ]);
        let mut builder = SceneBuilder::new();
        let material = builder.add_material(|_| {});
        builder.add_instance(MeshId(1), material, Matrix4::identity());
        let scene = builder.build(&scene_geometry).unwrap();

        let (mut renderer, mut device) = started(&scene, &quad_geometry());
        let result = renderer.view_render(&mut device, &scene);

        assert!(matches!(result, Err(ViewerError::MissingMesh(MeshId(1)))));
    }

    #[test]
    fn test_stop_releases_everything() {
        let geometry = quad_geometry();
        let mut builder = SceneBuilder::new();
        let material = builder.push_material(
            Material::fallback(MaterialId(0)).with_diffuse_texture("brick.png"),
        );
        builder.add_instance(MeshId(0), material, Matrix4::identity());
        let scene = builder.build(&geometry).unwrap();

        let (mut renderer, mut device) = started(&scene, &geometry);
        assert_eq!(device.live_programs(), 1);
        assert_eq!(device.live_textures(), 1);

        renderer.view_did_stop(&mut device);

        assert!(!renderer.is_started());
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_vertex_layouts(), 0);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn test_shader_failure_is_an_error() {
        let geometry = quad_geometry();
        let scene = red_quad_scene(&geometry);
        let mut renderer = SceneRenderer::new(RenderSettings::default(), brick_decoder());
        let mut device = RecordingDevice::new();
        device.fail_program_creation();

        let result = renderer.view_will_start(&mut device, &scene, &geometry);

        assert!(matches!(
            result,
            Err(ViewerError::Gpu(GpuError::ShaderCompilation { .. }))
        ));
        assert!(!renderer.is_started());
        assert_eq!(device.live_buffers(), 0);
    }
}
