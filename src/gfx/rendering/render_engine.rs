//! WGPU-based rendering engine for the scene viewer
//!
//! Implements [`RenderDevice`] on top of wgpu. Resources live in handle
//! tables; frame commands are staged between `begin_frame` and `end_frame`
//! and encoded into a single render pass when the frame ends.

use std::{borrow::Cow, collections::HashMap};

use wgpu::util::DeviceExt;

use crate::{
    error::GpuError,
    gfx::{
        device::{
            BufferId, BufferKind, ClearState, ProgramId, ProgramSource, RenderDevice,
            SamplerSettings, TextureId, UniformValue, VertexBinding, VertexLayoutId,
        },
        resources::{mipmap::MipmapGenerator, texture_resource::TextureResource},
        shader_interface::{missing_uniforms, TextureUnit, Uniform, MESH_VERTEX_LAYOUT},
    },
    imaging::{to_rgba8, DecodedImage},
    wgpu_utils::{binding_types, ArrayBuffer, DynamicUniformBuffer, UniformBuffer},
};

use super::{
    pipeline::{create_program_pipeline, PipelineConfig},
    uniforms::{FrameUniforms, InstanceUniforms, PaddedVec3},
};

type TexturePair = [Option<TextureId>; 2];

struct VertexLayout {
    vertex_buffers: Vec<(u32, BufferId)>,
    index_buffer: BufferId,
}

struct DrawCommand {
    program: ProgramId,
    layout: VertexLayoutId,
    index_count: u32,
    textures: TexturePair,
}

/// Everything recorded between `begin_frame` and `end_frame`.
struct FrameState {
    clear: ClearState,
    program: Option<ProgramId>,
    frame: FrameUniforms,
    light_positions: Vec<PaddedVec3>,
    light_intensities: Vec<PaddedVec3>,
    light_ranges: Vec<f32>,
    current: InstanceUniforms,
    textures: TexturePair,
    instances: Vec<InstanceUniforms>,
    draws: Vec<DrawCommand>,
}

impl FrameState {
    fn new(clear: ClearState) -> Self {
        Self {
            clear,
            program: None,
            frame: FrameUniforms::default(),
            light_positions: Vec::new(),
            light_intensities: Vec::new(),
            light_ranges: Vec::new(),
            current: InstanceUniforms::default(),
            textures: [None, None],
            instances: Vec::new(),
            draws: Vec::new(),
        }
    }

    fn light_count(&self) -> usize {
        self.light_positions
            .len()
            .min(self.light_intensities.len())
            .min(self.light_ranges.len())
    }
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles all low-level graphics operations including:
/// - Surface and device management
/// - Handle tables for buffers, vertex layouts, textures and programs
/// - Depth buffer handling
/// - Uniform staging and bind group caching
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    present_modes: Vec<wgpu::PresentMode>,
    depth_texture: TextureResource,

    mipmaps: MipmapGenerator,
    fallback_texture: TextureResource,

    frame_layout: wgpu::BindGroupLayout,
    instance_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,

    frame_uniforms: UniformBuffer<FrameUniforms>,
    light_positions: ArrayBuffer<PaddedVec3>,
    light_intensities: ArrayBuffer<PaddedVec3>,
    light_ranges: ArrayBuffer<f32>,
    frame_bind_group: wgpu::BindGroup,
    instance_uniforms: DynamicUniformBuffer<InstanceUniforms>,
    instance_bind_group: wgpu::BindGroup,
    material_bind_groups: HashMap<TexturePair, wgpu::BindGroup>,

    next_id: u32,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    layouts: HashMap<VertexLayoutId, VertexLayout>,
    textures: HashMap<TextureId, TextureResource>,
    programs: HashMap<ProgramId, wgpu::RenderPipeline>,

    frame: Option<FrameState>,
}

const INITIAL_LIGHT_CAPACITY: usize = 8;
const INITIAL_DRAW_CAPACITY: usize = 64;

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu with default settings and creates the depth buffer,
    /// the shared bind group layouts and the per-frame uniform buffers.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Present with vertical sync
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<RenderEngine, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuError::Adapter(e.to_string()))?;
        log::info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GpuError::Device(e.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| GpuError::Surface("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: choose_present_mode(&surface_capabilities.present_modes, vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let mut mipmaps = MipmapGenerator::new(&device);
        let fallback_texture = TextureResource::create_fallback(&device, &queue, &mut mipmaps);

        let frame_layout = create_frame_layout(&device);
        let instance_layout = create_instance_layout(&device);
        let material_layout = create_material_layout(&device);

        let frame_uniforms = UniformBuffer::new(&device);
        let light_positions = ArrayBuffer::new(&device, INITIAL_LIGHT_CAPACITY);
        let light_intensities = ArrayBuffer::new(&device, INITIAL_LIGHT_CAPACITY);
        let light_ranges = ArrayBuffer::new(&device, INITIAL_LIGHT_CAPACITY);
        let frame_bind_group = create_frame_bind_group(
            &device,
            &frame_layout,
            &frame_uniforms,
            &light_positions,
            &light_intensities,
            &light_ranges,
        );

        let instance_uniforms = DynamicUniformBuffer::new(&device, INITIAL_DRAW_CAPACITY);
        let instance_bind_group =
            create_instance_bind_group(&device, &instance_layout, &instance_uniforms);

        log::info!(
            "Render engine ready: {}x{} {:?}, {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            present_modes: surface_capabilities.present_modes,
            depth_texture,
            mipmaps,
            fallback_texture,
            frame_layout,
            instance_layout,
            material_layout,
            frame_uniforms,
            light_positions,
            light_intensities,
            light_ranges,
            frame_bind_group,
            instance_uniforms,
            instance_bind_group,
            material_bind_groups: HashMap::new(),
            next_id: 0,
            buffers: HashMap::new(),
            layouts: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            frame: None,
        })
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn frame_mut(&mut self) -> Result<&mut FrameState, GpuError> {
        self.frame.as_mut().ok_or(GpuError::NoActiveFrame)
    }

    fn texture_fits(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width <= max && height <= max {
            return None;
        }
        let scale = max as f32 / width.max(height) as f32;
        Some((
            ((width as f32 * scale) as u32).clamp(1, max),
            ((height as f32 * scale) as u32).clamp(1, max),
        ))
    }

    fn upload_frame_data(&mut self, frame: &FrameState) {
        let mut uniforms = frame.frame;
        uniforms.light_count = frame.light_count() as u32;
        self.frame_uniforms.update_content(&self.queue, uniforms);

        let grown = [
            self.light_positions
                .ensure_capacity(&self.device, frame.light_positions.len()),
            self.light_intensities
                .ensure_capacity(&self.device, frame.light_intensities.len()),
            self.light_ranges
                .ensure_capacity(&self.device, frame.light_ranges.len()),
        ];
        self.light_positions
            .update_data(&self.queue, &frame.light_positions);
        self.light_intensities
            .update_data(&self.queue, &frame.light_intensities);
        self.light_ranges.update_data(&self.queue, &frame.light_ranges);
        if grown.contains(&true) {
            log::debug!("Light buffers grown to {}", self.light_positions.capacity());
            self.frame_bind_group = create_frame_bind_group(
                &self.device,
                &self.frame_layout,
                &self.frame_uniforms,
                &self.light_positions,
                &self.light_intensities,
                &self.light_ranges,
            );
        }

        if self
            .instance_uniforms
            .upload(&self.device, &self.queue, &frame.instances)
        {
            log::debug!("Instance uniform buffer grown for {} draws", frame.instances.len());
            self.instance_bind_group = create_instance_bind_group(
                &self.device,
                &self.instance_layout,
                &self.instance_uniforms,
            );
        }

        for draw in &frame.draws {
            if !self.material_bind_groups.contains_key(&draw.textures) {
                let bind_group = self.create_material_bind_group(draw.textures);
                self.material_bind_groups.insert(draw.textures, bind_group);
            }
        }
    }

    fn create_material_bind_group(&self, textures: TexturePair) -> wgpu::BindGroup {
        let [diffuse, specular] = textures.map(|id| {
            id.and_then(|id| self.textures.get(&id))
                .unwrap_or(&self.fallback_texture)
        });

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular.sampler),
                },
            ],
        })
    }

    fn acquire_surface_texture(&mut self) -> Result<Option<wgpu::SurfaceTexture>, GpuError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture; dropping frame");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn encode_frame(&self, frame: &FrameState, target: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = frame.clear.colour.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            let mut current_program = None;
            for (index, draw) in frame.draws.iter().enumerate() {
                let (Some(pipeline), Some(layout), Some(material)) = (
                    self.programs.get(&draw.program),
                    self.layouts.get(&draw.layout),
                    self.material_bind_groups.get(&draw.textures),
                ) else {
                    log::warn!("Skipping draw {index}: a resource was released mid-frame");
                    continue;
                };
                let Some(index_buffer) = self.buffers.get(&layout.index_buffer) else {
                    continue;
                };

                if current_program != Some(draw.program) {
                    render_pass.set_pipeline(pipeline);
                    current_program = Some(draw.program);
                }
                render_pass.set_bind_group(
                    1,
                    &self.instance_bind_group,
                    &[self.instance_uniforms.offset(index)],
                );
                render_pass.set_bind_group(2, material, &[]);
                for (slot, buffer) in &layout.vertex_buffers {
                    if let Some(buffer) = self.buffers.get(buffer) {
                        render_pass.set_vertex_buffer(*slot, buffer.slice(..));
                    }
                }
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        encoder.finish()
    }
}

impl RenderDevice for RenderEngine {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferId, GpuError> {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            });

        let id = BufferId(self.next_id());
        log::trace!("Buffer '{label}' ({} bytes) -> {id:?}", contents.len());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn create_vertex_layout(
        &mut self,
        label: &str,
        bindings: &[VertexBinding],
        index_buffer: BufferId,
    ) -> Result<VertexLayoutId, GpuError> {
        for buffer in bindings.iter().map(|b| b.buffer).chain([index_buffer]) {
            if !self.buffers.contains_key(&buffer) {
                return Err(GpuError::UnknownHandle {
                    kind: "buffer",
                    id: buffer.0,
                });
            }
        }
        for binding in bindings {
            let expected = MESH_VERTEX_LAYOUT
                .iter()
                .find(|attribute| attribute.slot == binding.slot);
            if expected.map(|attribute| attribute.format) != Some(binding.format) {
                log::warn!(
                    "Vertex layout '{label}' binds {:?} at slot {}, which the pipeline does not expect",
                    binding.format,
                    binding.slot
                );
            }
        }

        let id = VertexLayoutId(self.next_id());
        self.layouts.insert(
            id,
            VertexLayout {
                vertex_buffers: bindings.iter().map(|b| (b.slot, b.buffer)).collect(),
                index_buffer,
            },
        );
        Ok(id)
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &DecodedImage,
        sampler: &SamplerSettings,
    ) -> Result<TextureId, GpuError> {
        if !image.contains_data() {
            return Err(GpuError::Device(format!(
                "texture '{label}' has malformed pixel data"
            )));
        }
        let mut rgba = to_rgba8(image);
        let (mut width, mut height) = (image.width, image.height);

        if let Some((fit_width, fit_height)) = self.texture_fits(width, height) {
            log::warn!(
                "Texture '{label}' ({width}x{height}) exceeds the device limit; resizing to {fit_width}x{fit_height}"
            );
            let source = image::RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
                GpuError::Device(format!("texture '{label}' has truncated pixel data"))
            })?;
            rgba = image::imageops::resize(
                &source,
                fit_width,
                fit_height,
                image::imageops::FilterType::Triangle,
            )
            .into_raw();
            (width, height) = (fit_width, fit_height);
        }

        let resource = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            &mut self.mipmaps,
            &rgba,
            width,
            height,
            label,
            sampler,
        );
        log::debug!(
            "Texture '{label}' {width}x{height}, {} mip levels",
            resource.texture.mip_level_count()
        );

        let id = TextureId(self.next_id());
        self.textures.insert(id, resource);
        Ok(id)
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError> {
        for uniform in missing_uniforms(&[source.vertex, source.fragment]) {
            log::warn!(
                "Program '{}' does not declare uniform '{}'",
                source.label,
                uniform.name()
            );
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} Vertex", source.label)),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source.vertex)),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} Fragment", source.label)),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source.fragment)),
            });

        let config = PipelineConfig::default()
            .with_label(source.label)
            .with_bind_group_layouts(vec![
                self.frame_layout.clone(),
                self.instance_layout.clone(),
                self.material_layout.clone(),
            ])
            .with_color_format(self.config.format);
        let pipeline = create_program_pipeline(&self.device, &vertex, &fragment, &config);

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            let details = error.to_string();
            log::error!("Program '{}' failed to build:\n{details}", source.label);
            return Err(GpuError::ShaderCompilation {
                label: source.label.to_string(),
                details,
            });
        }

        let id = ProgramId(self.next_id());
        log::info!("Program '{}' -> {id:?}", source.label);
        self.programs.insert(id, pipeline);
        Ok(id)
    }

    fn release_buffer(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.remove(&id) {
            buffer.destroy();
        }
    }

    fn release_vertex_layout(&mut self, id: VertexLayoutId) {
        self.layouts.remove(&id);
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.material_bind_groups
                .retain(|pair, _| !pair.contains(&Some(id)));
        }
    }

    fn release_program(&mut self, id: ProgramId) {
        self.programs.remove(&id);
    }

    /// Validates dimensions and ignores a zero-sized viewport. Recreates the
    /// depth texture to match new dimensions.
    fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        // Reconfigure surface with new dimensions
        self.surface.configure(&self.device, &self.config);

        // Recreate depth texture to match new surface size
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    fn begin_frame(&mut self, clear: &ClearState) -> Result<(), GpuError> {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice; discarding the unfinished frame");
        }
        self.frame = Some(FrameState::new(*clear));
        Ok(())
    }

    fn use_program(&mut self, id: ProgramId) -> Result<(), GpuError> {
        if !self.programs.contains_key(&id) {
            return Err(GpuError::UnknownHandle {
                kind: "program",
                id: id.0,
            });
        }
        self.frame_mut()?.program = Some(id);
        Ok(())
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) -> Result<(), GpuError> {
        let frame = self.frame_mut()?;
        let mismatch = || GpuError::UniformType {
            uniform: uniform.name(),
            expected: uniform.expected_kind(),
            found: value.kind(),
        };

        match (uniform, value) {
            (Uniform::ProjectionViewModelXform, UniformValue::Mat4(m)) => {
                frame.frame.projection_view_model_xform = m;
            }
            (Uniform::CameraPosition, UniformValue::Vec3(v)) => frame.frame.camera_position = v,
            (Uniform::ToggleNormal, UniformValue::Bool(b)) => frame.frame.toggle_normal = b.into(),
            (Uniform::LightPosition, UniformValue::Vec3Array(values)) => {
                frame.light_positions = values.iter().copied().map(PaddedVec3::from).collect();
            }
            (Uniform::LightIntensity, UniformValue::Vec3Array(values)) => {
                frame.light_intensities = values.iter().copied().map(PaddedVec3::from).collect();
            }
            (Uniform::LightRange, UniformValue::FloatArray(values)) => {
                frame.light_ranges = values.to_vec();
            }
            (Uniform::ModelXform, UniformValue::Mat4(m)) => frame.current.model_xform = m,
            (Uniform::DiffuseMaterialColour, UniformValue::Vec3(v)) => {
                frame.current.diffuse_material_colour = v;
            }
            (Uniform::AmbientMaterialColour, UniformValue::Vec3(v)) => {
                frame.current.ambient_material_colour = v;
            }
            (Uniform::SpecularColour, UniformValue::Vec3(v)) => frame.current.specular_colour = v,
            (Uniform::Shininess, UniformValue::Float(f)) => frame.current.shininess = f,
            (Uniform::UseDiffTexture, UniformValue::Bool(b)) => {
                frame.current.use_diff_texture = b.into();
            }
            (Uniform::UseSpecTexture, UniformValue::Bool(b)) => {
                frame.current.use_spec_texture = b.into();
            }
            (Uniform::DiffTexSample | Uniform::SpecTexSample, UniformValue::Int(unit)) => {
                let expected = match uniform {
                    Uniform::SpecTexSample => TextureUnit::Specular,
                    _ => TextureUnit::Diffuse,
                };
                if unit != expected.index() as i32 {
                    log::warn!(
                        "'{}' is fixed to texture unit {}; ignoring unit {unit}",
                        uniform.name(),
                        expected.index()
                    );
                }
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    fn bind_texture(
        &mut self,
        unit: TextureUnit,
        texture: Option<TextureId>,
    ) -> Result<(), GpuError> {
        if let Some(id) = texture {
            if !self.textures.contains_key(&id) {
                return Err(GpuError::UnknownHandle {
                    kind: "texture",
                    id: id.0,
                });
            }
        }
        self.frame_mut()?.textures[unit.index()] = texture;
        Ok(())
    }

    fn draw_indexed(&mut self, layout: VertexLayoutId, index_count: u32) -> Result<(), GpuError> {
        if !self.layouts.contains_key(&layout) {
            return Err(GpuError::UnknownHandle {
                kind: "vertex layout",
                id: layout.0,
            });
        }

        let frame = self.frame_mut()?;
        let program = frame.program.ok_or(GpuError::NoProgram)?;
        if index_count == 0 {
            return Ok(());
        }

        frame.instances.push(frame.current);
        frame.draws.push(DrawCommand {
            program,
            layout,
            index_count,
            textures: frame.textures,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        let frame = self.frame.take().ok_or(GpuError::NoActiveFrame)?;

        self.upload_frame_data(&frame);

        let Some(surface_texture) = self.acquire_surface_texture()? else {
            return Ok(());
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let commands = self.encode_frame(&frame, &view);
        self.queue.submit(std::iter::once(commands));
        surface_texture.present();
        Ok(())
    }
}

fn choose_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else if modes.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn create_frame_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    use wgpu::ShaderStages;

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Frame Layout"),
        entries: &[
            binding_types::entry(
                0,
                ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                binding_types::uniform(),
            ),
            binding_types::entry(1, ShaderStages::FRAGMENT, binding_types::storage_buffer_read_only()),
            binding_types::entry(2, ShaderStages::FRAGMENT, binding_types::storage_buffer_read_only()),
            binding_types::entry(3, ShaderStages::FRAGMENT, binding_types::storage_buffer_read_only()),
        ],
    })
}

fn create_instance_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Instance Layout"),
        entries: &[binding_types::entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            binding_types::uniform_dynamic(std::mem::size_of::<InstanceUniforms>() as u64),
        )],
    })
}

fn create_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    use wgpu::{SamplerBindingType::Filtering, ShaderStages};

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material Layout"),
        entries: &[
            binding_types::entry(0, ShaderStages::FRAGMENT, binding_types::texture_2d()),
            binding_types::entry(1, ShaderStages::FRAGMENT, binding_types::sampler(Filtering)),
            binding_types::entry(2, ShaderStages::FRAGMENT, binding_types::texture_2d()),
            binding_types::entry(3, ShaderStages::FRAGMENT, binding_types::sampler(Filtering)),
        ],
    })
}

fn create_frame_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &UniformBuffer<FrameUniforms>,
    positions: &ArrayBuffer<PaddedVec3>,
    intensities: &ArrayBuffer<PaddedVec3>,
    ranges: &ArrayBuffer<f32>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Frame Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: positions.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: intensities.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: ranges.binding_resource(),
            },
        ],
    })
}

fn create_instance_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &DynamicUniformBuffer<InstanceUniforms>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Instance Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniforms.binding_resource(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vsync_always_uses_fifo() {
        let modes = [wgpu::PresentMode::Immediate, wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&modes, true), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn test_no_vsync_prefers_immediate() {
        let with_immediate = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];
        let fifo_only = [wgpu::PresentMode::Fifo];

        assert_eq!(
            choose_present_mode(&with_immediate, false),
            wgpu::PresentMode::Immediate
        );
        assert_eq!(
            choose_present_mode(&fifo_only, false),
            wgpu::PresentMode::AutoNoVsync
        );
    }

    #[test]
    fn test_light_count_uses_shortest_array() {
        let mut frame = FrameState::new(ClearState {
            colour: [0.0; 4],
            depth: 1.0,
        });
        frame.light_positions = vec![[0.0; 3].into(); 3];
        frame.light_intensities = vec![[1.0; 3].into(); 2];
        frame.light_ranges = vec![5.0; 3];

        assert_eq!(frame.light_count(), 2);
    }
}
