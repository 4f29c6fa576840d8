//! Render pipeline creation for linked shader programs
//!
//! A program is a vertex module and a fragment module compiled from separate
//! WGSL sources and linked into one pipeline against the shared bind group
//! layouts.

use wgpu::*;

use crate::gfx::resources::TextureResource;

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: Some(TextureResource::DEPTH_FORMAT),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Sets all bind group layouts at once (builder pattern)
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Single opaque colour target of `format` (builder pattern)
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }
}

static POSITION: [VertexAttribute; 1] = vertex_attr_array![0 => Float32x3];
static NORMAL: [VertexAttribute; 1] = vertex_attr_array![1 => Float32x3];
static TEXCOORD: [VertexAttribute; 1] = vertex_attr_array![2 => Float32x2];

fn single_attribute(attributes: &'static [VertexAttribute]) -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: attributes[0].format.size(),
        step_mode: VertexStepMode::Vertex,
        attributes,
    }
}

/// Vertex buffer layouts for the per-attribute mesh buffers, in slot order.
pub fn mesh_vertex_buffers() -> [VertexBufferLayout<'static>; 3] {
    [
        single_attribute(&POSITION),
        single_attribute(&NORMAL),
        single_attribute(&TEXCOORD),
    ]
}

/// Links `vertex` and `fragment` into a pipeline drawing indexed meshes.
pub fn create_program_pipeline(
    device: &Device,
    vertex: &ShaderModule,
    fragment: &ShaderModule,
    config: &PipelineConfig,
) -> RenderPipeline {
    let bind_group_layout_refs: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(&format!("{} Layout", config.label)),
        bind_group_layouts: &bind_group_layout_refs,
        push_constant_ranges: &[],
    });

    let depth_stencil = config.depth_format.map(|format| DepthStencilState {
        format,
        depth_write_enabled: true,
        depth_compare: CompareFunction::Less,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    });

    let vertex_buffers = mesh_vertex_buffers();

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(&config.label),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            buffers: &vertex_buffers,
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            targets: &config.color_targets,
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: config.primitive_topology,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: config.cull_mode,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
