// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The wgpu device backend, the Phong pipeline and the per-frame scene
//! renderer that drives it.

pub mod pipeline;
pub mod render_engine;
pub mod scene_renderer;
pub mod uniforms;

// Re-export main types
pub use pipeline::PipelineConfig;
pub use render_engine::RenderEngine;
pub use scene_renderer::{FrameStats, SceneRenderer};
