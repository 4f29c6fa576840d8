//! # Graphics Module
//!
//! Everything between the scene model and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Device seam** ([`device`]) - handle-based [`RenderDevice`] trait the
//!   renderer talks to
//! - **Shader interface** ([`shader_interface`]) - attribute slots, uniform
//!   names and texture units shared with the WGSL sources
//! - **Resource Management** ([`resources`]) - mesh buffers and the texture
//!   table, built once at startup
//! - **Rendering Pipeline** ([`rendering`]) - the wgpu backend and the Phong
//!   [`SceneRenderer`]
//! - **Lifecycle** ([`view`]) - callbacks a windowing host drives
//!
//! ## Usage
//!
//! ```no_run
//! use sponza_viewer::config::RenderSettings;
//! use sponza_viewer::gfx::SceneRenderer;
//! use sponza_viewer::imaging::PngDecoder;
//!
//! // The render engine is created by the app once a window exists
//! // let engine = RenderEngine::new(window, width, height, true).await?;
//! let renderer = SceneRenderer::new(RenderSettings::default(), Box::new(PngDecoder::new("assets")));
//! ```

pub mod device;
pub mod rendering;
pub mod resources;
pub mod shader_interface;
pub mod view;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use device::RenderDevice;
pub use rendering::{RenderEngine, SceneRenderer};
pub use view::ViewDelegate;
