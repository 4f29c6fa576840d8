// src/lib.rs
//! Sponza Viewer
//!
//! A real-time viewer for static 3D scenes built on wgpu and winit: OBJ/MTL
//! scenes are drawn with per-pixel Phong lighting from a set of point lights,
//! under a first-person or animated camera.

pub mod app;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gfx;
pub mod imaging;
pub mod scene;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{run, ViewerApp};
pub use config::ViewerConfig;
