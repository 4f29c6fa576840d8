// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Provides typed buffer wrappers and binding type shorthands.

pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use uniform_buffer::{ArrayBuffer, DynamicUniformBuffer, UniformBuffer};
