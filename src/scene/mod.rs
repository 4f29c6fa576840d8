//! # Scene Model
//!
//! The in-memory description of what gets drawn: a camera, point lights,
//! materials and mesh instances, plus the time-driven camera behaviour.
//!
//! A [`Context`] is built once through [`SceneBuilder`] (or loaded with
//! [`load_obj_scene`]) and afterwards only its camera changes, inside
//! [`Context::update`].

mod builder;
mod camera;
mod context;
mod ids;
mod instance;
mod light;
pub mod loader;
mod material;
mod movement;

pub use builder::SceneBuilder;
pub use camera::{Camera, CameraAnimation};
pub use context::{Context, SceneStatistics};
pub use ids::{InstanceId, MaterialId, MeshId};
pub use instance::Instance;
pub use light::Light;
pub use loader::{demo_scene, load_obj_scene, SceneAsset};
pub use material::Material;
pub use movement::FirstPersonMovement;
