//! Viewer configuration
//!
//! Plain structs with sensible defaults and consuming `with_*` builders.
//! [`ViewerConfig::from_env`] layers a few environment overrides on top.

use std::path::PathBuf;

use cgmath::{Point3, Vector3};

use crate::scene::{Camera, CameraAnimation, Light};

/// Fixed projection and clear state used by the frame renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub clear_colour: [f32; 4],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_colour: [0.0, 0.0, 0.25, 0.0],
            fov_y_degrees: 75.0,
            near_plane: 1.0,
            far_plane: 1000.0,
        }
    }
}

impl RenderSettings {
    pub fn with_clear_colour(mut self, colour: [f32; 4]) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_fov_y_degrees(mut self, degrees: f32) -> Self {
        self.fov_y_degrees = degrees;
        self
    }

    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near_plane = near;
        self.far_plane = far;
        self
    }
}

/// Scene data the asset source does not carry: lights, ambient term and camera.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub lights: Vec<Light>,
    pub ambient_light_intensity: Vector3<f32>,
    pub camera: Camera,
    pub camera_animation: CameraAnimation,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            lights: vec![
                Light::new(Point3::new(-6.0, 6.0, 0.0), Vector3::new(0.9, 0.85, 0.8), 30.0),
                Light::new(Point3::new(6.0, 6.0, 0.0), Vector3::new(0.8, 0.85, 0.9), 30.0),
                Light::new(Point3::new(0.0, 10.0, -8.0), Vector3::new(0.6, 0.6, 0.6), 40.0),
            ],
            ambient_light_intensity: Vector3::new(0.15, 0.15, 0.15),
            camera: Camera::default(),
            camera_animation: CameraAnimation::default(),
        }
    }
}

impl SceneConfig {
    pub fn with_lights(mut self, lights: Vec<Light>) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_camera_animation(mut self, animation: CameraAnimation) -> Self {
        self.camera_animation = animation;
        self
    }

    pub fn with_ambient_light_intensity(mut self, intensity: Vector3<f32>) -> Self {
        self.ambient_light_intensity = intensity;
        self
    }
}

/// Top-level configuration for the windowed viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub window_size: (u32, u32),
    pub vsync: bool,
    /// OBJ scene to load; `None` uses the built-in demo scene.
    pub scene_path: Option<PathBuf>,
    /// Directory texture filenames are resolved against; defaults to the scene's directory.
    pub texture_root: Option<PathBuf>,
    /// Camera speed in units per second.
    pub move_speed: f32,
    /// Camera rotation in radians per pixel of mouse motion.
    pub look_speed: f32,
    pub render: RenderSettings,
    pub scene: SceneConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Sponza Viewer".to_string(),
            window_size: (1280, 720),
            vsync: true,
            scene_path: None,
            texture_root: None,
            move_speed: 5.0,
            look_speed: 0.003,
            render: RenderSettings::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub const SCENE_ENV: &'static str = "SPONZA_SCENE";
    pub const TEXTURE_ROOT_ENV: &'static str = "SPONZA_TEXTURE_ROOT";
    pub const VSYNC_ENV: &'static str = "SPONZA_VSYNC";

    /// Defaults overridden by `SPONZA_SCENE`, `SPONZA_TEXTURE_ROOT` and `SPONZA_VSYNC`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key/value lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(Self::SCENE_ENV).filter(|v| !v.is_empty()) {
            self.scene_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(Self::TEXTURE_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.texture_root = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(Self::VSYNC_ENV) {
            match value.trim() {
                "0" | "false" | "off" => self.vsync = false,
                "1" | "true" | "on" => self.vsync = true,
                other => log::warn!("Ignoring {}={other:?}; expected 0 or 1", Self::VSYNC_ENV),
            }
        }
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_scene_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene_path = Some(path.into());
        self
    }

    pub fn with_texture_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture_root = Some(path.into());
        self
    }

    pub fn with_render_settings(mut self, render: RenderSettings) -> Self {
        self.render = render;
        self
    }

    pub fn with_scene_config(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_render_defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.fov_y_degrees, 75.0);
        assert_eq!(settings.near_plane, 1.0);
        assert_eq!(settings.far_plane, 1000.0);
    }

    #[test]
    fn test_render_builders() {
        let settings = RenderSettings::default()
            .with_clear_colour([1.0, 0.5, 0.0, 1.0])
            .with_fov_y_degrees(60.0)
            .with_planes(0.1, 250.0);

        assert_eq!(settings.clear_colour, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(settings.fov_y_degrees, 60.0);
        assert_eq!((settings.near_plane, settings.far_plane), (0.1, 250.0));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ViewerConfig::SCENE_ENV, "assets/sponza.obj"),
            (ViewerConfig::VSYNC_ENV, "0"),
        ]
        .into_iter()
        .collect();

        let config =
            ViewerConfig::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.scene_path, Some(PathBuf::from("assets/sponza.obj")));
        assert_eq!(config.texture_root, None);
        assert!(!config.vsync);
    }

    #[test]
    fn test_invalid_vsync_is_ignored() {
        let config = ViewerConfig::default()
            .with_overrides(|key| (key == ViewerConfig::VSYNC_ENV).then(|| "maybe".to_string()));
        assert!(config.vsync);
    }
}
