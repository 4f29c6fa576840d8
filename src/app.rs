use std::{path::Path, sync::Arc};

use anyhow::Context as _;
use cgmath::{Rad, Vector3};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::ViewerConfig,
    error::{GpuError, SceneError, ViewerError},
    geometry::MeshCollection,
    gfx::{RenderEngine, SceneRenderer, ViewDelegate},
    imaging::{ImageDecoder, MemoryDecoder, PngDecoder},
    scene::{demo_scene, load_obj_scene, Context, SceneAsset},
};

/// Loads the configured OBJ scene, or the built-in demo scene when none is set.
///
/// Textures are decoded relative to `texture_root`, falling back to the
/// directory containing the OBJ file.
pub fn load_scene(config: &ViewerConfig) -> Result<(SceneAsset, Box<dyn ImageDecoder>), SceneError> {
    let Some(path) = &config.scene_path else {
        log::info!("No scene file configured; using the demo scene");
        return Ok((demo_scene(&config.scene), Box::new(MemoryDecoder::new())));
    };

    let asset = load_obj_scene(path, &config.scene)?;
    let root = config
        .texture_root
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    log::info!("Decoding textures from {}", root.display());

    Ok((asset, Box::new(PngDecoder::new(root))))
}

/// Opens a window and runs the viewer until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    ViewerApp::new(config)?.run()
}

pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    renderer: SceneRenderer,
    scene: Context,
    geometry: MeshCollection,
    keys: MovementKeys,
    is_mouse_pressed: bool,
    failure: Option<ViewerError>,
}

impl ViewerApp {
    /// Loads the scene and creates the event loop; the window opens on `run`.
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let (asset, decoder) = load_scene(&config).context("failed to load scene")?;
        let stats = asset.context.statistics();
        log::info!(
            "Scene: {} instances of {} meshes, {} materials, {} lights",
            stats.instance_count,
            stats.mesh_count,
            stats.material_count,
            stats.light_count
        );

        let event_loop = EventLoop::new().context("failed to create event loop")?;
        let renderer = SceneRenderer::new(config.render, decoder);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                renderer,
                scene: asset.context,
                geometry: asset.geometry,
                keys: MovementKeys::default(),
                is_mouse_pressed: false,
                failure: None,
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated abnormally")?;

        match self.app_state.failure.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let (width, height) = self.config.window_size;
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| GpuError::Surface(e.to_string()))?;
        let window_handle = Arc::new(window);
        self.window = Some(window_handle.clone());

        let (width, height) = window_handle.inner_size().into();
        let vsync = self.config.vsync;
        let mut engine = pollster::block_on(async move {
            RenderEngine::new(window_handle, width, height, vsync).await
        })?;

        self.renderer
            .view_will_start(&mut engine, &self.scene, &self.geometry)?;
        self.renderer.view_did_reset(&mut engine, width, height);
        self.render_engine = Some(engine);
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(engine) = self.render_engine.as_mut() {
            self.renderer.view_did_stop(engine);
        }
        self.render_engine = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        log::error!("{err}");
        self.failure = Some(err);
        self.stop(event_loop);
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(key_code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        match key_code {
            KeyCode::Escape if pressed => self.stop(event_loop),
            KeyCode::Space if pressed && !event.repeat => {
                self.scene.toggle_camera_animation();
                // Toggling clears queued movement; keys still held keep moving.
                self.apply_movement_keys();
            }
            KeyCode::KeyN if pressed && !event.repeat => {
                let enabled = !self.renderer.normal_shading();
                self.renderer.set_normal_shading(enabled);
                log::info!("Normal shading {}", if enabled { "on" } else { "off" });
            }
            _ => {
                if self.keys.set(key_code, pressed) {
                    self.apply_movement_keys();
                }
            }
        }
    }

    fn apply_movement_keys(&mut self) {
        let velocity = self.keys.velocity(self.config.move_speed);
        self.scene
            .camera_movement_mut()
            .set_linear_velocity(velocity);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.render_engine.is_none() {
            return;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_mouse_pressed = state == ElementState::Pressed;
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    self.renderer.view_did_reset(engine, width, height);
                }
            }
            WindowEvent::CloseRequested => self.stop(event_loop),
            WindowEvent::RedrawRequested => {
                self.scene.update();
                let Some(engine) = self.render_engine.as_mut() else {
                    return;
                };
                if let Err(err) = self.renderer.view_render(engine, &self.scene) {
                    self.fail(event_loop, err);
                }
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.is_mouse_pressed {
                let look_speed = self.config.look_speed;
                self.scene.camera_movement_mut().spin(
                    Rad(delta.0 as f32 * look_speed),
                    Rad(-delta.1 as f32 * look_speed),
                );
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

/// Held state of the first-person movement keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MovementKeys {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    down: bool,
    up: bool,
}

impl MovementKeys {
    /// Records `key` as held or released. Returns false for keys that do not move.
    fn set(&mut self, key: KeyCode, held: bool) -> bool {
        let slot = match key {
            KeyCode::KeyW => &mut self.forward,
            KeyCode::KeyS => &mut self.back,
            KeyCode::KeyA => &mut self.left,
            KeyCode::KeyD => &mut self.right,
            KeyCode::KeyQ => &mut self.down,
            KeyCode::KeyE => &mut self.up,
            _ => return false,
        };
        *slot = held;
        true
    }

    /// Camera-local velocity: x right, y up, z forward.
    fn velocity(&self, speed: f32) -> Vector3<f32> {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => speed,
            (false, true) => -speed,
            _ => 0.0,
        };
        Vector3::new(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.forward, self.back),
        )
    }
}
