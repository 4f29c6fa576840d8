//! Opens the viewer on the scene named by `SPONZA_SCENE`, or on the built-in
//! demo scene when it is unset.
//!
//! ```text
//! SPONZA_SCENE=assets/sponza/sponza.obj cargo run --example viewer
//! ```
//!
//! Space toggles the camera animation, N toggles normal shading, W/A/S/D/Q/E
//! move and dragging with the left mouse button looks around.

use sponza_viewer::ViewerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn"),
    )
    .init();

    let config = ViewerConfig::from_env();
    log::info!("Starting {}", config.title);

    sponza_viewer::run(config)
}
