use crate::{
    error::ViewerError, geometry::GeometrySource, gfx::device::RenderDevice, scene::Context,
};

/// Lifecycle callbacks a windowing host drives.
///
/// The host owns the scene and lends it for the duration of each call; the
/// delegate never keeps a reference to it.
pub trait ViewDelegate {
    /// Called once before the first frame; creates every device resource.
    fn view_will_start(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Context,
        geometry: &dyn GeometrySource,
    ) -> Result<(), ViewerError>;

    /// Called whenever the drawable size changes.
    fn view_did_reset(&mut self, device: &mut dyn RenderDevice, width: u32, height: u32);

    /// Called once after the last frame; releases every device resource.
    fn view_did_stop(&mut self, device: &mut dyn RenderDevice);

    /// Draws one frame of `scene`.
    fn view_render(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Context,
    ) -> Result<(), ViewerError>;
}
