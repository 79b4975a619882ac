/// Compositor session trait
///
/// The display runtime that paces frames, locates the eyes, lends swapchain
/// images and composites the submitted layers. Instance, session and space
/// negotiation happen outside the engine; an implementation of this trait
/// wraps the handles they produce.

use std::time::Duration;
use crate::error::Result;
use super::compositor_types::{
    DisplayTime, EnvironmentBlendMode, FrameTiming, ImageHandle, LayerDescriptor,
    SwapchainDesc, SwapchainHandle, View,
};

/// Compositor session (external collaborator)
///
/// All calls are made from the rendering thread. Refusals are reported as
/// `Error::CompositorRejected` naming the call.
///
/// Ordering contract expected by implementations:
/// - `wait_frame` before `begin_frame`, exactly one `end_frame` per successful `begin_frame`
/// - per swapchain: `acquire_image`, then `wait_image`, then `release_image`
/// - every swapchain is destroyed before the session itself
pub trait CompositorSession {
    /// Create one per-eye swapchain
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainHandle>;

    /// Images of a swapchain (length = buffering depth chosen by the runtime)
    fn enumerate_images(&mut self, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>>;

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) -> Result<()>;

    /// Block until the compositor is ready for a new frame
    ///
    /// This is the pacing point of the frame loop.
    fn wait_frame(&mut self) -> Result<FrameTiming>;

    fn begin_frame(&mut self) -> Result<()>;

    /// Locate every view at the given display time
    ///
    /// May return fewer views than requested when tracking is partial.
    fn locate_views(&mut self, display_time: DisplayTime, view_count: usize) -> Result<Vec<View>>;

    /// Acquire the next image of a swapchain, returning its index
    fn acquire_image(&mut self, swapchain: SwapchainHandle) -> Result<u32>;

    /// Wait until the acquired image can be written
    ///
    /// Returns `Error::ImageTimeout` when the advisory timeout expires.
    fn wait_image(&mut self, swapchain: SwapchainHandle, timeout: Duration) -> Result<()>;

    fn release_image(&mut self, swapchain: SwapchainHandle) -> Result<()>;

    /// Submit the frame's projection views
    fn end_frame(
        &mut self,
        display_time: DisplayTime,
        blend_mode: EnvironmentBlendMode,
        layers: &[LayerDescriptor],
    ) -> Result<()>;
}
