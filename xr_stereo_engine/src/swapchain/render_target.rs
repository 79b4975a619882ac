/// Render targets bound to compositor images
///
/// A `RenderTarget` pairs one compositor color image (borrowed) with a depth
/// buffer and a framebuffer (owned by the engine). Targets are grouped per eye
/// in an `EyeSwapchain` and per sample count in a `StereoSwapchain`.
///
/// Values are only produced by `StereoSwapchainBuilder`, fully constructed and
/// complete. Releasing them is explicit (`release`) because it needs both the
/// compositor and the GPU backend.

use crate::compositor::{CompositorSession, ImageHandle, Rect2D, SwapchainHandle};
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::graphics_device::{DepthBufferId, FramebufferId, RenderTargetBuilder};

/// Keep the first failure of a best-effort sequence
pub(crate) fn keep_first_error(first: &mut Option<Error>, result: Result<()>) {
    if let Err(err) = result {
        first.get_or_insert(err);
    }
}

/// One compositor image ready to be drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub(crate) color_image: ImageHandle,
    pub(crate) depth_buffer: DepthBufferId,
    pub(crate) framebuffer: FramebufferId,
}

impl RenderTarget {
    pub fn color_image(&self) -> ImageHandle {
        self.color_image
    }

    pub fn depth_buffer(&self) -> DepthBufferId {
        self.depth_buffer
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    fn release<D: RenderTargetBuilder + ?Sized>(&self, device: &mut D) -> Result<()> {
        let mut first = None;
        keep_first_error(&mut first, device.destroy_framebuffer(self.framebuffer));
        keep_first_error(&mut first, device.destroy_depth_buffer(self.depth_buffer));
        first.map_or(Ok(()), Err)
    }
}

/// Compositor swapchain of one eye and its render targets
///
/// All targets share the swapchain's width, height and sample count; their
/// order follows the compositor's image order.
#[derive(Debug)]
pub struct EyeSwapchain {
    pub(crate) handle: SwapchainHandle,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) sample_count: u32,
    pub(crate) targets: Vec<RenderTarget>,
}

impl EyeSwapchain {
    pub fn handle(&self) -> SwapchainHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Buffering depth chosen by the compositor
    pub fn image_count(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[RenderTarget] {
        &self.targets
    }

    pub fn target(&self, image_index: usize) -> Option<&RenderTarget> {
        self.targets.get(image_index)
    }

    /// Rectangle covering the whole image
    pub fn full_rect(&self) -> Rect2D {
        Rect2D::full(self.width, self.height)
    }

    /// Release every render target, then the compositor swapchain
    ///
    /// Best effort: every resource is attempted, the first failure is returned.
    pub fn release<C, D>(self, compositor: &mut C, device: &mut D) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        let mut first = None;
        for target in &self.targets {
            if let Err(err) = target.release(device) {
                engine_warn!("xrstereo::EyeSwapchain",
                    "Failed to release render target of swapchain {}: {}", self.handle.0, err);
                first.get_or_insert(err);
            }
        }
        if let Err(err) = compositor.destroy_swapchain(self.handle) {
            engine_warn!("xrstereo::EyeSwapchain",
                "Failed to destroy swapchain {}: {}", self.handle.0, err);
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }
}

/// One eye swapchain per view, all at the same sample count
#[derive(Debug)]
pub struct StereoSwapchain {
    pub(crate) sample_count: u32,
    pub(crate) eyes: Vec<EyeSwapchain>,
}

impl StereoSwapchain {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn view_count(&self) -> usize {
        self.eyes.len()
    }

    pub fn eyes(&self) -> &[EyeSwapchain] {
        &self.eyes
    }

    pub fn eye(&self, eye: usize) -> Option<&EyeSwapchain> {
        self.eyes.get(eye)
    }

    /// Release every eye in view order (best effort, first failure returned)
    pub fn release<C, D>(self, compositor: &mut C, device: &mut D) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        let mut first = None;
        for eye in self.eyes {
            keep_first_error(&mut first, eye.release(compositor, device));
        }
        first.map_or(Ok(()), Err)
    }
}
