/// Eye framebuffer - compositor image, depth buffer and optional resolve source
///
/// Created empty by `create_framebuffer`, populated by `attach_render_target`,
/// and checked for completeness before the frame loop starts using it.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use xr_stereo_engine::xrstereo::Result;
use xr_stereo_engine::xrstereo::device::{DepthBufferId, FramebufferStatus};
use crate::vulkan_image::VulkanImage;

/// Depth attachment as seen by the completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DepthInfo {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) sample_count: u32,
}

pub(crate) struct EyeFramebuffer {
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) render_pass: vk::RenderPass,
    /// View onto the compositor image (the image itself belongs to the compositor)
    pub(crate) color_view: vk::ImageView,
    pub(crate) msaa_color: Option<VulkanImage>,
    pub(crate) depth_buffer: Option<DepthBufferId>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) sample_count: u32,
}

impl EyeFramebuffer {
    pub(crate) fn empty() -> Self {
        Self {
            framebuffer: vk::Framebuffer::null(),
            render_pass: vk::RenderPass::null(),
            color_view: vk::ImageView::null(),
            msaa_color: None,
            depth_buffer: None,
            width: 0,
            height: 0,
            sample_count: 0,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.framebuffer != vk::Framebuffer::null()
    }

    pub(crate) fn extent(&self) -> vk::Extent2D {
        vk::Extent2D { width: self.width, height: self.height }
    }

    /// Completeness of this framebuffer given its depth attachment
    pub(crate) fn status(&self, depth: Option<DepthInfo>, max_samples: u32) -> FramebufferStatus {
        check_completeness(
            self.is_attached(),
            self.color_view != vk::ImageView::null(),
            self.msaa_color.is_some(),
            self.width,
            self.height,
            self.sample_count,
            depth,
            max_samples,
        )
    }

    /// Destroy everything this framebuffer created
    pub(crate) fn destroy(&mut self, device: &ash::Device, allocator: &mut Allocator) -> Result<()> {
        unsafe {
            if self.framebuffer != vk::Framebuffer::null() {
                device.destroy_framebuffer(self.framebuffer, None);
                self.framebuffer = vk::Framebuffer::null();
            }
            if self.color_view != vk::ImageView::null() {
                device.destroy_image_view(self.color_view, None);
                self.color_view = vk::ImageView::null();
            }
        }
        self.depth_buffer = None;
        match self.msaa_color.take() {
            Some(image) => image.destroy(device, allocator),
            None => Ok(()),
        }
    }
}

/// Framebuffer completeness rules
///
/// Complete means: a Vulkan framebuffer exists, the color image is attached,
/// a multisampled target has its resolve source, and the depth buffer exists
/// with the same extent and sample count.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_completeness(
    has_framebuffer: bool,
    has_color: bool,
    has_msaa_color: bool,
    width: u32,
    height: u32,
    sample_count: u32,
    depth: Option<DepthInfo>,
    max_samples: u32,
) -> FramebufferStatus {
    if !has_color {
        return FramebufferStatus::Incomplete("missing color attachment".to_string());
    }
    let depth = match depth {
        Some(depth) => depth,
        None => return FramebufferStatus::Incomplete("missing depth attachment".to_string()),
    };
    if width == 0 || height == 0 {
        return FramebufferStatus::Incomplete(format!("empty extent {}x{}", width, height));
    }
    if depth.width != width || depth.height != height {
        return FramebufferStatus::Incomplete(format!(
            "depth extent {}x{} does not match color extent {}x{}",
            depth.width, depth.height, width, height
        ));
    }
    if depth.sample_count != sample_count {
        return FramebufferStatus::Incomplete(format!(
            "depth has {} samples, color has {}",
            depth.sample_count, sample_count
        ));
    }
    if sample_count == 0 || sample_count > max_samples {
        return FramebufferStatus::Incomplete(format!(
            "unsupported sample count {} (max {})",
            sample_count, max_samples
        ));
    }
    if sample_count > 1 && !has_msaa_color {
        return FramebufferStatus::Incomplete("missing multisample color attachment".to_string());
    }
    if !has_framebuffer {
        return FramebufferStatus::Incomplete("framebuffer not created".to_string());
    }
    FramebufferStatus::Complete
}

#[cfg(test)]
#[path = "vulkan_framebuffer_tests.rs"]
mod tests;
