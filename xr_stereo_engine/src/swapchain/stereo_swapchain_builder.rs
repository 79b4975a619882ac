/// All-or-nothing construction of a stereo swapchain
///
/// The builder creates, for every view, a compositor swapchain and one
/// depth buffer + framebuffer per compositor image, then checks each
/// framebuffer for completeness. Every resource is recorded in a
/// `BuildTransaction`; if any step fails the transaction is dropped
/// uncommitted and releases everything it recorded, framebuffers and depth
/// buffers before the swapchains that own their color images.
///
/// Building does not touch the registry. Inserting the result is a separate
/// step (`SwapchainRegistry::insert`).

use crate::compositor::{ColorFormat, CompositorSession, SwapchainDesc, SwapchainHandle};
use crate::error::{CompositorCall, Error, Result};
use crate::graphics_device::{
    AttachmentDesc, DepthBufferId, FramebufferId, FramebufferStatus, RenderTargetBuilder,
};
use crate::{engine_debug, engine_error, engine_warn};
use super::render_target::{EyeSwapchain, RenderTarget, StereoSwapchain};

/// Parameters of one stereo swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoSwapchainBuilder {
    sample_count: u32,
    view_count: usize,
    width: u32,
    height: u32,
    format: ColorFormat,
}

impl StereoSwapchainBuilder {
    pub fn new(sample_count: u32, view_count: usize, width: u32, height: u32) -> Self {
        Self {
            sample_count,
            view_count,
            width,
            height,
            format: ColorFormat::Rgba8Unorm,
        }
    }

    pub fn with_format(mut self, format: ColorFormat) -> Self {
        self.format = format;
        self
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Build the swapchain of every view, or nothing
    ///
    /// # Errors
    ///
    /// - `CompositorRejected` if the compositor refuses a swapchain or its images
    /// - `FramebufferIncomplete` if a render target fails the completeness check
    /// - any backend error from depth buffer or framebuffer creation
    ///
    /// On error every resource created by this call has been released.
    pub fn build<C, D>(&self, compositor: &mut C, device: &mut D) -> Result<StereoSwapchain>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        if self.sample_count == 0 || self.view_count == 0 || self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResource(format!(
                "stereo swapchain {} views {}x{} with {} samples",
                self.view_count, self.width, self.height, self.sample_count
            )));
        }

        let mut tx = BuildTransaction::new(compositor, device);
        let mut eyes = Vec::with_capacity(self.view_count);

        for eye in 0..self.view_count {
            let handle = tx.compositor.create_swapchain(&SwapchainDesc {
                view_index: eye,
                width: self.width,
                height: self.height,
                sample_count: self.sample_count,
                format: self.format,
            })?;
            tx.swapchains.push(handle);

            let images = tx.compositor.enumerate_images(handle)?;
            if images.is_empty() {
                return Err(Error::rejected(
                    CompositorCall::EnumerateImages,
                    format!("swapchain {} has no images", handle.0),
                ));
            }

            let mut targets = Vec::with_capacity(images.len());
            for (image_index, color_image) in images.into_iter().enumerate() {
                let depth_buffer = tx.device.create_depth_buffer(self.width, self.height, self.sample_count)?;
                tx.depth_buffers.push(depth_buffer);

                let framebuffer = tx.device.create_framebuffer()?;
                tx.framebuffers.push(framebuffer);

                tx.device.attach_render_target(framebuffer, &AttachmentDesc {
                    color_image,
                    depth_buffer,
                    sample_count: self.sample_count,
                    width: self.width,
                    height: self.height,
                })?;

                if let FramebufferStatus::Incomplete(reason) = tx.device.framebuffer_status(framebuffer) {
                    engine_error!("xrstereo::StereoSwapchainBuilder",
                        "Incomplete frame buffer (eye {}, image {}): {}", eye, image_index, reason);
                    return Err(Error::FramebufferIncomplete { eye, image_index, reason });
                }

                targets.push(RenderTarget { color_image, depth_buffer, framebuffer });
            }

            engine_debug!("xrstereo::StereoSwapchainBuilder",
                "Eye {} swapchain {} ready ({} images, {}x{}, {} samples)",
                eye, handle.0, targets.len(), self.width, self.height, self.sample_count);

            eyes.push(EyeSwapchain {
                handle,
                width: self.width,
                height: self.height,
                sample_count: self.sample_count,
                targets,
            });
        }

        tx.commit();
        Ok(StereoSwapchain {
            sample_count: self.sample_count,
            eyes,
        })
    }
}

/// Resources created by an in-progress build, released on drop unless committed
struct BuildTransaction<'a, C, D>
where
    C: CompositorSession + ?Sized,
    D: RenderTargetBuilder + ?Sized,
{
    compositor: &'a mut C,
    device: &'a mut D,
    swapchains: Vec<SwapchainHandle>,
    depth_buffers: Vec<DepthBufferId>,
    framebuffers: Vec<FramebufferId>,
    committed: bool,
}

impl<'a, C, D> BuildTransaction<'a, C, D>
where
    C: CompositorSession + ?Sized,
    D: RenderTargetBuilder + ?Sized,
{
    fn new(compositor: &'a mut C, device: &'a mut D) -> Self {
        Self {
            compositor,
            device,
            swapchains: Vec::new(),
            depth_buffers: Vec::new(),
            framebuffers: Vec::new(),
            committed: false,
        }
    }

    /// Hand ownership of every recorded resource to the built value
    fn commit(mut self) {
        self.committed = true;
    }
}

impl<C, D> Drop for BuildTransaction<'_, C, D>
where
    C: CompositorSession + ?Sized,
    D: RenderTargetBuilder + ?Sized,
{
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        engine_warn!("xrstereo::StereoSwapchainBuilder",
            "Rolling back partial build ({} framebuffers, {} depth buffers, {} swapchains)",
            self.framebuffers.len(), self.depth_buffers.len(), self.swapchains.len());

        for framebuffer in self.framebuffers.drain(..).rev() {
            if let Err(err) = self.device.destroy_framebuffer(framebuffer) {
                engine_warn!("xrstereo::StereoSwapchainBuilder",
                    "Rollback: failed to destroy framebuffer {}: {}", framebuffer.0, err);
            }
        }
        for depth_buffer in self.depth_buffers.drain(..).rev() {
            if let Err(err) = self.device.destroy_depth_buffer(depth_buffer) {
                engine_warn!("xrstereo::StereoSwapchainBuilder",
                    "Rollback: failed to destroy depth buffer {}: {}", depth_buffer.0, err);
            }
        }
        for swapchain in self.swapchains.drain(..).rev() {
            if let Err(err) = self.compositor.destroy_swapchain(swapchain) {
                engine_warn!("xrstereo::StereoSwapchainBuilder",
                    "Rollback: failed to destroy swapchain {}: {}", swapchain.0, err);
            }
        }
    }
}

#[cfg(test)]
#[path = "stereo_swapchain_builder_tests.rs"]
mod tests;
