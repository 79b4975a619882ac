/// Eye render driver - draws the scene for one eye into one compositor image
///
/// The driver binds the render target, sets viewport and scissor to its full
/// extent, clears color and depth, uploads the eye's projection and view, and
/// draws every scene object. The framebuffer is unbound on every exit path,
/// including errors, through `BoundFramebuffer`.

use crate::compositor::View;
use crate::config::{GraphicsApi, SessionConfig};
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::graphics_device::{ClearFlags, DrawContext, FramebufferId};
use crate::scene::Scene;
use crate::swapchain::StereoSwapchain;
use super::eye_matrices::eye_view_uniforms;

/// Framebuffer bound for the lifetime of the guard
///
/// Dropping the guard returns to the default target. Use `unbind` to observe
/// the unbind result on the success path.
pub struct BoundFramebuffer<'a, D: DrawContext + ?Sized> {
    device: &'a mut D,
    bound: bool,
}

impl<'a, D: DrawContext + ?Sized> BoundFramebuffer<'a, D> {
    pub fn bind(device: &'a mut D, framebuffer: FramebufferId) -> Result<Self> {
        device.bind_framebuffer(Some(framebuffer))?;
        Ok(Self { device, bound: true })
    }

    pub fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    /// Return to the default target
    pub fn unbind(mut self) -> Result<()> {
        self.bound = false;
        self.device.bind_framebuffer(None)
    }
}

impl<D: DrawContext + ?Sized> Drop for BoundFramebuffer<'_, D> {
    fn drop(&mut self) {
        if self.bound {
            if let Err(err) = self.device.bind_framebuffer(None) {
                engine_warn!("xrstereo::EyeRenderDriver", "Failed to unbind framebuffer: {}", err);
            }
        }
    }
}

/// Per-eye drawing parameters taken from the session configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRenderDriver {
    clear_color: [f32; 4],
    clear_depth: f32,
    near_z: f32,
    far_z: f32,
    graphics_api: GraphicsApi,
}

impl EyeRenderDriver {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            clear_color: config.clear_color,
            clear_depth: config.clear_depth,
            near_z: config.near_z,
            far_z: config.far_z,
            graphics_api: config.graphics_api,
        }
    }

    /// Render `scene` for `eye` into the target at `image_index`
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the eye or image index does not exist in
    /// `swapchain`; any backend error from drawing. The framebuffer is
    /// unbound in every case once it was bound.
    pub fn render_eye<D: DrawContext + ?Sized>(
        &self,
        device: &mut D,
        swapchain: &StereoSwapchain,
        eye: usize,
        image_index: usize,
        view: &View,
        scene: &Scene,
    ) -> Result<()> {
        let eye_swapchain = swapchain.eye(eye).ok_or_else(|| {
            Error::ProtocolViolation(format!(
                "eye {} out of range ({} views)",
                eye,
                swapchain.view_count()
            ))
        })?;
        let target = eye_swapchain.target(image_index).ok_or_else(|| {
            Error::ProtocolViolation(format!(
                "image {} out of range for eye {} ({} images)",
                image_index,
                eye,
                eye_swapchain.image_count()
            ))
        })?;

        let mut bound = BoundFramebuffer::bind(device, target.framebuffer())?;
        let rect = eye_swapchain.full_rect();
        let uniforms = eye_view_uniforms(view, self.near_z, self.far_z, self.graphics_api);

        let draw = bound.device();
        draw.set_viewport(rect)?;
        draw.set_scissor(rect)?;
        draw.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.clear_color, self.clear_depth)?;
        draw.set_view_uniforms(&uniforms)?;
        for object in scene.objects() {
            draw.draw_object(object)?;
        }

        bound.unbind()
    }
}

#[cfg(test)]
#[path = "eye_render_driver_tests.rs"]
mod tests;
