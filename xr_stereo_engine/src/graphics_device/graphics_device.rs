/// Graphics device traits
///
/// The GPU backend is split in two capabilities: building render targets
/// (depth buffers, framebuffers, attachments) during setup, and drawing into
/// a bound framebuffer every frame. Backends implement both; the blanket
/// `GraphicsDevice` trait names the pair.

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use crate::compositor::{ImageHandle, Rect2D};
use crate::error::Result;
use crate::scene::SceneObject;

/// Depth buffer owned by the engine, released before its swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthBufferId(pub u64);

/// Framebuffer owned by the engine, released before its swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u64);

/// Attachments bound to one framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    /// Compositor image receiving the (resolved) color output
    pub color_image: ImageHandle,
    pub depth_buffer: DepthBufferId,
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of the completeness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    Incomplete(String),
}

impl FramebufferStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}

bitflags! {
    /// Buffers cleared by `DrawContext::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
    }
}

/// Per-eye shader inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    /// World-space eye position
    pub eye_position: Vec3,
}

impl ViewUniforms {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Render target construction (setup and teardown only)
///
/// Capability-gated: a backend lacking multisampled render-to-texture reports
/// `Error::DriverCapabilityMissing` from `load_multisample_extension`.
pub trait RenderTargetBuilder {
    /// Resolve the multisample entry points (called once per registry)
    fn load_multisample_extension(&mut self) -> Result<()>;

    /// Highest sample count the driver supports for color and depth attachments
    fn max_sample_count(&self) -> u32;

    fn create_depth_buffer(&mut self, width: u32, height: u32, sample_count: u32) -> Result<DepthBufferId>;

    fn destroy_depth_buffer(&mut self, depth_buffer: DepthBufferId) -> Result<()>;

    fn create_framebuffer(&mut self) -> Result<FramebufferId>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()>;

    /// Attach the compositor color image and the depth buffer
    fn attach_render_target(&mut self, framebuffer: FramebufferId, desc: &AttachmentDesc) -> Result<()>;

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;
}

/// Per-frame drawing into a bound framebuffer
pub trait DrawContext {
    /// Bind a framebuffer, or return to the default target with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) -> Result<()>;

    fn set_viewport(&mut self, rect: Rect2D) -> Result<()>;

    fn set_scissor(&mut self, rect: Rect2D) -> Result<()>;

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> Result<()>;

    fn set_view_uniforms(&mut self, uniforms: &ViewUniforms) -> Result<()>;

    /// Draw one object with its model transform and color
    fn draw_object(&mut self, object: &SceneObject) -> Result<()>;

    /// Submit recorded work to the GPU before the image is released
    fn flush(&mut self) -> Result<()>;
}

/// A complete GPU backend
pub trait GraphicsDevice: RenderTargetBuilder + DrawContext {}

impl<T: RenderTargetBuilder + DrawContext + ?Sized> GraphicsDevice for T {}
