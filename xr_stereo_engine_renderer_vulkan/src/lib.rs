/*!
# XR Stereo Engine - Vulkan Backend

Vulkan implementation of the xr_stereo_engine GPU backend traits
(`RenderTargetBuilder` and `DrawContext`).

The compositor decides which device and queue the renderer runs on, so this
crate does not create an instance or device: the host passes the handles it
negotiated with the XR runtime in a `VulkanContext`. Attachment memory is
managed with gpu-allocator.

Each eye framebuffer renders into the compositor image directly when
single-sampled, or into a transient multisampled image resolved into the
compositor image at the end of the render pass.
*/

mod vulkan_format;
mod vulkan_context;
mod vulkan_image;
mod vulkan_render_pass;
mod vulkan_framebuffer;
mod vulkan_scene_pipeline;
mod vulkan_graphics_device;

/// Main xrstereo namespace module for the Vulkan backend
pub mod xrstereo {
    pub use crate::vulkan_context::VulkanContext;
    pub use crate::vulkan_graphics_device::VulkanGraphicsDevice;
    pub use crate::vulkan_scene_pipeline::{ScenePipeline, ScenePushConstants, SCENE_PUSH_CONSTANT_STAGES};
}

// Re-export ash so hosts use the same Vulkan bindings
pub use ash;
