/// Mock graphics device for unit tests (no GPU required)
///
/// Tracks live depth buffers and framebuffers so tests can check that every
/// resource created during a failed build is released, and records draw
/// commands as strings.

use std::collections::{HashMap, HashSet};
use crate::compositor::Rect2D;
use crate::error::{Error, Result};
use crate::scene::SceneObject;
use super::graphics_device::{
    AttachmentDesc, ClearFlags, DepthBufferId, DrawContext, FramebufferId,
    FramebufferStatus, RenderTargetBuilder, ViewUniforms,
};

#[derive(Debug)]
pub struct MockGraphicsDevice {
    /// Recorded commands ("bind(Some(3))", "clear", "draw", "flush", ...)
    pub commands: Vec<String>,
    pub max_samples: u32,

    // ===== FAILURE INJECTION =====
    pub multisample_extension_missing: bool,
    /// Zero-based ordinal of the framebuffer that reports incomplete
    pub incomplete_framebuffer_at: Option<usize>,
    pub fail_depth_buffer_at: Option<usize>,
    pub fail_draw: bool,
    pub fail_flush: bool,
    pub fail_destroy_framebuffer: bool,

    // ===== STATE =====
    pub extension_load_count: usize,
    pub depth_buffers_created: usize,
    pub framebuffers_created: usize,
    pub live_depth_buffers: HashSet<DepthBufferId>,
    pub live_framebuffers: HashSet<FramebufferId>,
    pub attachments: HashMap<FramebufferId, AttachmentDesc>,
    pub bound: Option<FramebufferId>,
    pub last_uniforms: Option<ViewUniforms>,
    pub draw_count: usize,

    next_id: u64,
    incomplete: HashSet<FramebufferId>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            max_samples: 8,
            multisample_extension_missing: false,
            incomplete_framebuffer_at: None,
            fail_depth_buffer_at: None,
            fail_draw: false,
            fail_flush: false,
            fail_destroy_framebuffer: false,
            extension_load_count: 0,
            depth_buffers_created: 0,
            framebuffers_created: 0,
            live_depth_buffers: HashSet::new(),
            live_framebuffers: HashSet::new(),
            attachments: HashMap::new(),
            bound: None,
            last_uniforms: None,
            draw_count: 0,
            next_id: 1,
            incomplete: HashSet::new(),
        }
    }

    /// Device reporting the given driver maximum sample count
    pub fn with_max_samples(max_samples: u32) -> Self {
        Self { max_samples, ..Self::new() }
    }

    /// Total GPU allocations performed (depth buffers + framebuffers)
    pub fn allocation_count(&self) -> usize {
        self.depth_buffers_created + self.framebuffers_created
    }

    /// True when no depth buffer or framebuffer is still alive
    pub fn is_clean(&self) -> bool {
        self.live_depth_buffers.is_empty() && self.live_framebuffers.is_empty()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl RenderTargetBuilder for MockGraphicsDevice {
    fn load_multisample_extension(&mut self) -> Result<()> {
        self.extension_load_count += 1;
        if self.multisample_extension_missing {
            return Err(Error::DriverCapabilityMissing(
                "glFramebufferTexture2DMultisampleEXT".to_string(),
            ));
        }
        Ok(())
    }

    fn max_sample_count(&self) -> u32 {
        self.max_samples
    }

    fn create_depth_buffer(&mut self, _width: u32, _height: u32, _sample_count: u32) -> Result<DepthBufferId> {
        let ordinal = self.depth_buffers_created;
        if self.fail_depth_buffer_at == Some(ordinal) {
            return Err(Error::OutOfMemory);
        }
        self.depth_buffers_created += 1;
        let id = DepthBufferId(self.next_id());
        self.live_depth_buffers.insert(id);
        Ok(id)
    }

    fn destroy_depth_buffer(&mut self, depth_buffer: DepthBufferId) -> Result<()> {
        if !self.live_depth_buffers.remove(&depth_buffer) {
            return Err(Error::InvalidResource(format!("depth buffer {} is not alive", depth_buffer.0)));
        }
        Ok(())
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let ordinal = self.framebuffers_created;
        self.framebuffers_created += 1;
        let id = FramebufferId(self.next_id());
        if self.incomplete_framebuffer_at == Some(ordinal) {
            self.incomplete.insert(id);
        }
        self.live_framebuffers.insert(id);
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        if !self.live_framebuffers.remove(&framebuffer) {
            return Err(Error::InvalidResource(format!("framebuffer {} is not alive", framebuffer.0)));
        }
        self.attachments.remove(&framebuffer);
        if self.fail_destroy_framebuffer {
            return Err(Error::BackendError("glDeleteFramebuffers failed".to_string()));
        }
        Ok(())
    }

    fn attach_render_target(&mut self, framebuffer: FramebufferId, desc: &AttachmentDesc) -> Result<()> {
        if !self.live_framebuffers.contains(&framebuffer) {
            return Err(Error::InvalidResource(format!("framebuffer {} is not alive", framebuffer.0)));
        }
        if !self.live_depth_buffers.contains(&desc.depth_buffer) {
            return Err(Error::InvalidResource(format!("depth buffer {} is not alive", desc.depth_buffer.0)));
        }
        self.attachments.insert(framebuffer, *desc);
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        if self.incomplete.contains(&framebuffer) {
            return FramebufferStatus::Incomplete("GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT".to_string());
        }
        if !self.attachments.contains_key(&framebuffer) {
            return FramebufferStatus::Incomplete("GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT".to_string());
        }
        FramebufferStatus::Complete
    }
}

impl DrawContext for MockGraphicsDevice {
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) -> Result<()> {
        self.commands.push(format!("bind({:?})", framebuffer.map(|f| f.0)));
        if let Some(fb) = framebuffer {
            if !self.live_framebuffers.contains(&fb) {
                return Err(Error::InvalidResource(format!("framebuffer {} is not alive", fb.0)));
            }
        }
        self.bound = framebuffer;
        Ok(())
    }

    fn set_viewport(&mut self, rect: Rect2D) -> Result<()> {
        self.commands.push(format!("viewport({}x{})", rect.width, rect.height));
        Ok(())
    }

    fn set_scissor(&mut self, rect: Rect2D) -> Result<()> {
        self.commands.push(format!("scissor({}x{})", rect.width, rect.height));
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4], _depth: f32) -> Result<()> {
        self.commands.push(format!("clear({:?})", flags));
        Ok(())
    }

    fn set_view_uniforms(&mut self, uniforms: &ViewUniforms) -> Result<()> {
        self.commands.push("uniforms".to_string());
        self.last_uniforms = Some(*uniforms);
        Ok(())
    }

    fn draw_object(&mut self, _object: &SceneObject) -> Result<()> {
        self.commands.push("draw".to_string());
        if self.bound.is_none() {
            return Err(Error::ProtocolViolation("draw without a bound framebuffer".to_string()));
        }
        if self.fail_draw {
            return Err(Error::BackendError("glDrawElements failed".to_string()));
        }
        self.draw_count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.commands.push("flush".to_string());
        if self.fail_flush {
            return Err(Error::BackendError("glFlush failed".to_string()));
        }
        Ok(())
    }
}

#[path = "mock_graphics_device_tests.rs"]
mod tests;
