/// VulkanGraphicsDevice - Vulkan implementation of the engine's GPU backend
///
/// Builds eye render targets on top of compositor images and records one
/// command buffer per eye. `bind_framebuffer(Some)` begins recording and the
/// render pass, `bind_framebuffer(None)` ends and submits, `flush` waits for
/// the GPU so the compositor image can be released.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use xr_stereo_engine::{engine_bail, engine_err, engine_debug, engine_error, engine_info, engine_warn};
use xr_stereo_engine::xrstereo::{Error, Result};
use xr_stereo_engine::xrstereo::compositor::{ColorFormat, Rect2D};
use xr_stereo_engine::xrstereo::device::{
    AttachmentDesc, ClearFlags, DepthBufferId, DrawContext, FramebufferId, FramebufferStatus,
    RenderTargetBuilder, ViewUniforms,
};
use xr_stereo_engine::xrstereo::scene::SceneObject;
use crate::vulkan_context::{FrameSubmission, VulkanContext};
use crate::vulkan_format::{color_format_to_vk, max_common_sample_count, sample_count_to_vk, DEPTH_FORMAT};
use crate::vulkan_framebuffer::{DepthInfo, EyeFramebuffer};
use crate::vulkan_image::{AttachmentKind, VulkanImage};
use crate::vulkan_render_pass::RenderPassCache;
use crate::vulkan_scene_pipeline::{ScenePipeline, ScenePushConstants, SCENE_PUSH_CONSTANT_STAGES};

fn key_to_id(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

fn id_to_key(id: u64) -> DefaultKey {
    KeyData::from_ffi(id).into()
}

fn to_vk_rect(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

/// Vulkan GPU backend for eye rendering
///
/// Must be dropped before the host destroys the logical device.
pub struct VulkanGraphicsDevice {
    context: VulkanContext,
    allocator: Allocator,
    color_format: vk::Format,
    max_samples: u32,
    multisample_loaded: bool,

    depth_buffers: SlotMap<DefaultKey, VulkanImage>,
    framebuffers: SlotMap<DefaultKey, EyeFramebuffer>,
    render_passes: RenderPassCache,

    submission: FrameSubmission,
    /// Framebuffer currently recording, if any
    recording: Option<DefaultKey>,

    scene_pipeline: Option<ScenePipeline>,
    view_uniforms: Option<ViewUniforms>,
}

impl VulkanGraphicsDevice {
    /// Create the backend on handles negotiated with the compositor
    ///
    /// # Arguments
    ///
    /// * `context` - Instance, device and queue shared with the compositor
    /// * `color_format` - Format of the compositor swapchain images
    pub fn new(context: VulkanContext, color_format: ColorFormat) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: context.instance.clone(),
            device: context.device.clone(),
            physical_device: context.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!("xrstereo::vulkan", "Failed to create allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })?;

        let submission = FrameSubmission::new(&context)
            .map_err(|e| Error::InitializationFailed(format!("Eye submission objects: {}", e)))?;

        let (color_samples, depth_samples) = context.framebuffer_sample_counts();
        let max_samples = max_common_sample_count(color_samples, depth_samples);
        let vk_color_format = color_format_to_vk(color_format);

        engine_info!("xrstereo::vulkan",
            "Vulkan backend ready (color {:?}, depth {:?}, max {} samples)",
            vk_color_format, DEPTH_FORMAT, max_samples);

        Ok(Self {
            context,
            allocator,
            color_format: vk_color_format,
            max_samples,
            multisample_loaded: false,
            depth_buffers: SlotMap::new(),
            framebuffers: SlotMap::new(),
            render_passes: RenderPassCache::new(vk_color_format, DEPTH_FORMAT),
            submission,
            recording: None,
            scene_pipeline: None,
            view_uniforms: None,
        })
    }

    pub fn context(&self) -> &VulkanContext {
        &self.context
    }

    /// Render pass the scene pipeline must be compatible with
    ///
    /// Created on demand, so the application can build its pipeline before
    /// the swapchains exist.
    pub fn render_pass(&mut self, sample_count: u32) -> Result<vk::RenderPass> {
        let samples = self.samples_flag(sample_count)?;
        self.render_passes.get_or_create(&self.context.device, sample_count, samples)
    }

    /// Pipeline and mesh used by `draw_object`
    pub fn set_scene_pipeline(&mut self, pipeline: ScenePipeline) {
        self.scene_pipeline = Some(pipeline);
    }

    pub fn live_depth_buffer_count(&self) -> usize {
        self.depth_buffers.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    fn samples_flag(&self, sample_count: u32) -> Result<vk::SampleCountFlags> {
        match sample_count_to_vk(sample_count) {
            Some(flag) if sample_count <= self.max_samples => Ok(flag),
            _ => Err(Error::InvalidResource(format!(
                "sample count {} not supported (max {})",
                sample_count, self.max_samples
            ))),
        }
    }

    fn status_of(&self, target: &EyeFramebuffer) -> FramebufferStatus {
        let depth = target.depth_buffer
            .and_then(|id| self.depth_buffers.get(id_to_key(id.0)))
            .map(|image| DepthInfo {
                width: image.width,
                height: image.height,
                // SampleCountFlags bits are the sample counts themselves
                sample_count: image.samples.as_raw(),
            });
        target.status(depth, self.max_samples)
    }

    fn recording_command_buffer(&self, operation: &str) -> Result<vk::CommandBuffer> {
        if self.recording.is_none() {
            return Err(Error::ProtocolViolation(format!(
                "{} called with no framebuffer bound",
                operation
            )));
        }
        Ok(self.submission.command_buffer)
    }

    fn begin_eye(&mut self, key: DefaultKey) -> Result<()> {
        let framebuffer = self.framebuffers.get(key)
            .ok_or_else(|| Error::InvalidResource(format!(
                "unknown framebuffer {}", key_to_id(key))))?;

        if let FramebufferStatus::Incomplete(reason) = self.status_of(framebuffer) {
            return Err(Error::InvalidResource(format!(
                "cannot bind incomplete framebuffer: {}", reason)));
        }

        let render_pass = framebuffer.render_pass;
        let vk_framebuffer = framebuffer.framebuffer;
        let extent = framebuffer.extent();

        // The previous eye must be done before its command buffer is reused
        self.submission.wait(&self.context.device)?;

        let device = &self.context.device;
        let command_buffer = self.submission.command_buffer;
        unsafe {
            device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to reset eye command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device.begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to begin eye command buffer: {:?}", e))?;

            let render_pass_begin = vk::RenderPassBeginInfo::default()
                .render_pass(render_pass)
                .framebuffer(vk_framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent,
                });
            device.cmd_begin_render_pass(command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);

            if let Some(pipeline) = &self.scene_pipeline {
                device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);
                device.cmd_bind_vertex_buffers(command_buffer, 0, &[pipeline.vertex_buffer], &[0]);
                device.cmd_bind_index_buffer(command_buffer, pipeline.index_buffer, 0, pipeline.index_type);
            }
        }

        self.recording = Some(key);
        Ok(())
    }

    fn end_eye(&mut self) -> Result<()> {
        let device = &self.context.device;
        let command_buffer = self.submission.command_buffer;
        // Cleared first so a failed submit does not leave a stale binding
        self.recording = None;
        unsafe {
            device.cmd_end_render_pass(command_buffer);
            device.end_command_buffer(command_buffer)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to end eye command buffer: {:?}", e))?;
        }
        self.submission.submit(device, self.context.queue)
    }

    fn destroy_framebuffer_resources(&mut self, mut framebuffer: EyeFramebuffer) -> Result<()> {
        framebuffer.destroy(&self.context.device, &mut self.allocator)
    }

    fn attach(&mut self, key: DefaultKey, desc: &AttachmentDesc) -> Result<()> {
        let samples = self.samples_flag(desc.sample_count)?;

        let depth_view = match self.depth_buffers.get(id_to_key(desc.depth_buffer.0)) {
            Some(depth) => {
                if depth.samples != samples {
                    engine_bail!("xrstereo::vulkan",
                        "Depth buffer {} has {:?}, target wants {:?}",
                        desc.depth_buffer.0, depth.samples, samples);
                }
                depth.view
            }
            None => {
                return Err(Error::InvalidResource(format!(
                    "unknown depth buffer {}", desc.depth_buffer.0)));
            }
        };

        let render_pass = self.render_passes.get_or_create(&self.context.device, desc.sample_count, samples)?;
        let device = self.context.device.clone();

        // Replace any previous attachment
        if let Some(previous) = self.framebuffers.get_mut(key) {
            previous.destroy(&device, &mut self.allocator)?;
        }

        let color_image = vk::Image::from_raw(desc.color_image.0);
        let color_view_info = vk::ImageViewCreateInfo::default()
            .image(color_image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.color_format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let color_view = unsafe {
            device.create_image_view(&color_view_info, None)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to create view on compositor image: {:?}", e))?
        };

        let msaa_color = if desc.sample_count > 1 {
            match VulkanImage::new(
                &device,
                &mut self.allocator,
                AttachmentKind::MultisampleColor,
                self.color_format,
                desc.width,
                desc.height,
                samples,
            ) {
                Ok(image) => Some(image),
                Err(e) => {
                    unsafe { device.destroy_image_view(color_view, None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        let attachments: Vec<vk::ImageView> = match &msaa_color {
            Some(msaa) => vec![msaa.view, depth_view, color_view],
            None => vec![color_view, depth_view],
        };

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let vk_framebuffer = match unsafe { device.create_framebuffer(&framebuffer_info, None) } {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                unsafe { device.destroy_image_view(color_view, None) };
                if let Some(msaa) = msaa_color {
                    let _ = msaa.destroy(&device, &mut self.allocator);
                }
                return Err(engine_err!("xrstereo::vulkan",
                    "Failed to create eye framebuffer: {:?}", e));
            }
        };

        match self.framebuffers.get_mut(key) {
            Some(target) => {
                target.framebuffer = vk_framebuffer;
                target.render_pass = render_pass;
                target.color_view = color_view;
                target.msaa_color = msaa_color;
                target.depth_buffer = Some(desc.depth_buffer);
                target.width = desc.width;
                target.height = desc.height;
                target.sample_count = desc.sample_count;
                Ok(())
            }
            None => {
                // Checked by the caller; undo rather than leak
                let mut orphan = EyeFramebuffer {
                    framebuffer: vk_framebuffer,
                    render_pass,
                    color_view,
                    msaa_color,
                    depth_buffer: None,
                    width: desc.width,
                    height: desc.height,
                    sample_count: desc.sample_count,
                };
                orphan.destroy(&device, &mut self.allocator)?;
                Err(Error::InvalidResource(format!("unknown framebuffer {}", key_to_id(key))))
            }
        }
    }
}

// ============================================================================
// RENDER TARGET CONSTRUCTION
// ============================================================================

impl RenderTargetBuilder for VulkanGraphicsDevice {
    fn load_multisample_extension(&mut self) -> Result<()> {
        if self.multisample_loaded {
            return Ok(());
        }
        // Core Vulkan: multisampled attachments and resolve only need the limits
        if self.max_samples < 2 {
            return Err(Error::DriverCapabilityMissing(
                "multisampled color and depth attachments \
                 (framebufferColorSampleCounts / framebufferDepthSampleCounts)"
                    .to_string(),
            ));
        }
        self.multisample_loaded = true;
        engine_debug!("xrstereo::vulkan",
            "Multisampled render targets available (max {} samples)", self.max_samples);
        Ok(())
    }

    fn max_sample_count(&self) -> u32 {
        self.max_samples
    }

    fn create_depth_buffer(&mut self, width: u32, height: u32, sample_count: u32) -> Result<DepthBufferId> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!(
                "depth buffer extent {}x{}", width, height)));
        }
        let samples = self.samples_flag(sample_count)?;
        let image = VulkanImage::new(
            &self.context.device,
            &mut self.allocator,
            AttachmentKind::Depth,
            DEPTH_FORMAT,
            width,
            height,
            samples,
        )?;
        let key = self.depth_buffers.insert(image);
        Ok(DepthBufferId(key_to_id(key)))
    }

    fn destroy_depth_buffer(&mut self, depth_buffer: DepthBufferId) -> Result<()> {
        let image = self.depth_buffers.remove(id_to_key(depth_buffer.0))
            .ok_or_else(|| Error::InvalidResource(format!(
                "unknown depth buffer {}", depth_buffer.0)))?;
        image.destroy(&self.context.device, &mut self.allocator)
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let key = self.framebuffers.insert(EyeFramebuffer::empty());
        Ok(FramebufferId(key_to_id(key)))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) -> Result<()> {
        let key = id_to_key(framebuffer.0);
        if self.recording == Some(key) {
            engine_warn!("xrstereo::vulkan",
                "Destroying framebuffer {} while recording; submitting first", framebuffer.0);
            self.end_eye()?;
        }
        let target = self.framebuffers.remove(key)
            .ok_or_else(|| Error::InvalidResource(format!(
                "unknown framebuffer {}", framebuffer.0)))?;
        // The GPU may still be reading the views
        self.submission.wait(&self.context.device)?;
        self.destroy_framebuffer_resources(target)
    }

    fn attach_render_target(&mut self, framebuffer: FramebufferId, desc: &AttachmentDesc) -> Result<()> {
        let key = id_to_key(framebuffer.0);
        if !self.framebuffers.contains_key(key) {
            return Err(Error::InvalidResource(format!(
                "unknown framebuffer {}", framebuffer.0)));
        }
        self.attach(key, desc)
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        let target = match self.framebuffers.get(id_to_key(framebuffer.0)) {
            Some(target) => target,
            None => return FramebufferStatus::Incomplete(format!(
                "unknown framebuffer {}", framebuffer.0)),
        };
        self.status_of(target)
    }
}

// ============================================================================
// DRAWING
// ============================================================================

impl DrawContext for VulkanGraphicsDevice {
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) -> Result<()> {
        match framebuffer {
            Some(id) => {
                if self.recording.is_some() {
                    engine_warn!("xrstereo::vulkan",
                        "Binding framebuffer {} over an open one; submitting the previous eye", id.0);
                    self.end_eye()?;
                }
                self.begin_eye(id_to_key(id.0))
            }
            None => match self.recording {
                Some(_) => self.end_eye(),
                None => Ok(()),
            },
        }
    }

    fn set_viewport(&mut self, rect: Rect2D) -> Result<()> {
        let command_buffer = self.recording_command_buffer("set_viewport")?;
        let viewport = vk::Viewport {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe {
            self.context.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, rect: Rect2D) -> Result<()> {
        let command_buffer = self.recording_command_buffer("set_scissor")?;
        unsafe {
            self.context.device.cmd_set_scissor(command_buffer, 0, &[to_vk_rect(rect)]);
        }
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> Result<()> {
        let command_buffer = self.recording_command_buffer("clear")?;
        let extent = match self.recording.and_then(|key| self.framebuffers.get(key)) {
            Some(target) => target.extent(),
            None => return Err(Error::ProtocolViolation("bound framebuffer vanished".to_string())),
        };

        let mut attachments = Vec::with_capacity(2);
        if flags.contains(ClearFlags::COLOR) {
            attachments.push(vk::ClearAttachment {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                color_attachment: 0,
                clear_value: vk::ClearValue {
                    color: vk::ClearColorValue { float32: color },
                },
            });
        }
        if flags.contains(ClearFlags::DEPTH) {
            attachments.push(vk::ClearAttachment {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                color_attachment: 0,
                clear_value: vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil: 0 },
                },
            });
        }
        if attachments.is_empty() {
            return Ok(());
        }

        let clear_rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            },
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.context.device.cmd_clear_attachments(command_buffer, &attachments, &[clear_rect]);
        }
        Ok(())
    }

    fn set_view_uniforms(&mut self, uniforms: &ViewUniforms) -> Result<()> {
        self.recording_command_buffer("set_view_uniforms")?;
        self.view_uniforms = Some(*uniforms);
        Ok(())
    }

    fn draw_object(&mut self, object: &SceneObject) -> Result<()> {
        let command_buffer = self.recording_command_buffer("draw_object")?;
        let pipeline = self.scene_pipeline
            .ok_or_else(|| Error::InvalidResource("no scene pipeline set".to_string()))?;
        let uniforms = self.view_uniforms
            .ok_or_else(|| Error::ProtocolViolation("draw_object before set_view_uniforms".to_string()))?;

        let constants = ScenePushConstants::new(
            uniforms.view_projection(),
            object.model,
            object.color,
            uniforms.eye_position,
        );

        unsafe {
            self.context.device.cmd_push_constants(
                command_buffer,
                pipeline.layout,
                SCENE_PUSH_CONSTANT_STAGES,
                0,
                bytemuck::bytes_of(&constants),
            );
            self.context.device.cmd_draw_indexed(command_buffer, pipeline.index_count, 1, 0, 0, 0);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.recording.is_some() {
            self.end_eye()?;
        }
        self.submission.wait(&self.context.device)
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        let device = self.context.device.clone();
        unsafe {
            let _ = device.device_wait_idle();
        }

        let framebuffers: Vec<EyeFramebuffer> = self.framebuffers.drain().map(|(_, fb)| fb).collect();
        if !framebuffers.is_empty() {
            engine_warn!("xrstereo::vulkan",
                "{} framebuffers still alive at shutdown", framebuffers.len());
        }
        for mut framebuffer in framebuffers {
            let _ = framebuffer.destroy(&device, &mut self.allocator);
        }

        let depth_buffers: Vec<VulkanImage> = self.depth_buffers.drain().map(|(_, image)| image).collect();
        for image in depth_buffers {
            let _ = image.destroy(&device, &mut self.allocator);
        }

        self.render_passes.destroy_all(&device);
        self.submission.destroy(&device);
    }
}
