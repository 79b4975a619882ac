/// Render pass cache - one eye render pass per sample count
///
/// Single-sampled passes render straight into the compositor image.
/// Multisampled passes render into a transient image and resolve into the
/// compositor image at the end of the subpass. Compositor images are handed
/// back in COLOR_ATTACHMENT_OPTIMAL, the layout they were acquired in.

use ash::vk;
use rustc_hash::FxHashMap;
use xr_stereo_engine::engine_err;
use xr_stereo_engine::xrstereo::Result;

pub(crate) struct RenderPassCache {
    color_format: vk::Format,
    depth_format: vk::Format,
    passes: FxHashMap<u32, vk::RenderPass>,
}

impl RenderPassCache {
    pub(crate) fn new(color_format: vk::Format, depth_format: vk::Format) -> Self {
        Self {
            color_format,
            depth_format,
            passes: FxHashMap::default(),
        }
    }

    /// Render pass for `samples`, created on first use
    pub(crate) fn get_or_create(
        &mut self,
        device: &ash::Device,
        sample_count: u32,
        samples: vk::SampleCountFlags,
    ) -> Result<vk::RenderPass> {
        if let Some(&pass) = self.passes.get(&sample_count) {
            return Ok(pass);
        }
        let pass = self.create(device, samples)?;
        self.passes.insert(sample_count, pass);
        Ok(pass)
    }

    fn create(&self, device: &ash::Device, samples: vk::SampleCountFlags) -> Result<vk::RenderPass> {
        let multisampled = samples != vk::SampleCountFlags::TYPE_1;

        // Attachment 0: color target (transient when multisampled)
        let color_attachment = vk::AttachmentDescription::default()
            .format(self.color_format)
            .samples(samples)
            .load_op(vk::AttachmentLoadOp::DONT_CARE)
            .store_op(if multisampled {
                vk::AttachmentStoreOp::DONT_CARE
            } else {
                vk::AttachmentStoreOp::STORE
            })
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        // Attachment 1: depth, never stored
        let depth_attachment = vk::AttachmentDescription::default()
            .format(self.depth_format)
            .samples(samples)
            .load_op(vk::AttachmentLoadOp::DONT_CARE)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        // Attachment 2: compositor image receiving the resolve
        let resolve_attachment = vk::AttachmentDescription::default()
            .format(self.color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::DONT_CARE)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

        let mut attachments = vec![color_attachment, depth_attachment];
        if multisampled {
            attachments.push(resolve_attachment);
        }

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let resolve_refs = [vk::AttachmentReference {
            attachment: 2,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref);
        if multisampled {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }

        let stage_mask = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let access_mask = vk::AccessFlags::COLOR_ATTACHMENT_WRITE
            | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        unsafe {
            device.create_render_pass(&render_pass_info, None)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to create eye render pass ({:?}): {:?}", samples, e))
        }
    }

    pub(crate) fn destroy_all(&mut self, device: &ash::Device) {
        for (_, pass) in self.passes.drain() {
            unsafe {
                device.destroy_render_pass(pass, None);
            }
        }
    }
}
