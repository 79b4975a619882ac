/// VulkanContext - handles negotiated with the XR runtime
///
/// The compositor dictates which physical device and queue the renderer uses,
/// so the instance, device and queue are created by the host and handed to the
/// backend. The backend never destroys them; it only owns what it creates on
/// top (allocator, command pool, fence, images).

use ash::vk;
use xr_stereo_engine::engine_err;
use xr_stereo_engine::xrstereo::Result;

/// Borrowed Vulkan handles plus the per-frame submission objects
pub struct VulkanContext {
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub queue: vk::Queue,
    pub queue_family_index: u32,
}

impl VulkanContext {
    /// Wrap handles created by the host
    ///
    /// # Arguments
    ///
    /// * `instance` - Instance the compositor session was created with
    /// * `physical_device` - Physical device required by the compositor
    /// * `device` - Logical device shared with the compositor
    /// * `queue` - Graphics queue used for eye rendering
    /// * `queue_family_index` - Family of `queue`
    pub fn new(
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        queue: vk::Queue,
        queue_family_index: u32,
    ) -> Self {
        Self {
            instance,
            physical_device,
            device,
            queue,
            queue_family_index,
        }
    }

    /// Framebuffer sample count limits (color, depth)
    pub(crate) fn framebuffer_sample_counts(&self) -> (vk::SampleCountFlags, vk::SampleCountFlags) {
        let properties = unsafe {
            self.instance.get_physical_device_properties(self.physical_device)
        };
        (
            properties.limits.framebuffer_color_sample_counts,
            properties.limits.framebuffer_depth_sample_counts,
        )
    }
}

/// Command pool, command buffer and fence used to record and submit one eye
pub(crate) struct FrameSubmission {
    pub(crate) command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    /// Signaled when the last submitted eye finished on the GPU
    pub(crate) fence: vk::Fence,
    /// Work submitted but not yet waited on
    pub(crate) in_flight: bool,
}

impl FrameSubmission {
    pub(crate) fn new(context: &VulkanContext) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
                .queue_family_index(context.queue_family_index);

            let command_pool = context.device.create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to create command pool: {:?}", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match context.device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    context.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("xrstereo::vulkan",
                        "Failed to allocate command buffer: {:?}", e));
                }
            };

            // Created signaled so the first eye does not wait
            let fence_info = vk::FenceCreateInfo::default()
                .flags(vk::FenceCreateFlags::SIGNALED);

            let fence = match context.device.create_fence(&fence_info, None) {
                Ok(fence) => fence,
                Err(e) => {
                    context.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("xrstereo::vulkan",
                        "Failed to create fence: {:?}", e));
                }
            };

            Ok(Self {
                command_pool,
                command_buffer,
                fence,
                in_flight: false,
            })
        }
    }

    /// Block until the last submission completed
    pub(crate) fn wait(&mut self, device: &ash::Device) -> Result<()> {
        if !self.in_flight {
            return Ok(());
        }
        unsafe {
            device.wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to wait for eye fence: {:?}", e))?;
        }
        self.in_flight = false;
        Ok(())
    }

    /// Submit the recorded command buffer, signaling the fence on completion
    pub(crate) fn submit(&mut self, device: &ash::Device, queue: vk::Queue) -> Result<()> {
        unsafe {
            device.reset_fences(&[self.fence])
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to reset eye fence: {:?}", e))?;

            let command_buffers = [self.command_buffer];
            let submit_info = vk::SubmitInfo::default()
                .command_buffers(&command_buffers);

            device.queue_submit(queue, &[submit_info], self.fence)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to submit eye command buffer: {:?}", e))?;
        }
        self.in_flight = true;
        Ok(())
    }

    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            device.destroy_fence(self.fence, None);
            // Frees the command buffer with it
            device.destroy_command_pool(self.command_pool, None);
        }
        self.fence = vk::Fence::null();
        self.command_pool = vk::CommandPool::null();
        self.command_buffer = vk::CommandBuffer::null();
    }
}
