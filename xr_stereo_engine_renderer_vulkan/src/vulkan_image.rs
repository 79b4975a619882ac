/// VulkanImage - device-local attachment image owned by the backend
///
/// Used for depth buffers and for the transient multisampled color image that
/// is resolved into the compositor image.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use xr_stereo_engine::{engine_err, engine_error};
use xr_stereo_engine::xrstereo::{Error, Result};

pub(crate) struct VulkanImage {
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) samples: vk::SampleCountFlags,
}

/// What an attachment image is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttachmentKind {
    Depth,
    MultisampleColor,
}

impl AttachmentKind {
    fn usage(self) -> vk::ImageUsageFlags {
        match self {
            AttachmentKind::Depth => {
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSIENT_ATTACHMENT
            }
            AttachmentKind::MultisampleColor => {
                vk::ImageUsageFlags::COLOR_ATTACHMENT
                    | vk::ImageUsageFlags::TRANSIENT_ATTACHMENT
            }
        }
    }

    fn aspect(self) -> vk::ImageAspectFlags {
        match self {
            AttachmentKind::Depth => vk::ImageAspectFlags::DEPTH,
            AttachmentKind::MultisampleColor => vk::ImageAspectFlags::COLOR,
        }
    }

    fn name(self) -> &'static str {
        match self {
            AttachmentKind::Depth => "eye_depth_buffer",
            AttachmentKind::MultisampleColor => "eye_msaa_color",
        }
    }
}

impl VulkanImage {
    pub(crate) fn new(
        device: &ash::Device,
        allocator: &mut Allocator,
        kind: AttachmentKind,
        format: vk::Format,
        width: u32,
        height: u32,
        samples: vk::SampleCountFlags,
    ) -> Result<Self> {
        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width, height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(samples)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(kind.usage())
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.create_image(&image_info, None)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to create {} image: {:?}", kind.name(), e))?;

            let requirements = device.get_image_memory_requirements(image);

            let allocation = match allocator.allocate(&AllocationCreateDesc {
                name: kind.name(),
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            }) {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_image(image, None);
                    engine_error!("xrstereo::vulkan",
                        "Out of GPU memory for {} ({}x{}): {:?}", kind.name(), width, height, e);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                device.destroy_image(image, None);
                let _ = allocator.free(allocation);
                return Err(engine_err!("xrstereo::vulkan",
                    "Failed to bind {} memory: {:?}", kind.name(), e));
            }

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: kind.aspect(),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = match device.create_image_view(&view_info, None) {
                Ok(view) => view,
                Err(e) => {
                    device.destroy_image(image, None);
                    let _ = allocator.free(allocation);
                    return Err(engine_err!("xrstereo::vulkan",
                        "Failed to create {} view: {:?}", kind.name(), e));
                }
            };

            Ok(Self {
                image,
                view,
                allocation: Some(allocation),
                width,
                height,
                samples,
            })
        }
    }

    /// Destroy the view and image and return the memory to the allocator
    pub(crate) fn destroy(mut self, device: &ash::Device, allocator: &mut Allocator) -> Result<()> {
        unsafe {
            device.destroy_image_view(self.view, None);
            device.destroy_image(self.image, None);
        }
        if let Some(allocation) = self.allocation.take() {
            allocator.free(allocation)
                .map_err(|e| engine_err!("xrstereo::vulkan",
                    "Failed to free attachment memory: {:?}", e))?;
        }
        Ok(())
    }
}
