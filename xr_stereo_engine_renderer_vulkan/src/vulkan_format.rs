/// Conversions between engine descriptions and Vulkan enums

use ash::vk;
use xr_stereo_engine::xrstereo::compositor::ColorFormat;

/// Depth format used for every depth buffer
pub(crate) const DEPTH_FORMAT: vk::Format = vk::Format::D24_UNORM_S8_UINT;

pub(crate) fn color_format_to_vk(format: ColorFormat) -> vk::Format {
    match format {
        ColorFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        ColorFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
    }
}

/// Vulkan flag for an exact sample count (1, 2, 4, ... 64)
pub(crate) fn sample_count_to_vk(sample_count: u32) -> Option<vk::SampleCountFlags> {
    match sample_count {
        1 => Some(vk::SampleCountFlags::TYPE_1),
        2 => Some(vk::SampleCountFlags::TYPE_2),
        4 => Some(vk::SampleCountFlags::TYPE_4),
        8 => Some(vk::SampleCountFlags::TYPE_8),
        16 => Some(vk::SampleCountFlags::TYPE_16),
        32 => Some(vk::SampleCountFlags::TYPE_32),
        64 => Some(vk::SampleCountFlags::TYPE_64),
        _ => None,
    }
}

/// Highest sample count usable by both color and depth attachments
pub(crate) fn max_common_sample_count(
    color: vk::SampleCountFlags,
    depth: vk::SampleCountFlags,
) -> u32 {
    let common = color & depth;
    [64, 32, 16, 8, 4, 2, 1]
        .into_iter()
        .find(|&count| {
            sample_count_to_vk(count).is_some_and(|flag| common.contains(flag))
        })
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
