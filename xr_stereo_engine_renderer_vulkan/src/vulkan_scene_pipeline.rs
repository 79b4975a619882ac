/// Scene pipeline - application-provided graphics pipeline for scene objects
///
/// The backend records draws with it but does not own it. The pipeline must be
/// created against `VulkanGraphicsDevice::render_pass(sample_count)` (or a
/// compatible pass), with dynamic viewport and scissor state and a push
/// constant range covering `ScenePushConstants` for the vertex and fragment
/// stages.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Shader stages reading `ScenePushConstants`
pub const SCENE_PUSH_CONSTANT_STAGES: vk::ShaderStageFlags =
    vk::ShaderStageFlags::from_raw(
        vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw(),
    );

/// Handles needed to draw one mesh for every scene object
#[derive(Debug, Clone, Copy)]
pub struct ScenePipeline {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub vertex_buffer: vk::Buffer,
    pub index_buffer: vk::Buffer,
    pub index_type: vk::IndexType,
    pub index_count: u32,
}

/// Per-object push constants (96 bytes, within the guaranteed 128)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScenePushConstants {
    /// projection * view * model
    pub mvp: [[f32; 4]; 4],
    /// rgb, alpha = 1
    pub color: [f32; 4],
    /// World-space eye position, w unused
    pub eye_position: [f32; 4],
}

impl ScenePushConstants {
    pub fn new(view_projection: Mat4, model: Mat4, color: Vec3, eye_position: Vec3) -> Self {
        Self {
            mvp: (view_projection * model).to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
            eye_position: eye_position.extend(0.0).to_array(),
        }
    }

    /// Push constant range to declare in the pipeline layout
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: SCENE_PUSH_CONSTANT_STAGES,
            offset: 0,
            size: std::mem::size_of::<Self>() as u32,
        }
    }
}

#[cfg(test)]
#[path = "vulkan_scene_pipeline_tests.rs"]
mod tests;
