/// Session configuration
///
/// Static settings chosen by the application before the first frame:
/// requested multisampling, render resolution, clip planes, clear values and
/// the layer parameters handed to the compositor at End.

use std::time::Duration;
use crate::compositor::{ColorFormat, EnvironmentBlendMode, LayerFlags};
use crate::error::{Error, Result};

/// Graphics API the projection matrices are built for
///
/// Selects the clip-space conventions of `projection_from_fov`:
/// OpenGL ES uses depth in [-1, 1] with Y up, Vulkan uses depth in [0, 1]
/// with Y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicsApi {
    OpenGlEs,
    Vulkan,
}

/// View setup reported by the compositor for the chosen view configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfiguration {
    /// Recommended image width per view (pixels)
    pub recommended_width: u32,
    /// Recommended image height per view (pixels)
    pub recommended_height: u32,
    /// Number of views (2 for a stereo headset)
    pub view_count: usize,
}

impl ViewConfiguration {
    /// Stereo configuration with the given recommended image rect
    pub fn stereo(recommended_width: u32, recommended_height: u32) -> Self {
        Self {
            recommended_width,
            recommended_height,
            view_count: 2,
        }
    }

    /// Render extent after dividing the recommended rect, never below 1x1
    pub fn render_extent(&self, divisor: u32) -> (u32, u32) {
        let divisor = divisor.max(1);
        (
            (self.recommended_width / divisor).max(1),
            (self.recommended_height / divisor).max(1),
        )
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Requested MSAA level, clamped to the driver maximum at session start
    pub requested_sample_count: u32,
    /// Render targets are the recommended image rect divided by this value
    pub resolution_divisor: u32,
    /// Near clip plane (meters)
    pub near_z: f32,
    /// Far clip plane (meters)
    pub far_z: f32,
    /// Advisory timeout for waiting on an acquired swapchain image
    pub image_wait_timeout: Duration,
    /// Clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Clear depth
    pub clear_depth: f32,
    /// Environment blend mode submitted at End
    pub blend_mode: EnvironmentBlendMode,
    /// Flags set on every projection layer view
    pub layer_flags: LayerFlags,
    /// Swapchain color format
    pub color_format: ColorFormat,
    /// Clip-space conventions for the eye projections
    pub graphics_api: GraphicsApi,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            requested_sample_count: 4,
            resolution_divisor: 4,
            near_z: 0.05,
            far_z: 100.0,
            image_wait_timeout: Duration::from_nanos(1000),
            clear_color: [0.1, 0.1, 0.1, 0.0],
            clear_depth: 1.0,
            blend_mode: EnvironmentBlendMode::AlphaBlend,
            layer_flags: LayerFlags::CORRECT_CHROMATIC_ABERRATION
                | LayerFlags::BLEND_TEXTURE_SOURCE_ALPHA,
            color_format: ColorFormat::Rgba8Unorm,
            graphics_api: GraphicsApi::OpenGlEs,
        }
    }
}

impl SessionConfig {
    /// Check the configuration against the compositor's view setup
    pub fn validate(&self, view_config: &ViewConfiguration) -> Result<()> {
        if self.requested_sample_count == 0 {
            return Err(Error::InvalidResource("requested sample count must be at least 1".to_string()));
        }
        if self.resolution_divisor == 0 {
            return Err(Error::InvalidResource("resolution divisor must be at least 1".to_string()));
        }
        if !(self.near_z > 0.0 && self.far_z > self.near_z) {
            return Err(Error::InvalidResource(format!(
                "invalid clip planes: near {} far {}",
                self.near_z, self.far_z
            )));
        }
        if view_config.view_count == 0 {
            return Err(Error::InvalidResource("view configuration reports zero views".to_string()));
        }
        if view_config.recommended_width == 0 || view_config.recommended_height == 0 {
            return Err(Error::InvalidResource(format!(
                "recommended image rect {}x{} is empty",
                view_config.recommended_width, view_config.recommended_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
