/// Compositor types - handles, timing, poses and layer descriptors
///
/// Everything exchanged with the compositor is plain data: opaque handles the
/// compositor owns, timestamps it supplies, and the layer descriptors the
/// engine submits at the end of every frame.

use std::time::Duration;
use bitflags::bitflags;
use glam::{Quat, Vec3};

/// Compositor swapchain handle (lifetime bounded by create/destroy calls)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapchainHandle(pub u64);

/// Compositor-owned color image, borrowed by render targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Predicted display time in compositor nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DisplayTime(pub i64);

impl DisplayTime {
    pub fn as_nanos(self) -> i64 {
        self.0
    }
}

/// Result of the frame pacing wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Time at which the frame being rendered is expected to be shown
    pub predicted_display_time: DisplayTime,
    /// Expected interval between displayed frames
    pub predicted_display_period: Duration,
    /// False when the compositor will not show this frame (rendering may be skipped)
    pub should_render: bool,
}

/// Rigid transform of an eye in the reference space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}

/// Asymmetric field of view (radians, left/down negative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fov {
    pub angle_left: f32,
    pub angle_right: f32,
    pub angle_up: f32,
    pub angle_down: f32,
}

impl Fov {
    /// Symmetric field of view with the given half angle on every side
    pub fn symmetric(half_angle: f32) -> Self {
        Self {
            angle_left: -half_angle,
            angle_right: half_angle,
            angle_up: half_angle,
            angle_down: -half_angle,
        }
    }

    /// True when the frustum has a finite, non-degenerate extent
    pub fn is_valid(&self) -> bool {
        let angles = [self.angle_left, self.angle_right, self.angle_up, self.angle_down];
        angles.iter().all(|a| a.is_finite() && a.abs() < std::f32::consts::FRAC_PI_2)
            && self.angle_right > self.angle_left
            && self.angle_up > self.angle_down
    }
}

impl Default for Fov {
    fn default() -> Self {
        Self::symmetric(std::f32::consts::FRAC_PI_4)
    }
}

/// Located eye: pose and field of view at a display time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct View {
    pub pose: Pose,
    pub fov: Fov,
}

impl View {
    pub fn new(pose: Pose, fov: Fov) -> Self {
        Self { pose, fov }
    }

    pub fn is_usable(&self) -> bool {
        self.pose.is_finite() && self.fov.is_valid()
    }
}

/// Swapchain color format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgba8Unorm,
    Rgba8Srgb,
}

/// Parameters of one per-eye compositor swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub view_index: usize,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
    pub format: ColorFormat,
}

/// How the compositor blends submitted layers with the real environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentBlendMode {
    Opaque,
    Additive,
    AlphaBlend,
}

bitflags! {
    /// Composition flags of a projection layer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u32 {
        const CORRECT_CHROMATIC_ABERRATION = 0x1;
        const BLEND_TEXTURE_SOURCE_ALPHA = 0x2;
        const UNPREMULTIPLIED_ALPHA = 0x4;
    }
}

/// Integer rectangle (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle covering a full image of the given size
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// One composited projection view submitted at End
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerDescriptor {
    pub pose: Pose,
    pub fov: Fov,
    pub swapchain: SwapchainHandle,
    pub image_rect: Rect2D,
    pub image_array_index: u32,
    pub flags: LayerFlags,
}
