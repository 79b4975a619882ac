/// Swapchain module - per-eye render targets and the registry keyed by sample count

pub mod render_target;
pub mod stereo_swapchain_builder;
pub mod swapchain_registry;

pub use render_target::*;
pub use stereo_swapchain_builder::*;
pub use swapchain_registry::*;
