/*!
# XR Stereo Engine

Frame-synchronization and swapchain-management core of a stereo mixed-reality
renderer.

This crate coordinates a head-mounted display's compositor with a GPU backend so
that both eye views are rendered into the right buffers at the predicted display
time, every frame. The compositor and the GPU backend are external collaborators,
reached through traits; backend implementations (Vulkan, ...) live in their own
crates.

## Architecture

- **CompositorSession**: frame pacing, view location, swapchain images, layer submission
- **RenderTargetBuilder / DrawContext**: GPU backend used to build and draw into render targets
- **StereoSwapchainBuilder**: all-or-nothing construction of per-eye render targets
- **SwapchainRegistry**: one stereo swapchain per sample count
- **FrameSequencer**: predict → begin → locate → per-eye render → end, with per-step recovery
- **EyeRenderDriver**: draws the scene for one eye into one compositor image
- **SessionContext / FrameLoop**: explicit session state and ordered shutdown
*/

// Internal modules
mod error;
mod engine;
mod config;
mod session;
pub mod log;
pub mod compositor;
pub mod graphics_device;
pub mod swapchain;
pub mod frame;
pub mod scene;

// Main xrstereo namespace module
pub mod xrstereo {
    // Error types
    pub use crate::error::{Error, Result, CompositorCall};

    // Logging entry point
    pub use crate::engine::Engine;

    // Session configuration and context
    pub use crate::config::{SessionConfig, ViewConfiguration, GraphicsApi};
    pub use crate::session::{SessionContext, choose_sample_count};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, LogFacadeLogger};
        // Note: engine_* macros are NOT re-exported here - they are exported at crate root
    }

    // Compositor sub-module
    pub mod compositor {
        pub use crate::compositor::*;
    }

    // GPU backend sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Swapchain sub-module
    pub mod swapchain {
        pub use crate::swapchain::*;
    }

    // Frame sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Scene input
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
