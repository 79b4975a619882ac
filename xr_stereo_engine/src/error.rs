//! Error types for the XR stereo engine
//!
//! This module defines the error taxonomy used throughout the engine: swapchain
//! construction, compositor protocol failures, and backend errors.

use std::fmt;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Compositor entry point that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositorCall {
    CreateSwapchain,
    EnumerateImages,
    DestroySwapchain,
    WaitFrame,
    BeginFrame,
    LocateViews,
    AcquireImage,
    WaitImage,
    ReleaseImage,
    EndFrame,
}

impl fmt::Display for CompositorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompositorCall::CreateSwapchain => "createSwapchain",
            CompositorCall::EnumerateImages => "enumerateImages",
            CompositorCall::DestroySwapchain => "destroySwapchain",
            CompositorCall::WaitFrame => "waitFrame",
            CompositorCall::BeginFrame => "beginFrame",
            CompositorCall::LocateViews => "locateViews",
            CompositorCall::AcquireImage => "acquireImage",
            CompositorCall::WaitImage => "waitImage",
            CompositorCall::ReleaseImage => "releaseImage",
            CompositorCall::EndFrame => "endFrame",
        };
        f.write_str(name)
    }
}

/// Engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A required driver extension or entry point is absent
    DriverCapabilityMissing(String),

    /// The compositor refused a call
    CompositorRejected {
        call: CompositorCall,
        reason: String,
    },

    /// A render target failed the completeness check after attachment
    FramebufferIncomplete {
        eye: usize,
        image_index: usize,
        reason: String,
    },

    /// Waiting for a swapchain image expired (non-fatal)
    ImageTimeout,

    /// An operation was invoked outside its valid state (programmer error)
    ProtocolViolation(String),

    /// Backend-specific error (Vulkan, GLES, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or argument (extent, sample count, handle, ...)
    InvalidResource(String),

    /// Initialization failed (session, backend, subsystems)
    InitializationFailed(String),
}

impl Error {
    /// Shorthand for a compositor refusal
    pub fn rejected(call: CompositorCall, reason: impl Into<String>) -> Self {
        Error::CompositorRejected { call, reason: reason.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DriverCapabilityMissing(msg) => write!(f, "Driver capability missing: {}", msg),
            Error::CompositorRejected { call, reason } => {
                write!(f, "Compositor rejected {}: {}", call, reason)
            }
            Error::FramebufferIncomplete { eye, image_index, reason } => write!(
                f,
                "Framebuffer incomplete (eye {}, image {}): {}",
                eye, image_index, reason
            ),
            Error::ImageTimeout => write!(f, "Timed out waiting for swapchain image"),
            Error::ProtocolViolation(msg) => write!(f, "Protocol violation: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build a `BackendError` from the same message
///
/// # Example
///
/// ```no_run
/// # use xr_stereo_engine::engine_err;
/// let err = engine_err!("xrstereo::vulkan", "Failed to create image: {}", 42);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::xrstereo::Engine::log_detailed(
            $crate::xrstereo::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::xrstereo::Error::BackendError(message)
    }};
}

/// Log an ERROR and return early with a `BackendError`
///
/// # Example
///
/// ```no_run
/// # use xr_stereo_engine::engine_bail;
/// fn check(index: usize) -> xr_stereo_engine::xrstereo::Result<()> {
///     if index > 3 {
///         engine_bail!("xrstereo::Registry", "index {} out of range", index);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
