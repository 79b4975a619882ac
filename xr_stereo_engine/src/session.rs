/// Session context - explicit per-session state
///
/// Holds the swapchain registry, the effective sample count and the render
/// extent for one compositor session. It is passed by reference to the frame
/// sequencer and the frame loop; there is no process-wide instance.

use crate::compositor::CompositorSession;
use crate::config::{SessionConfig, ViewConfiguration};
use crate::error::{Error, Result};
use crate::graphics_device::RenderTargetBuilder;
use crate::swapchain::{StereoSwapchain, SwapchainRegistry};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Effective MSAA level: the requested level clamped to the driver maximum, at least 1
pub fn choose_sample_count(requested: u32, driver_max: u32) -> u32 {
    let effective = requested.min(driver_max).max(1);
    if effective < requested {
        engine_warn!("xrstereo::SessionContext",
            "Requested {} samples but the driver supports at most {}; render quality may be impacted",
            requested, driver_max);
    }
    effective
}

pub struct SessionContext {
    config: SessionConfig,
    view_config: ViewConfiguration,
    sample_count: u32,
    width: u32,
    height: u32,
    registry: SwapchainRegistry,
    shut_down: bool,
}

impl SessionContext {
    /// Create the context for a session
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    /// * `view_config` - View setup reported by the compositor
    /// * `driver_max_samples` - Highest sample count supported by the GPU backend
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if the configuration is invalid.
    pub fn new(config: SessionConfig, view_config: ViewConfiguration, driver_max_samples: u32) -> Result<Self> {
        config.validate(&view_config)?;

        let sample_count = choose_sample_count(config.requested_sample_count, driver_max_samples);
        let (width, height) = view_config.render_extent(config.resolution_divisor);
        engine_info!("xrstereo::SessionContext",
            "Session: {} views, render extent {}x{}, {} samples",
            view_config.view_count, width, height, sample_count);

        Ok(Self {
            registry: SwapchainRegistry::with_format(config.color_format),
            config,
            view_config,
            sample_count,
            width,
            height,
            shut_down: false,
        })
    }

    // ===== GETTERS =====

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn view_configuration(&self) -> &ViewConfiguration {
        &self.view_config
    }

    pub fn view_count(&self) -> usize {
        self.view_config.view_count
    }

    /// Sample count every render operation uses
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Render target size (width, height)
    pub fn render_extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn registry(&self) -> &SwapchainRegistry {
        &self.registry
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ===== LIFECYCLE =====

    /// Build the stereo swapchain for the effective sample count
    pub fn initialize_swapchains<C, D>(&mut self, compositor: &mut C, device: &mut D) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        self.ensure_live("initialize swapchains")?;
        self.registry.ensure(
            compositor,
            device,
            self.sample_count,
            self.view_config.view_count,
            self.width,
            self.height,
        )
    }

    /// Stereo swapchain used for rendering
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` after shutdown or before `initialize_swapchains`.
    pub fn active_swapchain(&self) -> Result<&StereoSwapchain> {
        self.ensure_live("render")?;
        self.registry.get(self.sample_count)
    }

    /// Tear down every swapchain (once)
    ///
    /// Must be called after rendering has stopped and before the compositor
    /// session is destroyed. Later calls are no-ops.
    pub fn shutdown<C, D>(&mut self, compositor: &mut C, device: &mut D) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        if self.shut_down {
            engine_debug!("xrstereo::SessionContext", "Shutdown already done");
            return Ok(());
        }
        self.shut_down = true;

        let result = self.registry.teardown_all(compositor, device);
        engine_info!("xrstereo::SessionContext", "Swapchains torn down");
        result
    }

    fn ensure_live(&self, operation: &str) -> Result<()> {
        if self.shut_down {
            engine_error!("xrstereo::SessionContext", "Cannot {} after shutdown", operation);
            return Err(Error::ProtocolViolation(format!("cannot {} after shutdown", operation)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
