/// Swapchain registry - one stereo swapchain per sample count
///
/// The registry is mutated only during setup (`ensure`, `insert`) and
/// teardown (`teardown_all`), never while frames are being rendered.

use rustc_hash::FxHashMap;
use crate::compositor::{ColorFormat, CompositorSession};
use crate::error::{Error, Result};
use crate::graphics_device::RenderTargetBuilder;
use crate::{engine_debug, engine_error, engine_info, engine_warn};
use super::render_target::StereoSwapchain;
use super::stereo_swapchain_builder::StereoSwapchainBuilder;

/// Stereo swapchains keyed by sample count
///
/// At most one entry per sample count. The multisample extension of the
/// backend is resolved once, on the first build, and is a hard requirement.
pub struct SwapchainRegistry {
    entries: FxHashMap<u32, StereoSwapchain>,
    format: ColorFormat,
    multisample_extension_loaded: bool,
}

impl SwapchainRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::with_format(ColorFormat::Rgba8Unorm)
    }

    /// Create a new empty registry building swapchains of the given color format
    pub fn with_format(format: ColorFormat) -> Self {
        Self {
            entries: FxHashMap::default(),
            format,
            multisample_extension_loaded: false,
        }
    }

    /// Make sure a stereo swapchain exists for `sample_count`
    ///
    /// Idempotent: if an entry already exists nothing is created and the
    /// other parameters are ignored.
    ///
    /// # Errors
    ///
    /// - `DriverCapabilityMissing` if the backend has no multisample support
    /// - `CompositorRejected` / `FramebufferIncomplete` from the build
    ///
    /// No entry is inserted on error and no partially built resource survives.
    pub fn ensure<C, D>(
        &mut self,
        compositor: &mut C,
        device: &mut D,
        sample_count: u32,
        view_count: usize,
        width: u32,
        height: u32,
    ) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        if self.entries.contains_key(&sample_count) {
            engine_debug!("xrstereo::SwapchainRegistry",
                "Stereo swapchain for {} samples already present", sample_count);
            return Ok(());
        }

        if !self.multisample_extension_loaded {
            device.load_multisample_extension()?;
            self.multisample_extension_loaded = true;
        }

        let stereo = StereoSwapchainBuilder::new(sample_count, view_count, width, height)
            .with_format(self.format)
            .build(compositor, device)?;
        // Absent key checked above; the entry is keyed by the requested count
        self.entries.insert(sample_count, stereo);

        engine_info!("xrstereo::SwapchainRegistry",
            "Stereo swapchain created ({} views, {}x{}, {} samples)",
            view_count, width, height, sample_count);
        Ok(())
    }

    /// Take ownership of a built stereo swapchain
    ///
    /// Returns the swapchain back if an entry already exists for its sample
    /// count; the caller keeps ownership and must release it.
    pub fn insert(&mut self, stereo: StereoSwapchain) -> std::result::Result<(), StereoSwapchain> {
        if self.entries.contains_key(&stereo.sample_count()) {
            return Err(stereo);
        }
        self.entries.insert(stereo.sample_count(), stereo);
        Ok(())
    }

    /// Stereo swapchain for a sample count
    ///
    /// # Errors
    ///
    /// Returns `ProtocolViolation` if `ensure` never succeeded for this sample count.
    pub fn get(&self, sample_count: u32) -> Result<&StereoSwapchain> {
        self.entries.get(&sample_count).ok_or_else(|| {
            engine_error!("xrstereo::SwapchainRegistry",
                "Lookup of {} samples before ensure", sample_count);
            Error::ProtocolViolation(format!("no stereo swapchain for {} samples", sample_count))
        })
    }

    pub fn contains(&self, sample_count: u32) -> bool {
        self.entries.contains_key(&sample_count)
    }

    /// Get the number of stereo swapchains
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered sample counts, ascending
    pub fn sample_counts(&self) -> Vec<u32> {
        let mut counts: Vec<u32> = self.entries.keys().copied().collect();
        counts.sort_unstable();
        counts
    }

    /// Release every stereo swapchain and clear the registry
    ///
    /// Render targets are released before their compositor swapchain. Best
    /// effort: a failure is logged and teardown continues; the first failure
    /// is returned once everything has been attempted. On an empty registry
    /// this is a no-op.
    pub fn teardown_all<C, D>(&mut self, compositor: &mut C, device: &mut D) -> Result<()>
    where
        C: CompositorSession + ?Sized,
        D: RenderTargetBuilder + ?Sized,
    {
        if self.entries.is_empty() {
            return Ok(());
        }

        let mut entries: Vec<(u32, StereoSwapchain)> = self.entries.drain().collect();
        entries.sort_unstable_by_key(|(sample_count, _)| *sample_count);

        let mut first = None;
        for (sample_count, stereo) in entries {
            match stereo.release(compositor, device) {
                Ok(()) => engine_debug!("xrstereo::SwapchainRegistry",
                    "Stereo swapchain for {} samples released", sample_count),
                Err(err) => {
                    engine_warn!("xrstereo::SwapchainRegistry",
                        "Teardown of stereo swapchain for {} samples incomplete: {}", sample_count, err);
                    first.get_or_insert(err);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Default for SwapchainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "swapchain_registry_tests.rs"]
mod tests;
