/// Frame sequencer - the per-frame compositor protocol
///
/// One call to `run_frame` drives a whole frame in a fixed order:
///
/// 1. predict (`wait_frame`) - failure skips the frame
/// 2. begin - failure skips the frame, no GPU work is issued
/// 3. locate views - failure degrades to the last known views
/// 4. per eye: acquire, wait, render, flush, release - failures are recorded
///    per eye and never stop the frame
/// 5. end - always called once Begin succeeded, so Begin/End stay paired
///
/// The compositor's `should_render` hint is reported but never skips a step.
///
/// Per-frame compositor and backend failures are logged and reported in the
/// returned `FrameOutcome`; only protocol violations (programmer errors)
/// come back as `Err`.

use crate::compositor::{CompositorSession, DisplayTime, LayerDescriptor, View};
use crate::error::{Error, Result};
use crate::graphics_device::DrawContext;
use crate::scene::Scene;
use crate::session::SessionContext;
use crate::swapchain::StereoSwapchain;
use crate::{engine_error, engine_trace, engine_warn};
use super::eye_render_driver::EyeRenderDriver;
use super::frame_phase::FramePhase;

// ============================================================================
// Frame report
// ============================================================================

/// Why a frame was skipped before Begin
#[derive(Debug, Clone)]
pub enum SkipReason {
    WaitFrameFailed(Error),
    BeginFrameFailed(Error),
}

/// Non-fatal failure of one eye
#[derive(Debug, Clone)]
pub enum EyeFault {
    /// No image was acquired; wait, render and release were skipped
    AcquireFailed(Error),
    /// The advisory wait expired; the eye was rendered anyway
    ImageWaitTimedOut,
    ImageWaitFailed(Error),
    RenderFailed(Error),
    FlushFailed(Error),
    ReleaseFailed(Error),
}

/// What happened to one eye during a frame
#[derive(Debug, Clone)]
pub struct EyeReport {
    pub eye: usize,
    /// Acquired image index, if acquire succeeded
    pub image_index: Option<u32>,
    /// True when the render call was attempted
    pub render_attempted: bool,
    pub faults: Vec<EyeFault>,
}

impl EyeReport {
    fn new(eye: usize) -> Self {
        Self {
            eye,
            image_index: None,
            render_attempted: false,
            faults: Vec::new(),
        }
    }
}

/// Summary of a frame that reached End
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub display_time: DisplayTime,
    /// Compositor hint, reported only; the frame is rendered either way
    pub should_render: bool,
    /// Locate failed or returned fewer views; fallback views were used
    pub locate_degraded: bool,
    pub eyes: Vec<EyeReport>,
    pub layers_submitted: usize,
    /// Set when the compositor refused End
    pub end_error: Option<Error>,
}

impl FrameReport {
    /// True when nothing degraded during the frame
    pub fn is_clean(&self) -> bool {
        !self.locate_degraded
            && self.end_error.is_none()
            && self.eyes.iter().all(|e| e.faults.is_empty())
    }
}

#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// Predict or Begin failed; no Begin is outstanding
    Skipped(SkipReason),
    /// Begin succeeded and End was called exactly once
    Submitted(FrameReport),
}

impl FrameOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, FrameOutcome::Submitted(_))
    }

    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            FrameOutcome::Submitted(report) => Some(report),
            FrameOutcome::Skipped(_) => None,
        }
    }
}

/// Frame counters since the sequencer was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub submitted: u64,
    pub skipped: u64,
    /// Submitted frames that were not clean
    pub degraded: u64,
}

// ============================================================================
// Frame sequencer
// ============================================================================

pub struct FrameSequencer {
    phase: FramePhase,
    last_views: Vec<View>,
    stats: FrameStats,
}

impl FrameSequencer {
    /// Create a sequencer for `view_count` eyes, starting from default views
    pub fn new(view_count: usize) -> Self {
        Self {
            phase: FramePhase::Idle,
            last_views: vec![View::default(); view_count],
            stats: FrameStats::default(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Views used by the most recent frame (fallback for the next Locate failure)
    pub fn last_views(&self) -> &[View] {
        &self.last_views
    }

    /// Run one frame
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the session is shut down or has no active
    /// swapchain (checked before any compositor call), or if the phase
    /// machine detects an illegal sequence.
    pub fn run_frame<C, D>(
        &mut self,
        session: &SessionContext,
        compositor: &mut C,
        device: &mut D,
        scene: &Scene,
    ) -> Result<FrameOutcome>
    where
        C: CompositorSession + ?Sized,
        D: DrawContext + ?Sized,
    {
        let swapchain = session.active_swapchain()?;
        if self.phase.is_in_frame() {
            engine_error!("xrstereo::FrameSequencer",
                "Frame started while previous frame is {:?}", self.phase);
            return Err(Error::ProtocolViolation(format!(
                "frame started while previous frame is {:?}",
                self.phase
            )));
        }
        if self.last_views.len() != swapchain.view_count() {
            self.last_views.resize(swapchain.view_count(), View::default());
        }

        // ===== PREDICT =====
        let timing = match compositor.wait_frame() {
            Ok(timing) => timing,
            Err(err) => {
                engine_warn!("xrstereo::FrameSequencer", "waitFrame failed, skipping frame: {}", err);
                self.stats.skipped += 1;
                return Ok(FrameOutcome::Skipped(SkipReason::WaitFrameFailed(err)));
            }
        };
        self.phase.advance(FramePhase::Predicted)?;
        let display_time = timing.predicted_display_time;

        // ===== BEGIN =====
        if let Err(err) = compositor.begin_frame() {
            engine_warn!("xrstereo::FrameSequencer", "beginFrame failed, skipping frame: {}", err);
            self.phase.advance(FramePhase::Idle)?;
            self.stats.skipped += 1;
            return Ok(FrameOutcome::Skipped(SkipReason::BeginFrameFailed(err)));
        }
        self.phase.advance(FramePhase::Began)?;

        // From here on End is owed to the compositor
        let mut report = FrameReport {
            display_time,
            should_render: timing.should_render,
            locate_degraded: false,
            eyes: Vec::new(),
            layers_submitted: 0,
            end_error: None,
        };
        let mut layers = Vec::new();

        if !timing.should_render {
            // Advisory only: every step still runs so End gets one layer per view
            engine_trace!("xrstereo::FrameSequencer",
                "Compositor hinted not to render frame at {}", display_time.as_nanos());
        }
        self.phase.advance(FramePhase::RenderingEyes)?;

        // ===== LOCATE =====
        report.locate_degraded = self.locate_views(compositor, display_time);

        // ===== PER-EYE RENDER =====
        let driver = EyeRenderDriver::from_config(session.config());
        for eye in 0..swapchain.view_count() {
            let view = self.last_views[eye];
            let (eye_report, layer) = Self::render_eye(
                session, swapchain, &driver, compositor, device, scene, eye, &view,
            );
            report.eyes.push(eye_report);
            layers.push(layer);
        }

        // ===== END =====
        self.phase.advance(FramePhase::Ended)?;
        report.layers_submitted = layers.len();
        if let Err(err) = compositor.end_frame(display_time, session.config().blend_mode, &layers) {
            engine_error!("xrstereo::FrameSequencer", "endFrame failed: {}", err);
            report.end_error = Some(err);
        }

        self.stats.submitted += 1;
        if !report.is_clean() {
            self.stats.degraded += 1;
        }
        Ok(FrameOutcome::Submitted(report))
    }

    /// Refresh `last_views`, returning true if any eye fell back
    fn locate_views<C: CompositorSession + ?Sized>(&mut self, compositor: &mut C, display_time: DisplayTime) -> bool {
        let view_count = self.last_views.len();
        match compositor.locate_views(display_time, view_count) {
            Ok(views) => {
                let mut degraded = views.len() < view_count;
                for (slot, located) in self.last_views.iter_mut().zip(views.iter()) {
                    if located.is_usable() {
                        *slot = *located;
                    } else {
                        degraded = true;
                    }
                }
                if degraded {
                    engine_warn!("xrstereo::FrameSequencer",
                        "locateViews returned {} usable of {} views, using last known views",
                        views.iter().filter(|v| v.is_usable()).count(), view_count);
                }
                degraded
            }
            Err(err) => {
                engine_warn!("xrstereo::FrameSequencer",
                    "locateViews failed, using last known views: {}", err);
                true
            }
        }
    }

    /// Acquire, wait, render, flush and release one eye
    ///
    /// Always produces the eye's layer so End receives one layer per view.
    #[allow(clippy::too_many_arguments)]
    fn render_eye<C, D>(
        session: &SessionContext,
        swapchain: &StereoSwapchain,
        driver: &EyeRenderDriver,
        compositor: &mut C,
        device: &mut D,
        scene: &Scene,
        eye: usize,
        view: &View,
    ) -> (EyeReport, LayerDescriptor)
    where
        C: CompositorSession + ?Sized,
        D: DrawContext + ?Sized,
    {
        let mut report = EyeReport::new(eye);
        let eye_swapchain = &swapchain.eyes()[eye];
        let handle = eye_swapchain.handle();
        let layer = LayerDescriptor {
            pose: view.pose,
            fov: view.fov,
            swapchain: handle,
            image_rect: eye_swapchain.full_rect(),
            image_array_index: 0,
            flags: session.config().layer_flags,
        };

        let image_index = match compositor.acquire_image(handle) {
            Ok(index) => index,
            Err(err) => {
                engine_warn!("xrstereo::FrameSequencer", "acquireImage failed for eye {}: {}", eye, err);
                report.faults.push(EyeFault::AcquireFailed(err));
                return (report, layer);
            }
        };
        report.image_index = Some(image_index);

        match compositor.wait_image(handle, session.config().image_wait_timeout) {
            Ok(()) => {}
            Err(Error::ImageTimeout) => {
                engine_warn!("xrstereo::FrameSequencer",
                    "waitImage timed out for eye {}, rendering anyway", eye);
                report.faults.push(EyeFault::ImageWaitTimedOut);
            }
            Err(err) => {
                engine_warn!("xrstereo::FrameSequencer", "waitImage failed for eye {}: {}", eye, err);
                report.faults.push(EyeFault::ImageWaitFailed(err));
            }
        }

        report.render_attempted = true;
        if let Err(err) = driver.render_eye(device, swapchain, eye, image_index as usize, view, scene) {
            engine_warn!("xrstereo::FrameSequencer", "Rendering eye {} failed: {}", eye, err);
            report.faults.push(EyeFault::RenderFailed(err));
        }
        if let Err(err) = device.flush() {
            engine_warn!("xrstereo::FrameSequencer", "Flush failed for eye {}: {}", eye, err);
            report.faults.push(EyeFault::FlushFailed(err));
        }

        if let Err(err) = compositor.release_image(handle) {
            engine_warn!("xrstereo::FrameSequencer", "releaseImage failed for eye {}: {}", eye, err);
            report.faults.push(EyeFault::ReleaseFailed(err));
        }

        (report, layer)
    }
}

#[cfg(test)]
#[path = "frame_sequencer_tests.rs"]
mod tests;
