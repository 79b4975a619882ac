/// Frame loop - runs frames until the application asks to exit, then tears down
///
/// The loop owns no platform code. Once per iteration it calls the `poll`
/// hook, where the application drains lifecycle events and updates the
/// scene, before any swapchain state is touched. Exit is only observed
/// between frames, so an in-flight Begin always gets its End first.
///
/// Shutdown order after the loop: swapchains (here), then the compositor
/// session, then the display context (both by the caller, in that order).

use crate::compositor::CompositorSession;
use std::time::Duration;
use crate::{engine_info, engine_trace};
use crate::error::Result;
use crate::graphics_device::GraphicsDevice;
use crate::scene::Scene;
use crate::session::SessionContext;
use super::frame_sequencer::{FrameSequencer, FrameStats};

/// Decision returned by the poll hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Session is running: render a frame
    Render,
    /// Session is not ready (not focused, paused, ...): skip rendering this iteration
    Idle,
    /// Stop the loop and tear down swapchains
    Exit,
}

/// Sleep after an `Idle` poll unless the host overrides it
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(5);

pub struct FrameLoop {
    sequencer: FrameSequencer,
    idle_backoff: Duration,
    idle_iterations: u64,
}

impl FrameLoop {
    pub fn new(session: &SessionContext) -> Self {
        Self {
            sequencer: FrameSequencer::new(session.view_count()),
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            idle_iterations: 0,
        }
    }

    /// Pause applied after each `Idle` poll
    ///
    /// Use `Duration::ZERO` when `poll` already blocks on the event source.
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn idle_backoff(&self) -> Duration {
        self.idle_backoff
    }

    /// Number of `Idle` polls since the loop was created
    pub fn idle_iterations(&self) -> u64 {
        self.idle_iterations
    }

    pub fn sequencer(&self) -> &FrameSequencer {
        &self.sequencer
    }

    /// Run until `poll` returns `LoopControl::Exit`
    ///
    /// `Idle` iterations do not call the compositor; each one sleeps for the
    /// idle back-off before polling again.
    ///
    /// # Errors
    ///
    /// A `ProtocolViolation` from the sequencer stops the loop; swapchains
    /// are still torn down and the violation is returned. Otherwise the
    /// teardown result is returned.
    pub fn run<C, D, P>(
        &mut self,
        session: &mut SessionContext,
        compositor: &mut C,
        device: &mut D,
        scene: &mut Scene,
        mut poll: P,
    ) -> Result<FrameStats>
    where
        C: CompositorSession + ?Sized,
        D: GraphicsDevice + ?Sized,
        P: FnMut(&mut Scene) -> LoopControl,
    {
        let mut failure = None;
        loop {
            match poll(scene) {
                LoopControl::Exit => break,
                LoopControl::Idle => {
                    self.idle_iterations += 1;
                    engine_trace!("xrstereo::FrameLoop",
                        "Session idle, backing off {:?}", self.idle_backoff);
                    if !self.idle_backoff.is_zero() {
                        std::thread::sleep(self.idle_backoff);
                    }
                }
                LoopControl::Render => {
                    if let Err(err) = self.sequencer.run_frame(session, compositor, device, scene) {
                        failure = Some(err);
                        break;
                    }
                }
            }
        }

        let stats = self.sequencer.stats();
        engine_info!("xrstereo::FrameLoop",
            "Frame loop stopped ({} submitted, {} skipped, {} degraded)",
            stats.submitted, stats.skipped, stats.degraded);

        let teardown = session.shutdown(compositor, device);
        match failure {
            Some(err) => Err(err),
            None => teardown.map(|()| stats),
        }
    }
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
