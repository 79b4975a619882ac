/// Frame phase - explicit state machine of the per-frame protocol
///
/// ```text
///  Idle/Ended --predict--> Predicted --begin--> Began --> RenderingEyes --> Ended
///                              |                  \___________________________^
///                              +--begin failed--> Idle
/// ```
///
/// Every transition is checked; an illegal one (End without Begin, a second
/// Begin inside a frame, ...) is a `ProtocolViolation`.

use crate::engine_error;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePhase {
    /// No frame in flight
    #[default]
    Idle,
    /// Display time predicted, frame not begun
    Predicted,
    /// Frame begun, End owed to the compositor
    Began,
    /// Eyes being acquired, rendered and released
    RenderingEyes,
    /// End submitted
    Ended,
}

impl FramePhase {
    /// True between a successful Begin and its End
    pub fn is_in_frame(self) -> bool {
        matches!(self, FramePhase::Began | FramePhase::RenderingEyes)
    }

    pub fn can_transition_to(self, next: FramePhase) -> bool {
        use FramePhase::*;
        matches!(
            (self, next),
            (Idle, Predicted)
                | (Ended, Predicted)
                | (Predicted, Began)
                | (Predicted, Idle)
                | (Began, RenderingEyes)
                | (Began, Ended)
                | (RenderingEyes, Ended)
        )
    }

    /// Move to `next`, or fail without changing state
    pub fn advance(&mut self, next: FramePhase) -> Result<()> {
        if !self.can_transition_to(next) {
            engine_error!("xrstereo::FramePhase",
                "Illegal frame transition {:?} -> {:?}", self, next);
            return Err(Error::ProtocolViolation(format!(
                "illegal frame transition {:?} -> {:?}",
                self, next
            )));
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_phase_tests.rs"]
mod tests;
