/// Frame module - per-frame protocol, eye rendering and the frame loop

pub mod frame_phase;
pub mod eye_matrices;
pub mod eye_render_driver;
pub mod frame_sequencer;
pub mod frame_loop;

pub use frame_phase::*;
pub use eye_matrices::*;
pub use eye_render_driver::*;
pub use frame_sequencer::*;
pub use frame_loop::*;
