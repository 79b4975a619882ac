/// Compositor module - the external display runtime as seen by the engine

pub mod compositor_types;
pub mod compositor_session;

#[cfg(test)]
pub mod mock_compositor;

pub use compositor_types::*;
pub use compositor_session::*;
