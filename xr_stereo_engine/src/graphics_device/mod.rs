/// Graphics device module - GPU backend traits used to build and draw into render targets

pub mod graphics_device;

#[cfg(test)]
pub mod mock_graphics_device;

pub use graphics_device::*;
