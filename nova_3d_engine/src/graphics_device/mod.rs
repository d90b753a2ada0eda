/// Graphics device module - backend-facing traits and resource descriptors

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod sampler;
pub mod buffer;
pub mod shader_module;
pub mod pipeline_state;
pub mod command_list;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use sampler::*;
pub use buffer::*;
pub use shader_module::*;
pub use pipeline_state::*;
pub use command_list::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
