/*!
# Nova 3D Engine

Shader objects and post-process render passes for the Nova 3D engine.

GLSL stage sources are compiled to SPIR-V, cached on disk per macro
permutation and reflected to build named bind tables. Render passes drive
shaders through a backend-agnostic graphics device.

## Architecture

- **GraphicsDevice**: Factory trait for textures, render targets, samplers, buffers and shader modules
- **CommandList**: Recording trait used by passes (bindings, draws, dispatches, debug events)
- **ShaderManager**: Creates, owns and reloads shaders
- **Shader**: Compiled stages, reflection, CPU constant mirrors
- **ShaderCache**: `.spv` store keyed by source file and macro hash
- **BloomPass**: Bright filter, blur strategy, combine
- **SceneSettings**: Bloom and scene parameters parsed from settings files

Backend implementations provide concrete types that implement the device traits.
*/

// Internal modules
mod error;
pub mod log;
pub mod graphics_device;
pub mod shader;
pub mod render_passes;
pub mod settings;

#[cfg(test)]
mod test_utils;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types and the global logger slot, NOT macros)
    pub mod log {
        pub use crate::log::{
            log, log_detailed, reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Graphics device traits and descriptors
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Shader subsystem
    pub mod shader {
        pub use crate::shader::*;
    }

    // Render passes
    pub mod passes {
        pub use crate::render_passes::*;
    }

    // Scene settings
    pub mod settings {
        pub use crate::settings::*;
    }
}

// Re-export math library at crate root
pub use glam;
