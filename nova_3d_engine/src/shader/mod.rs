/// Shader subsystem: descriptors, cache store, compiler, reflection,
/// shader objects and the shader factory

pub mod shader_desc;
pub mod includes;
pub mod shader_cache;
pub mod shader_compiler;
pub mod shader_reflection;
pub mod shader;
pub mod shader_config;
pub mod shader_manager;

pub use crate::graphics_device::{ShaderStage, ShaderStageFlags};
pub use shader_desc::*;
pub use shader_cache::{macro_hash, CompiledStage, CompiledStageBlob, ShaderCache};
pub use shader_compiler::*;
pub use shader_reflection::*;
pub use shader::*;
pub use shader_config::*;
pub use shader_manager::*;
