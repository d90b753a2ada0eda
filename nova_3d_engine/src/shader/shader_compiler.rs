/// Shader compiler seam and the GLSL -> SPIR-V implementation

use std::path::Path;
use naga::back::spv;
use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStage;
use crate::shader::includes::expand_includes;
use crate::shader::ShaderMacro;

/// Compiles one stage source file with a macro set into SPIR-V words
pub trait ShaderCompiler: Send + Sync {
    /// Compile a stage
    ///
    /// # Arguments
    ///
    /// * `source_path` - Path of the stage source
    /// * `stage` - Pipeline stage the source is compiled for
    /// * `macros` - Preprocessor definitions, in order
    ///
    /// # Errors
    ///
    /// `FileNotFound` when the source (or an include) cannot be read,
    /// `CompileFailed` with the compiler diagnostic otherwise.
    fn compile(&self, source_path: &Path, stage: ShaderStage, macros: &[ShaderMacro]) -> Result<Vec<u32>>;
}

/// GLSL compiler built on naga
///
/// Only vertex, pixel and compute stages are supported. Debug names are kept
/// in the output so reflection can recover binding and member names.
#[derive(Debug, Clone)]
pub struct GlslCompiler {
    entry_point: String,
}

impl GlslCompiler {
    pub fn new() -> Self {
        Self::with_entry_point("main")
    }

    /// Compiler whose SPIR-V entry point is renamed to `entry_point`
    ///
    /// GLSL sources always declare `main`; the name only changes in the output.
    pub fn with_entry_point(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn naga_stage(stage: ShaderStage) -> Option<naga::ShaderStage> {
        match stage {
            ShaderStage::Vertex => Some(naga::ShaderStage::Vertex),
            ShaderStage::Pixel => Some(naga::ShaderStage::Fragment),
            ShaderStage::Compute => Some(naga::ShaderStage::Compute),
            ShaderStage::Hull | ShaderStage::Domain | ShaderStage::Geometry => None,
        }
    }
}

impl Default for GlslCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCompiler for GlslCompiler {
    fn compile(&self, source_path: &Path, stage: ShaderStage, macros: &[ShaderMacro]) -> Result<Vec<u32>> {
        let naga_stage = Self::naga_stage(stage).ok_or_else(|| {
            Error::CompileFailed(format!(
                "{}: {:?} stage is not supported by the GLSL frontend",
                source_path.display(),
                stage
            ))
        })?;

        let source = expand_includes(source_path)?;

        let mut options = glsl::Options::from(naga_stage);
        for m in macros {
            options.defines.insert(m.name.clone(), m.value.clone());
        }

        let mut module = glsl::Frontend::default()
            .parse(&options, &source)
            .map_err(|e| {
                Error::CompileFailed(format!(
                    "{}:\n{}",
                    source_path.display(),
                    e.emit_to_string(&source)
                ))
            })?;
        for entry in module.entry_points.iter_mut() {
            entry.name = self.entry_point.clone();
        }

        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| {
                Error::CompileFailed(format!(
                    "{}:\n{}",
                    source_path.display(),
                    e.emit_to_string(&source)
                ))
            })?;

        let mut spv_options = spv::Options::default();
        spv_options.flags |= spv::WriterFlags::DEBUG;
        let pipeline_options = spv::PipelineOptions {
            shader_stage: naga_stage,
            entry_point: self.entry_point.clone(),
        };

        spv::write_vec(&module, &info, &spv_options, Some(&pipeline_options))
            .map_err(|e| Error::CompileFailed(format!("{}: {}", source_path.display(), e)))
    }
}

#[cfg(test)]
#[path = "shader_compiler_tests.rs"]
mod tests;
