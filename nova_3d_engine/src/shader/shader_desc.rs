/// Shader descriptors: per-stage source files and ordered macro lists

use crate::error::{Error, Result};
use crate::graphics_device::{ShaderStage, ShaderStageFlags};

/// Preprocessor definition passed verbatim to the compiler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderMacro {
    pub name: String,
    pub value: String,
}

impl ShaderMacro {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// One stage of a shader: source file name (relative to the shader root) and
/// its macro list
///
/// Macro order is significant: it is part of the cache key, so macros keep
/// their insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderStageDesc {
    pub file_name: String,
    pub macros: Vec<ShaderMacro>,
}

impl ShaderStageDesc {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            macros: Vec::new(),
        }
    }

    /// Builder-style macro append
    pub fn with_macro(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.macros.push(ShaderMacro::new(name, value));
        self
    }

    /// Set a macro value, keeping its position if it already exists
    ///
    /// Returns true if the macro list changed.
    pub fn set_macro(&mut self, name: &str, value: impl ToString) -> bool {
        let value = value.to_string();
        match self.macros.iter_mut().find(|m| m.name == name) {
            Some(existing) if existing.value == value => false,
            Some(existing) => {
                existing.value = value;
                true
            }
            None => {
                self.macros.push(ShaderMacro::new(name, value));
                true
            }
        }
    }

    /// Current value of a macro
    pub fn macro_value(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }

    /// Stage encoded in the file name suffix
    pub fn stage(&self) -> Option<ShaderStage> {
        ShaderStage::from_file_name(&self.file_name)
    }
}

/// Full shader descriptor, one optional entry per pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderDesc {
    pub name: String,
    pub stages: [Option<ShaderStageDesc>; ShaderStage::COUNT],
}

impl ShaderDesc {
    /// Empty descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Default::default(),
        }
    }

    /// Build a descriptor from stage descriptions, inferring each stage from
    /// its file name suffix
    pub fn from_stages(
        name: impl Into<String>,
        stages: impl IntoIterator<Item = ShaderStageDesc>,
    ) -> Result<Self> {
        let mut desc = Self::new(name);
        for stage_desc in stages {
            let stage = stage_desc.stage().ok_or_else(|| {
                Error::InvalidResource(format!(
                    "Shader '{}': cannot infer stage from '{}'",
                    desc.name, stage_desc.file_name
                ))
            })?;
            if desc.stages[stage.index()].is_some() {
                return Err(Error::InvalidResource(format!(
                    "Shader '{}': duplicate {:?} stage '{}'",
                    desc.name, stage, stage_desc.file_name
                )));
            }
            desc.stages[stage.index()] = Some(stage_desc);
        }
        Ok(desc)
    }

    /// Build `<name>_<suffix>.glsl` stages for every flag in `flags`
    pub fn from_shader_name(name: &str, flags: ShaderStageFlags) -> Self {
        let mut desc = Self::new(name);
        for stage in ShaderStage::ALL {
            if flags.contains(stage.flag()) {
                desc.stages[stage.index()] =
                    Some(ShaderStageDesc::new(format!("{}_{}.glsl", name, stage.suffix())));
            }
        }
        desc
    }

    /// Builder-style stage assignment
    pub fn with_stage(mut self, stage: ShaderStage, stage_desc: ShaderStageDesc) -> Self {
        self.stages[stage.index()] = Some(stage_desc);
        self
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageDesc> {
        self.stages[stage.index()].as_ref()
    }

    pub fn stage_mut(&mut self, stage: ShaderStage) -> Option<&mut ShaderStageDesc> {
        self.stages[stage.index()].as_mut()
    }

    pub fn vertex(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Vertex)
    }

    pub fn hull(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Hull)
    }

    pub fn domain(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Domain)
    }

    pub fn geometry(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Geometry)
    }

    pub fn pixel(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Pixel)
    }

    pub fn compute(&self) -> Option<&ShaderStageDesc> {
        self.stage(ShaderStage::Compute)
    }

    /// Stages with a non-empty file name, in pipeline order
    pub fn active_stages(&self) -> impl Iterator<Item = (ShaderStage, &ShaderStageDesc)> {
        ShaderStage::ALL.into_iter().filter_map(move |stage| {
            self.stage(stage)
                .filter(|s| !s.file_name.is_empty())
                .map(|s| (stage, s))
        })
    }

    /// Set a macro on every present stage, returns true if any stage changed
    pub fn set_macro(&mut self, name: &str, value: impl ToString) -> bool {
        let value = value.to_string();
        let mut changed = false;
        for stage_desc in self.stages.iter_mut().flatten() {
            changed |= stage_desc.set_macro(name, &value);
        }
        changed
    }
}

#[cfg(test)]
#[path = "shader_desc_tests.rs"]
mod tests;
