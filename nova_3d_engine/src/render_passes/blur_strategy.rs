/// Blur strategy interface shared by the bloom pass blur implementations

use std::fmt;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandList, TextureId};
use crate::render_passes::BloomSettings;
use crate::shader::{Shader, ShaderId, ShaderManager};

/// Available blur implementations, selected once at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurStrategyKind {
    /// Full-screen pixel shader passes alternating horizontal/vertical
    SeparablePixel,
    /// Two compute dispatches, one thread group per scanline
    Compute,
    /// Compute horizontal blur, transpose, horizontal blur again
    ComputeTranspose,
}

impl BlurStrategyKind {
    /// Strategy for a configuration index (0, 1, 2), `None` otherwise
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(BlurStrategyKind::SeparablePixel),
            1 => Some(BlurStrategyKind::Compute),
            2 => Some(BlurStrategyKind::ComputeTranspose),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            BlurStrategyKind::SeparablePixel => 0,
            BlurStrategyKind::Compute => 1,
            BlurStrategyKind::ComputeTranspose => 2,
        }
    }
}

impl fmt::Display for BlurStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlurStrategyKind::SeparablePixel => write!(f, "separable pixel shader"),
            BlurStrategyKind::Compute => write!(f, "compute"),
            BlurStrategyKind::ComputeTranspose => write!(f, "compute transpose"),
        }
    }
}

/// Per-frame inputs of a blur
pub struct BlurContext<'a> {
    pub cmd: &'a mut dyn CommandList,
    pub shaders: &'a mut ShaderManager,
    /// Bright-pass output to blur
    pub source: TextureId,
    pub settings: &'a BloomSettings,
}

/// A blur implementation owned by the bloom pass
pub trait BlurStrategy: Send + Sync {
    fn kind(&self) -> BlurStrategyKind;

    /// React to a settings change
    ///
    /// Returns true if shaders were reloaded. Calling it again with the same
    /// settings must return false.
    fn update_settings(&mut self, _shaders: &mut ShaderManager, _settings: &BloomSettings) -> Result<bool> {
        Ok(false)
    }

    /// Record the blur, returns the texture holding the result
    fn execute(&self, ctx: &mut BlurContext<'_>) -> Result<TextureId>;

    /// Texture holding the blur result, known before any execution
    fn output_texture(&self) -> TextureId;
}

/// Shader lookup that turns a stale id into an error
pub(crate) fn pass_shader(shaders: &mut ShaderManager, id: ShaderId) -> Result<&mut Shader> {
    shaders
        .shader_mut(id)
        .ok_or_else(|| Error::InvalidResource(format!("Shader {:?} is not alive", id)))
}

/// Set PASS_COUNT on a shader and reload it if the value changed
pub(crate) fn patch_pass_count(shaders: &mut ShaderManager, id: ShaderId, pass_count: u32) -> Result<bool> {
    let mut desc = pass_shader(shaders, id)?.desc().clone();
    if !desc.set_macro("PASS_COUNT", pass_count) {
        return Ok(false);
    }
    shaders.reload_shader(id, Some(desc))?;
    Ok(true)
}
