/// GraphicsDevice trait - factory for GPU resources used by shaders and render passes

use std::sync::Arc;
use slotmap::new_key_type;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, RenderTargetDesc, SamplerDesc,
    ShaderModule, ShaderModuleDesc, TextureDesc, TextureInfo,
};

new_key_type! {
    /// Handle to a device-owned texture
    pub struct TextureId;
    /// Handle to a device-owned render target (color attachment backed by a texture)
    pub struct RenderTargetId;
    /// Handle to a device-owned sampler
    pub struct SamplerId;
}

/// Graphics device factory
///
/// Textures, render targets and samplers are owned by the device for the whole
/// session and addressed by id. Constant buffers and shader modules are handed
/// out as `Arc` handles and released when their last owner drops them.
pub trait GraphicsDevice: Send + Sync {
    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture size, format and usage
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId>;

    /// Create a render target together with its backing texture
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetId>;

    /// Texture written by a render target
    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId>;

    /// Properties of a texture, `None` if the id is unknown
    fn texture_info(&self, texture: TextureId) -> Option<TextureInfo>;

    /// Create a sampler
    fn create_sampler(&mut self, desc: SamplerDesc) -> Result<SamplerId>;

    /// Create a buffer (constant buffers are created with `BufferUsage::Uniform`)
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a shader module from compiled SPIR-V
    ///
    /// # Arguments
    ///
    /// * `desc` - SPIR-V words, pipeline stage and entry point
    fn create_shader_module(&mut self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>>;

    /// Create a command list for recording pass work
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;
}
