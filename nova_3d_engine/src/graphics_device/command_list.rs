/// CommandList trait - for recording shader binds, draws and dispatches

use std::sync::Arc;
use glam::UVec3;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, DepthStencilState, RasterizationState, RenderTargetId,
    SamplerId, ShaderModule, ShaderStage, TextureId,
};

/// Command list for recording rendering commands
///
/// Bindings are addressed by (stage, slot) as discovered by shader reflection.
pub trait CommandList: Send + Sync {
    /// Open a named debug region (shows up in GPU captures)
    fn begin_event(&mut self, name: &str) -> Result<()>;

    /// Close the innermost debug region
    fn end_event(&mut self) -> Result<()>;

    /// Bind a shader module to a stage, `None` unbinds the stage
    fn bind_shader_module(
        &mut self,
        stage: ShaderStage,
        module: Option<&Arc<dyn ShaderModule>>,
    ) -> Result<()>;

    /// Bind a constant buffer
    ///
    /// # Arguments
    ///
    /// * `stage` - Stage reading the buffer
    /// * `slot` - Reflected binding slot
    /// * `buffer` - Buffer to bind
    fn bind_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        buffer: &Arc<dyn Buffer>,
    ) -> Result<()>;

    /// Bind a texture for sampling
    fn bind_texture(&mut self, stage: ShaderStage, slot: u32, texture: TextureId) -> Result<()>;

    /// Bind a texture as a read-write storage image
    fn bind_storage_texture(&mut self, stage: ShaderStage, slot: u32, texture: TextureId) -> Result<()>;

    /// Bind a sampler
    fn bind_sampler(&mut self, stage: ShaderStage, slot: u32, sampler: SamplerId) -> Result<()>;

    /// Bind color render targets (multiple render targets when more than one)
    fn bind_render_targets(&mut self, targets: &[RenderTargetId]) -> Result<()>;

    /// Detach the depth attachment
    fn unbind_depth_target(&mut self) -> Result<()>;

    /// Set depth test state
    fn set_depth_stencil_state(&mut self, state: DepthStencilState) -> Result<()>;

    /// Set rasterizer state
    fn set_rasterization_state(&mut self, state: RasterizationState) -> Result<()>;

    /// Draw non-indexed primitives
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - First vertex index
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Dispatch compute work
    ///
    /// # Arguments
    ///
    /// * `group_count` - Number of thread groups in x, y and z
    fn dispatch(&mut self, group_count: UVec3) -> Result<()>;
}
