/// Mock graphics device for unit tests (no GPU required)
///
/// Every resource is kept in plain Rust containers and every recorded command
/// is stored so tests can assert on pass sequencing and binding slots.

use std::sync::{Arc, Mutex};
use glam::UVec3;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, DepthStencilState, GraphicsDevice,
    RasterizationState, RenderTargetDesc, RenderTargetId, SamplerDesc, SamplerId,
    ShaderModule, ShaderModuleDesc, ShaderStage, TextureDesc, TextureId, TextureInfo,
};

// ============================================================================
// MockBuffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
    pub contents: Mutex<Vec<u8>>,
    pub update_count: Mutex<u32>,
}

impl MockBuffer {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            contents: Mutex::new(vec![0; size as usize]),
            update_count: Mutex::new(0),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.contents.lock().unwrap().clone()
    }

    pub fn updates(&self) -> u32 {
        *self.update_count.lock().unwrap()
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset + data.len() as u64;
        if end > self.size {
            return Err(Error::BackendError(format!(
                "Buffer update out of range: {} > {}", end, self.size
            )));
        }
        self.contents.lock().unwrap()[offset as usize..end as usize].copy_from_slice(data);
        *self.update_count.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// MockShaderModule
// ============================================================================

#[derive(Debug)]
pub struct MockShaderModule {
    pub stage: ShaderStage,
    pub word_count: usize,
    pub entry_point: String,
}

impl ShaderModule for MockShaderModule {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

// ============================================================================
// MockCommandList
// ============================================================================

/// One recorded command
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginEvent(String),
    EndEvent,
    BindShaderModule { stage: ShaderStage, bound: bool },
    BindConstantBuffer { stage: ShaderStage, slot: u32, size: u64 },
    BindTexture { stage: ShaderStage, slot: u32, texture: TextureId },
    BindStorageTexture { stage: ShaderStage, slot: u32, texture: TextureId },
    BindSampler { stage: ShaderStage, slot: u32, sampler: SamplerId },
    BindRenderTargets(Vec<RenderTargetId>),
    UnbindDepthTarget,
    SetDepthStencilState(DepthStencilState),
    SetRasterizationState(RasterizationState),
    Draw { vertex_count: u32, first_vertex: u32 },
    Dispatch(UVec3),
}

#[derive(Debug, Default)]
pub struct MockCommandList {
    pub commands: Vec<RecordedCommand>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::Draw { .. }))
            .count()
    }

    pub fn dispatches(&self) -> Vec<UVec3> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::Dispatch(groups) => Some(*groups),
                _ => None,
            })
            .collect()
    }

    /// Commands recorded between `BeginEvent(name)` and its matching `EndEvent`
    pub fn event_commands(&self, name: &str) -> Vec<RecordedCommand> {
        let mut inside = false;
        let mut depth = 0usize;
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                RecordedCommand::BeginEvent(event) if !inside && event == name => {
                    inside = true;
                    depth = 0;
                    continue;
                }
                RecordedCommand::BeginEvent(_) if inside => depth += 1,
                RecordedCommand::EndEvent if inside => {
                    if depth == 0 {
                        inside = false;
                        continue;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            if inside {
                out.push(command.clone());
            }
        }
        out
    }
}

impl CommandList for MockCommandList {
    fn begin_event(&mut self, name: &str) -> Result<()> {
        self.commands.push(RecordedCommand::BeginEvent(name.to_string()));
        Ok(())
    }

    fn end_event(&mut self) -> Result<()> {
        self.commands.push(RecordedCommand::EndEvent);
        Ok(())
    }

    fn bind_shader_module(
        &mut self,
        stage: ShaderStage,
        module: Option<&Arc<dyn ShaderModule>>,
    ) -> Result<()> {
        self.commands.push(RecordedCommand::BindShaderModule { stage, bound: module.is_some() });
        Ok(())
    }

    fn bind_constant_buffer(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        buffer: &Arc<dyn Buffer>,
    ) -> Result<()> {
        self.commands.push(RecordedCommand::BindConstantBuffer { stage, slot, size: buffer.size() });
        Ok(())
    }

    fn bind_texture(&mut self, stage: ShaderStage, slot: u32, texture: TextureId) -> Result<()> {
        self.commands.push(RecordedCommand::BindTexture { stage, slot, texture });
        Ok(())
    }

    fn bind_storage_texture(&mut self, stage: ShaderStage, slot: u32, texture: TextureId) -> Result<()> {
        self.commands.push(RecordedCommand::BindStorageTexture { stage, slot, texture });
        Ok(())
    }

    fn bind_sampler(&mut self, stage: ShaderStage, slot: u32, sampler: SamplerId) -> Result<()> {
        self.commands.push(RecordedCommand::BindSampler { stage, slot, sampler });
        Ok(())
    }

    fn bind_render_targets(&mut self, targets: &[RenderTargetId]) -> Result<()> {
        self.commands.push(RecordedCommand::BindRenderTargets(targets.to_vec()));
        Ok(())
    }

    fn unbind_depth_target(&mut self) -> Result<()> {
        self.commands.push(RecordedCommand::UnbindDepthTarget);
        Ok(())
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) -> Result<()> {
        self.commands.push(RecordedCommand::SetDepthStencilState(state));
        Ok(())
    }

    fn set_rasterization_state(&mut self, state: RasterizationState) -> Result<()> {
        self.commands.push(RecordedCommand::SetRasterizationState(state));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.commands.push(RecordedCommand::Draw { vertex_count, first_vertex });
        Ok(())
    }

    fn dispatch(&mut self, group_count: UVec3) -> Result<()> {
        self.commands.push(RecordedCommand::Dispatch(group_count));
        Ok(())
    }
}

// ============================================================================
// MockGraphicsDevice
// ============================================================================

#[derive(Default)]
pub struct MockGraphicsDevice {
    pub textures: SlotMap<TextureId, TextureInfo>,
    pub render_targets: SlotMap<RenderTargetId, TextureId>,
    pub samplers: SlotMap<SamplerId, SamplerDesc>,
    pub buffers: Vec<Arc<MockBuffer>>,
    pub shader_modules_created: usize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource("Texture with zero extent".to_string()));
        }
        Ok(self.textures.insert(TextureInfo::from(&desc)))
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetId> {
        let texture = self.create_texture(desc.texture_desc())?;
        Ok(self.render_targets.insert(texture))
    }

    fn render_target_texture(&self, target: RenderTargetId) -> Option<TextureId> {
        self.render_targets.get(target).copied()
    }

    fn texture_info(&self, texture: TextureId) -> Option<TextureInfo> {
        self.textures.get(texture).copied()
    }

    fn create_sampler(&mut self, desc: SamplerDesc) -> Result<SamplerId> {
        Ok(self.samplers.insert(desc))
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        let buffer = Arc::new(MockBuffer::new(desc.size));
        self.buffers.push(buffer.clone());
        Ok(buffer as Arc<dyn Buffer>)
    }

    fn create_shader_module(&mut self, desc: ShaderModuleDesc) -> Result<Arc<dyn ShaderModule>> {
        self.shader_modules_created += 1;
        Ok(Arc::new(MockShaderModule {
            stage: desc.stage,
            word_count: desc.code.len(),
            entry_point: desc.entry_point,
        }))
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new()))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
