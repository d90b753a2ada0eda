/// Shader object
///
/// Owns the compiled stage blobs, the device shader modules, the reflected
/// bind tables and the CPU-side mirrors of every constant buffer variable.

use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;
use std::time::SystemTime;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, CommandList, GraphicsDevice, SamplerId,
    ShaderModule, ShaderModuleDesc, ShaderStage, TextureId,
};
use crate::shader::includes::collect_includes;
use crate::shader::shader_cache::{last_write_time, CompiledStageBlob, ShaderCache};
use crate::shader::shader_reflection::{
    check_signatures, reflect_stage, ConstantBufferLayout, SamplerBinding,
    StageReflection, TextureBinding, TextureBindingKind,
};
use crate::shader::{ShaderCompiler, ShaderDesc};
use crate::{engine_debug, engine_error, engine_warn};

/// Lifecycle of a shader object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderState {
    Uninitialized,
    Linked,
    Released,
}

/// Everything a shader needs to compile its stages and create GPU objects
pub struct ShaderBuildContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub cache: &'a ShaderCache,
    pub compiler: &'a dyn ShaderCompiler,
    pub shader_root: &'a Path,
    pub entry_point: &'a str,
}

/// Per-build outcome counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileReport {
    /// Stages compiled from source
    pub compiled: u32,
    /// Stages loaded from the cache
    pub cached: u32,
    /// Stages that failed to compile or reflect (left unbound)
    pub failed: u32,
}

/// GPU constant buffer of one stage and its dirty flag
pub struct ConstantBufferBinding {
    pub layout: ConstantBufferLayout,
    buffer: Arc<dyn Buffer>,
    dirty: bool,
}

impl ConstantBufferBinding {
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// CPU mirror of one constant buffer variable
///
/// Two mirrors are equal only if they are the same instance: name, size and
/// storage address must all match. Mirrors are never cloned.
#[derive(Debug)]
pub struct CpuConstant {
    name: String,
    data: Box<[u8]>,
    buffer_index: usize,
    offset: u32,
}

impl CpuConstant {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Index into `Shader::constant_buffers()`
    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    /// Byte offset inside the constant buffer
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl PartialEq for CpuConstant {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data.len() == other.data.len()
            && ptr::eq(self.data.as_ptr(), other.data.as_ptr())
    }
}

/// Source file state captured when a stage was last built
#[derive(Debug, Clone)]
struct StageSource {
    source_path: PathBuf,
    cache_path: Option<PathBuf>,
    timestamp: Option<SystemTime>,
    includes: Vec<(PathBuf, Option<SystemTime>)>,
}

impl StageSource {
    fn capture(source_path: PathBuf) -> Self {
        let timestamp = last_write_time(&source_path);
        let includes = collect_includes(&source_path)
            .into_iter()
            .map(|path| {
                let time = last_write_time(&path);
                (path, time)
            })
            .collect();
        Self {
            source_path,
            cache_path: None,
            timestamp,
            includes,
        }
    }

    fn is_updated(&self) -> bool {
        last_write_time(&self.source_path) != self.timestamp
            || self
                .includes
                .iter()
                .any(|(path, time)| last_write_time(path) != *time)
    }
}

/// Compiled multi-stage shader with reflection-driven bindings
pub struct Shader {
    desc: ShaderDesc,
    state: ShaderState,
    modules: [Option<Arc<dyn ShaderModule>>; ShaderStage::COUNT],
    blobs: [Option<CompiledStageBlob>; ShaderStage::COUNT],
    reflections: [Option<StageReflection>; ShaderStage::COUNT],
    sources: [Option<StageSource>; ShaderStage::COUNT],
    constant_buffers: Vec<ConstantBufferBinding>,
    cpu_constants: Vec<CpuConstant>,
    constant_lookup: FxHashMap<String, Vec<usize>>,
    textures: Vec<TextureBinding>,
    texture_lookup: FxHashMap<String, usize>,
    samplers: Vec<SamplerBinding>,
    sampler_lookup: FxHashMap<String, usize>,
    report: CompileReport,
}

impl Shader {
    /// Compile or load every non-empty stage of `desc` and build the bind tables
    ///
    /// A stage that fails to compile or reflect is logged and left unbound,
    /// the shader is still returned. Only device failures are errors.
    pub fn new(desc: ShaderDesc, ctx: &mut ShaderBuildContext) -> Result<Self> {
        let mut shader = Self {
            desc,
            state: ShaderState::Uninitialized,
            modules: Default::default(),
            blobs: Default::default(),
            reflections: Default::default(),
            sources: Default::default(),
            constant_buffers: Vec::new(),
            cpu_constants: Vec::new(),
            constant_lookup: FxHashMap::default(),
            textures: Vec::new(),
            texture_lookup: FxHashMap::default(),
            samplers: Vec::new(),
            sampler_lookup: FxHashMap::default(),
            report: CompileReport::default(),
        };
        shader.build(ctx)?;
        Ok(shader)
    }

    /// Rebuild from the current descriptor
    ///
    /// Stages whose cache entry is still valid are loaded rather than
    /// recompiled. Constant values survive when a variable keeps its name and
    /// size.
    pub fn reload(&mut self, ctx: &mut ShaderBuildContext) -> Result<()> {
        engine_debug!("nova3d::Shader", "Reloading shader '{}'", self.desc.name);
        self.build(ctx)
    }

    fn build(&mut self, ctx: &mut ShaderBuildContext) -> Result<()> {
        let mut modules: [Option<Arc<dyn ShaderModule>>; ShaderStage::COUNT] = Default::default();
        let mut blobs: [Option<CompiledStageBlob>; ShaderStage::COUNT] = Default::default();
        let mut reflections: [Option<StageReflection>; ShaderStage::COUNT] = Default::default();
        let mut sources: [Option<StageSource>; ShaderStage::COUNT] = Default::default();
        let mut report = CompileReport::default();

        for (stage, stage_desc) in self.desc.active_stages() {
            let mut source = StageSource::capture(ctx.shader_root.join(&stage_desc.file_name));

            let compiled = match ctx.cache.load_or_compile(
                ctx.compiler,
                &source.source_path,
                &stage_desc.file_name,
                stage,
                &stage_desc.macros,
            ) {
                Ok(compiled) => compiled,
                Err(e) => {
                    engine_error!(
                        "nova3d::Shader",
                        "Shader '{}' {:?} stage failed: {}",
                        self.desc.name, stage, e
                    );
                    report.failed += 1;
                    sources[stage.index()] = Some(source);
                    continue;
                }
            };
            source.cache_path = Some(compiled.cache_path.clone());
            sources[stage.index()] = Some(source);

            let reflection = match reflect_stage(stage, compiled.blob.words()) {
                Ok(reflection) => reflection,
                Err(e) => {
                    engine_error!(
                        "nova3d::Shader",
                        "Shader '{}' {:?} stage: {}",
                        self.desc.name, stage, e
                    );
                    report.failed += 1;
                    continue;
                }
            };

            modules[stage.index()] = Some(ctx.device.create_shader_module(ShaderModuleDesc {
                code: compiled.blob.words(),
                stage,
                entry_point: ctx.entry_point.to_string(),
            })?);

            if compiled.from_cache {
                report.cached += 1;
            } else {
                report.compiled += 1;
            }
            blobs[stage.index()] = Some(compiled.blob);
            reflections[stage.index()] = Some(reflection);
        }

        let present: Vec<&StageReflection> = reflections.iter().flatten().collect();
        for mismatch in check_signatures(&present) {
            engine_warn!("nova3d::Shader", "Shader '{}': {}", self.desc.name, mismatch);
        }

        let previous_constants = std::mem::take(&mut self.cpu_constants);
        self.modules = modules;
        self.blobs = blobs;
        self.reflections = reflections;
        self.sources = sources;
        self.report = report;
        self.build_bind_tables(ctx.device)?;
        self.restore_constants(&previous_constants);
        self.state = ShaderState::Linked;
        Ok(())
    }

    fn build_bind_tables(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.constant_buffers.clear();
        self.cpu_constants.clear();
        self.constant_lookup.clear();
        self.textures.clear();
        self.texture_lookup.clear();
        self.samplers.clear();
        self.sampler_lookup.clear();

        for reflection in self.reflections.iter().flatten() {
            for layout in &reflection.constant_buffers {
                let buffer_index = self.constant_buffers.len();
                for variable in &layout.variables {
                    if variable.size == 0 {
                        continue;
                    }
                    self.constant_lookup
                        .entry(variable.name.clone())
                        .or_default()
                        .push(self.cpu_constants.len());
                    self.cpu_constants.push(CpuConstant {
                        name: variable.name.clone(),
                        data: vec![0u8; variable.size as usize].into_boxed_slice(),
                        buffer_index,
                        offset: variable.offset,
                    });
                }
                let buffer = device.create_buffer(BufferDesc {
                    size: layout.size as u64,
                    usage: BufferUsage::Uniform,
                })?;
                self.constant_buffers.push(ConstantBufferBinding {
                    layout: layout.clone(),
                    buffer,
                    dirty: true,
                });
            }

            for texture in &reflection.textures {
                self.texture_lookup.insert(texture.name.clone(), self.textures.len());
                self.textures.push(texture.clone());
            }
            for sampler in &reflection.samplers {
                self.sampler_lookup.insert(sampler.name.clone(), self.samplers.len());
                self.samplers.push(sampler.clone());
            }
        }
        Ok(())
    }

    fn restore_constants(&mut self, previous: &[CpuConstant]) {
        for constant in &mut self.cpu_constants {
            if let Some(old) = previous
                .iter()
                .find(|old| old.name == constant.name && old.data.len() == constant.data.len())
            {
                constant.data.copy_from_slice(&old.data);
            }
        }
    }

    // ===== STATE =====

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &ShaderDesc {
        &self.desc
    }

    /// Mutable descriptor, used to patch macros before `reload`
    pub fn desc_mut(&mut self) -> &mut ShaderDesc {
        &mut self.desc
    }

    pub fn state(&self) -> ShaderState {
        self.state
    }

    pub fn compile_report(&self) -> CompileReport {
        self.report
    }

    pub fn module(&self, stage: ShaderStage) -> Option<&Arc<dyn ShaderModule>> {
        self.modules[stage.index()].as_ref()
    }

    pub fn stage_blob(&self, stage: ShaderStage) -> Option<&CompiledStageBlob> {
        self.blobs[stage.index()].as_ref()
    }

    pub fn reflection(&self, stage: ShaderStage) -> Option<&StageReflection> {
        self.reflections[stage.index()].as_ref()
    }

    /// Cache file last used for a stage
    pub fn cache_path(&self, stage: ShaderStage) -> Option<&Path> {
        self.sources[stage.index()]
            .as_ref()
            .and_then(|s| s.cache_path.as_deref())
    }

    /// True if any stage source or include changed since the last build
    pub fn has_source_file_been_updated(&self) -> bool {
        self.sources.iter().flatten().any(StageSource::is_updated)
    }

    /// Drop every GPU object and compiled blob
    pub fn release(&mut self) {
        self.modules = Default::default();
        self.blobs = Default::default();
        self.reflections = Default::default();
        self.constant_buffers.clear();
        self.cpu_constants.clear();
        self.constant_lookup.clear();
        self.textures.clear();
        self.texture_lookup.clear();
        self.samplers.clear();
        self.sampler_lookup.clear();
        self.state = ShaderState::Released;
    }

    // ===== BINDING =====

    /// Bind every stage module (absent stages are unbound) and mark all
    /// constant buffers dirty so the next `update_constants` rebinds them
    pub fn bind(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        for stage in ShaderStage::ALL {
            cmd.bind_shader_module(stage, self.modules[stage.index()].as_ref())?;
        }
        self.mark_all_dirty();
        Ok(())
    }

    pub fn mark_all_dirty(&mut self) {
        for binding in &mut self.constant_buffers {
            binding.dirty = true;
        }
    }

    /// Flush dirty constant buffers from their CPU mirrors and bind them
    pub fn update_constants(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        for (index, binding) in self.constant_buffers.iter_mut().enumerate() {
            if !binding.dirty {
                continue;
            }
            let mut bytes = vec![0u8; binding.layout.size as usize];
            for constant in self.cpu_constants.iter().filter(|c| c.buffer_index == index) {
                let start = constant.offset as usize;
                let end = start + constant.data.len();
                if end <= bytes.len() {
                    bytes[start..end].copy_from_slice(&constant.data);
                }
            }
            binding.buffer.update(0, &bytes)?;
            cmd.bind_constant_buffer(binding.layout.stage, binding.layout.slot, &binding.buffer)?;
            binding.dirty = false;
        }
        Ok(())
    }

    // ===== CONSTANTS =====

    pub fn constant_buffers(&self) -> &[ConstantBufferBinding] {
        &self.constant_buffers
    }

    pub fn cpu_constants(&self) -> &[CpuConstant] {
        &self.cpu_constants
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.constant_lookup.contains_key(name)
    }

    /// First mirror with this name
    pub fn constant(&self, name: &str) -> Result<&CpuConstant> {
        self.constant_lookup
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| &self.cpu_constants[i])
            .ok_or_else(|| Error::LookupMiss(format!("constant '{}' in '{}'", name, self.desc.name)))
    }

    /// Write a value into every mirror named `name`
    ///
    /// Returns false when no mirror has that name or the sizes differ, in
    /// which case nothing is written for that mirror.
    pub fn set_constant<T: bytemuck::Pod>(&mut self, name: &str, value: &T) -> bool {
        self.set_constant_bytes(name, bytemuck::bytes_of(value))
    }

    /// Byte-level variant of `set_constant`
    pub fn set_constant_bytes(&mut self, name: &str, data: &[u8]) -> bool {
        let Some(indices) = self.constant_lookup.get(name) else {
            return false;
        };
        let mut written = false;
        for &i in indices {
            let constant = &mut self.cpu_constants[i];
            if constant.data.len() != data.len() {
                engine_warn!(
                    "nova3d::Shader",
                    "Shader '{}': constant '{}' is {} bytes, got {}",
                    self.desc.name, name, constant.data.len(), data.len()
                );
                continue;
            }
            constant.data.copy_from_slice(data);
            self.constant_buffers[constant.buffer_index].dirty = true;
            written = true;
        }
        written
    }

    // ===== TEXTURES AND SAMPLERS =====

    pub fn has_texture_binding(&self, name: &str) -> bool {
        self.texture_lookup.contains_key(name)
    }

    pub fn has_sampler_binding(&self, name: &str) -> bool {
        self.sampler_lookup.contains_key(name)
    }

    /// Texture slot by name (last reflected stage wins on name collisions)
    pub fn texture_binding(&self, name: &str) -> Result<&TextureBinding> {
        self.texture_lookup
            .get(name)
            .map(|&i| &self.textures[i])
            .ok_or_else(|| Error::LookupMiss(format!("texture '{}' in '{}'", name, self.desc.name)))
    }

    /// Sampler slot by name (last reflected stage wins on name collisions)
    pub fn sampler_binding(&self, name: &str) -> Result<&SamplerBinding> {
        self.sampler_lookup
            .get(name)
            .map(|&i| &self.samplers[i])
            .ok_or_else(|| Error::LookupMiss(format!("sampler '{}' in '{}'", name, self.desc.name)))
    }

    pub fn texture_bindings(&self) -> &[TextureBinding] {
        &self.textures
    }

    pub fn sampler_bindings(&self) -> &[SamplerBinding] {
        &self.samplers
    }

    /// Bind a texture by name, as sampled or storage image depending on how
    /// the shader declares it
    ///
    /// Returns Ok(false) without recording anything if the shader does not use
    /// that name.
    pub fn set_texture(&self, cmd: &mut dyn CommandList, name: &str, texture: TextureId) -> Result<bool> {
        let Some(&i) = self.texture_lookup.get(name) else {
            return Ok(false);
        };
        let binding = &self.textures[i];
        match binding.kind {
            TextureBindingKind::Sampled => cmd.bind_texture(binding.stage, binding.slot, texture)?,
            TextureBindingKind::Storage => cmd.bind_storage_texture(binding.stage, binding.slot, texture)?,
        }
        Ok(true)
    }

    /// Bind a sampler by name, Ok(false) if the shader does not use that name
    pub fn set_sampler(&self, cmd: &mut dyn CommandList, name: &str, sampler: SamplerId) -> Result<bool> {
        let Some(&i) = self.sampler_lookup.get(name) else {
            return Ok(false);
        };
        let binding = &self.samplers[i];
        cmd.bind_sampler(binding.stage, binding.slot, sampler)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
