/// Shader factory for render passes.
///
/// Creates shaders from descriptors, owns them for the engine session and
/// drives reloads (macro patches and hot-reload polling).

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::GraphicsDevice;
use crate::shader::{
    GlslCompiler, Shader, ShaderBuildContext, ShaderCache, ShaderCompiler,
    ShaderConfig, ShaderDesc,
};
use crate::{engine_bail, engine_info};

new_key_type! {
    /// Key of a shader owned by the ShaderManager
    pub struct ShaderId;
}

/// Counters accumulated over every build and reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShaderManagerStats {
    pub compiled_from_source: u32,
    pub loaded_from_cache: u32,
    pub failed_stages: u32,
    pub reloads: u32,
}

pub struct ShaderManager {
    graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
    compiler: Box<dyn ShaderCompiler>,
    cache: ShaderCache,
    config: ShaderConfig,
    shaders: SlotMap<ShaderId, Shader>,
    names: FxHashMap<String, ShaderId>,
    stats: ShaderManagerStats,
}

fn lock_device(device: &Mutex<dyn GraphicsDevice>) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))
}

impl ShaderManager {
    /// Create a manager with an explicit compiler
    pub fn new(
        graphics_device: Arc<Mutex<dyn GraphicsDevice>>,
        compiler: Box<dyn ShaderCompiler>,
        config: ShaderConfig,
    ) -> Self {
        Self {
            graphics_device,
            compiler,
            cache: ShaderCache::new(config.cache_directory.clone()),
            config,
            shaders: SlotMap::with_key(),
            names: FxHashMap::default(),
            stats: ShaderManagerStats::default(),
        }
    }

    /// Create a manager compiling GLSL through naga, using the configured entry point
    pub fn with_glsl(graphics_device: Arc<Mutex<dyn GraphicsDevice>>, config: ShaderConfig) -> Self {
        let compiler = GlslCompiler::with_entry_point(config.entry_point.clone());
        Self::new(graphics_device, Box::new(compiler), config)
    }

    pub fn graphics_device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.graphics_device
    }

    pub fn config(&self) -> &ShaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &ShaderCache {
        &self.cache
    }

    pub fn stats(&self) -> ShaderManagerStats {
        self.stats
    }

    fn record(&mut self, shader: &Shader) {
        let report = shader.compile_report();
        self.stats.compiled_from_source += report.compiled;
        self.stats.loaded_from_cache += report.cached;
        self.stats.failed_stages += report.failed;
    }

    /// Build a shader from a descriptor
    ///
    /// # Errors
    ///
    /// Returns an error if a shader with the same name already exists or the
    /// device fails to create a module or buffer. Compile failures are not
    /// errors, see `Shader::new`.
    pub fn create_shader(&mut self, desc: ShaderDesc) -> Result<ShaderId> {
        if self.names.contains_key(&desc.name) {
            engine_bail!("nova3d::ShaderManager", "Shader '{}' already exists", desc.name);
        }

        let mut device = lock_device(&self.graphics_device)?;
        let mut ctx = ShaderBuildContext {
            device: &mut *device,
            cache: &self.cache,
            compiler: self.compiler.as_ref(),
            shader_root: &self.config.shader_root,
            entry_point: &self.config.entry_point,
        };
        let shader = Shader::new(desc, &mut ctx)?;
        drop(device);

        self.record(&shader);
        let name = shader.name().to_string();
        let id = self.shaders.insert(shader);
        self.names.insert(name, id);
        Ok(id)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn shader_mut(&mut self, id: ShaderId) -> Option<&mut Shader> {
        self.shaders.get_mut(id)
    }

    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.names.get(name).copied()
    }

    /// Rebuild a shader, optionally replacing its descriptor first
    ///
    /// Replacing the descriptor is how passes patch macros after construction.
    /// The new descriptor is kept only if the rebuild succeeds, and it may not
    /// take the name of another shader.
    pub fn reload_shader(&mut self, id: ShaderId, desc: Option<ShaderDesc>) -> Result<()> {
        let Some(current_name) = self.shaders.get(id).map(|s| s.name().to_string()) else {
            engine_bail!("nova3d::ShaderManager", "Unknown shader id {:?}", id);
        };
        if let Some(desc) = &desc {
            if desc.name != current_name && self.names.contains_key(&desc.name) {
                engine_bail!(
                    "nova3d::ShaderManager",
                    "Cannot rename '{}': shader '{}' already exists",
                    current_name,
                    desc.name
                );
            }
        }

        let mut device = lock_device(&self.graphics_device)?;
        let Some(shader) = self.shaders.get_mut(id) else {
            engine_bail!("nova3d::ShaderManager", "Unknown shader id {:?}", id);
        };
        let previous = desc.map(|desc| std::mem::replace(shader.desc_mut(), desc));
        let mut ctx = ShaderBuildContext {
            device: &mut *device,
            cache: &self.cache,
            compiler: self.compiler.as_ref(),
            shader_root: &self.config.shader_root,
            entry_point: &self.config.entry_point,
        };
        let result = shader.reload(&mut ctx);
        drop(device);

        if let Err(e) = result {
            if let Some(previous) = previous {
                *shader.desc_mut() = previous;
            }
            return Err(e);
        }
        if shader.name() != current_name {
            self.names.remove(&current_name);
            self.names.insert(shader.name().to_string(), id);
        }

        let report = shader.compile_report();
        self.stats.compiled_from_source += report.compiled;
        self.stats.loaded_from_cache += report.cached;
        self.stats.failed_stages += report.failed;
        self.stats.reloads += 1;
        Ok(())
    }

    /// Hot-reload poll: reload every shader whose sources changed
    ///
    /// Returns the reloaded ids.
    pub fn reload_updated_shaders(&mut self) -> Result<Vec<ShaderId>> {
        let updated: Vec<ShaderId> = self
            .shaders
            .iter()
            .filter(|(_, shader)| shader.has_source_file_been_updated())
            .map(|(id, _)| id)
            .collect();

        for &id in &updated {
            self.reload_shader(id, None)?;
        }
        if !updated.is_empty() {
            engine_info!("nova3d::ShaderManager", "Hot-reloaded {} shader(s)", updated.len());
        }
        Ok(updated)
    }

    /// Release and remove a shader
    pub fn destroy_shader(&mut self, id: ShaderId) -> bool {
        match self.shaders.remove(id) {
            Some(mut shader) => {
                shader.release();
                self.names.remove(shader.name());
                true
            }
            None => false,
        }
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }
}

#[cfg(test)]
#[path = "shader_manager_tests.rs"]
mod tests;
