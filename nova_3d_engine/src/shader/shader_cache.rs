/// Shader cache store
///
/// Compiled SPIR-V blobs are persisted under the cache directory, one file per
/// (stage source file, macro hash). A cached blob is reused only while it is
/// at least as new as its source file and every file the source includes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use xxhash_rust::xxh3::Xxh3;
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStage;
use crate::shader::includes::collect_includes;
use crate::shader::{ShaderCompiler, ShaderMacro};
use crate::{engine_debug, engine_trace, engine_warn};

const SPIRV_MAGIC: u32 = 0x0723_0203;
const CACHE_EXTENSION: &str = "spv";

/// Compiled bytecode of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStageBlob {
    words: Vec<u32>,
}

impl CompiledStageBlob {
    pub fn new(words: Vec<u32>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Little-endian byte image, as written to disk
    pub fn to_bytes(&self) -> Vec<u8> {
        let little_endian: Vec<u32> = self.words.iter().map(|w| w.to_le()).collect();
        bytemuck::cast_slice::<u32, u8>(little_endian.as_slice()).to_vec()
    }

    /// Parse a byte image, `None` if it is not a SPIR-V module
    ///
    /// `bytes` need not be 4-byte aligned.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            return None;
        }
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le(bytemuck::pod_read_unaligned(c)))
            .collect();
        (words[0] == SPIRV_MAGIC).then_some(Self { words })
    }
}

/// Result of compiling or loading one stage
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub blob: CompiledStageBlob,
    pub source_path: PathBuf,
    pub cache_path: PathBuf,
    /// Source modification time observed before compiling
    pub source_timestamp: Option<SystemTime>,
    pub from_cache: bool,
}

/// Order-sensitive hash of a macro list, 0 for an empty list
pub fn macro_hash(macros: &[ShaderMacro]) -> u64 {
    if macros.is_empty() {
        return 0;
    }
    let mut hasher = Xxh3::new();
    for m in macros {
        hasher.update(m.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(m.value.as_bytes());
        hasher.update(&[0]);
    }
    hasher.digest()
}

/// Modification time of a file, `None` on any filesystem error
pub fn last_write_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

pub struct ShaderCache {
    directory: PathBuf,
}

impl ShaderCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Cache file for a stage source file and macro list
    ///
    /// `post/Blur_cs.glsl` with macros maps to `post_Blur_cs_<hash>.spv`,
    /// without macros to `post_Blur_cs.spv`.
    pub fn cache_path(&self, file_name: &str, macros: &[ShaderMacro]) -> PathBuf {
        let without_extension = match Path::new(file_name).extension() {
            Some(ext) => &file_name[..file_name.len() - ext.len() - 1],
            None => file_name,
        };
        let flat: String = without_extension
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        let hash = macro_hash(macros);
        let name = if hash == 0 {
            format!("{}.{}", flat, CACHE_EXTENSION)
        } else {
            format!("{}_{:016x}.{}", flat, hash, CACHE_EXTENSION)
        };
        self.directory.join(name)
    }

    /// True iff the cache file exists and is not older than the source or any
    /// of its includes
    pub fn is_cache_valid(&self, source_path: &Path, cache_path: &Path) -> bool {
        let Some(cache_time) = last_write_time(cache_path) else {
            return false;
        };
        let Some(source_time) = last_write_time(source_path) else {
            return false;
        };
        if cache_time < source_time {
            return false;
        }
        collect_includes(source_path)
            .iter()
            .all(|include| last_write_time(include).is_some_and(|t| t <= cache_time))
    }

    /// Read a cached blob, `None` when missing or corrupt
    pub fn load(&self, cache_path: &Path) -> Option<CompiledStageBlob> {
        let bytes = fs::read(cache_path).ok()?;
        let blob = CompiledStageBlob::from_bytes(&bytes);
        if blob.is_none() {
            engine_warn!("nova3d::ShaderCache", "Ignoring corrupt cache file {}", cache_path.display());
        }
        blob
    }

    /// Write or overwrite a cache entry
    pub fn store(&self, cache_path: &Path, blob: &CompiledStageBlob) -> Result<()> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::BackendError(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(cache_path, blob.to_bytes()).map_err(|e| {
            Error::BackendError(format!("Cannot write {}: {}", cache_path.display(), e))
        })
    }

    /// Load a stage from cache if valid, otherwise compile it and refresh the cache
    ///
    /// # Arguments
    ///
    /// * `compiler` - Compiler used on a cache miss
    /// * `source_path` - Resolved path of the stage source
    /// * `file_name` - Stage file name as written in the descriptor (cache key)
    /// * `stage` - Pipeline stage
    /// * `macros` - Ordered preprocessor definitions
    pub fn load_or_compile(
        &self,
        compiler: &dyn ShaderCompiler,
        source_path: &Path,
        file_name: &str,
        stage: ShaderStage,
        macros: &[ShaderMacro],
    ) -> Result<CompiledStage> {
        let cache_path = self.cache_path(file_name, macros);
        let source_timestamp = last_write_time(source_path);

        if self.is_cache_valid(source_path, &cache_path) {
            if let Some(blob) = self.load(&cache_path) {
                engine_trace!("nova3d::ShaderCache", "Cache hit {}", cache_path.display());
                return Ok(CompiledStage {
                    stage,
                    blob,
                    source_path: source_path.to_path_buf(),
                    cache_path,
                    source_timestamp,
                    from_cache: true,
                });
            }
        }

        engine_debug!(
            "nova3d::ShaderCache",
            "Cache miss for {} ({} macros), compiling",
            file_name,
            macros.len()
        );
        let blob = CompiledStageBlob::new(compiler.compile(source_path, stage, macros)?);
        if let Err(e) = self.store(&cache_path, &blob) {
            engine_warn!("nova3d::ShaderCache", "{}", e);
        }

        Ok(CompiledStage {
            stage,
            blob,
            source_path: source_path.to_path_buf(),
            cache_path,
            source_timestamp,
            from_cache: false,
        })
    }
}

#[cfg(test)]
#[path = "shader_cache_tests.rs"]
mod tests;
