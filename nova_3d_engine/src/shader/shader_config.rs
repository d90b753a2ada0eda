/// Shader subsystem configuration

use std::env;
use std::path::PathBuf;

/// Where shader sources are read from and compiled blobs are cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderConfig {
    /// Directory stage file names are resolved against
    pub shader_root: PathBuf,
    /// Directory holding compiled `.spv` blobs
    pub cache_directory: PathBuf,
    /// Entry point of every stage
    pub entry_point: String,
}

impl ShaderConfig {
    pub fn new(shader_root: impl Into<PathBuf>, cache_directory: impl Into<PathBuf>) -> Self {
        Self {
            shader_root: shader_root.into(),
            cache_directory: cache_directory.into(),
            entry_point: "main".to_string(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::new("shaders", default_cache_directory())
    }
}

/// Per-user application data cache directory for compiled shaders
///
/// `LOCALAPPDATA` / `APPDATA` on Windows, `XDG_CACHE_HOME` or `~/.cache`
/// elsewhere, the temp directory as a last resort.
pub fn default_cache_directory() -> PathBuf {
    let base = ["LOCALAPPDATA", "APPDATA", "XDG_CACHE_HOME"]
        .iter()
        .find_map(|key| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from))
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(env::temp_dir);
    base.join("Nova3D").join("ShaderCache")
}
