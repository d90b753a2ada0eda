/// Shared fixtures for unit tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::GraphicsDevice;
use crate::log::{LogEntry, LogSeverity, Logger};
use crate::shader::{ShaderConfig, ShaderManager};

static NEXT_DIR: AtomicU32 = AtomicU32::new(0);

/// Scratch directory removed on drop
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "nova3d_{}_{}_{}",
            label,
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Shader sources shipped with the crate
pub fn engine_shader_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

/// Mock device, GLSL manager over the engine shaders, private cache directory
pub struct ManagerFixture {
    pub device: Arc<Mutex<MockGraphicsDevice>>,
    pub manager: ShaderManager,
    pub cache: ScratchDir,
}

impl ManagerFixture {
    pub fn new(label: &str) -> Self {
        Self::with_root(label, engine_shader_root())
    }

    pub fn with_root(label: &str, shader_root: PathBuf) -> Self {
        let cache = ScratchDir::new(label);
        let device = Arc::new(Mutex::new(MockGraphicsDevice::new()));
        let shared: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
        let manager = ShaderManager::with_glsl(shared, ShaderConfig::new(shader_root, cache.path()));
        Self { device, manager, cache }
    }
}

/// Logger keeping every entry for assertions
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    pub fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Messages of the captured entries with the given severity
pub fn messages(entries: &Arc<Mutex<Vec<LogEntry>>>, severity: LogSeverity) -> Vec<String> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.severity == severity)
        .map(|e| e.message.clone())
        .collect()
}
