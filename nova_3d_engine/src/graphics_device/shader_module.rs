/// Shader stages and the backend shader module trait

use bitflags::bitflags;

/// Programmable pipeline stage
///
/// The declaration order is the pipeline order, and `index()` addresses the
/// fixed-size per-stage arrays used across the shader subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
}

impl ShaderStage {
    /// Number of stages
    pub const COUNT: usize = 6;

    /// All stages in pipeline order
    pub const ALL: [ShaderStage; ShaderStage::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Geometry,
        ShaderStage::Pixel,
        ShaderStage::Compute,
    ];

    /// Array index of this stage
    pub fn index(self) -> usize {
        self as usize
    }

    /// File name suffix identifying the stage (`Blur_ps.glsl` -> `ps`)
    pub fn suffix(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs",
            ShaderStage::Hull => "hs",
            ShaderStage::Domain => "ds",
            ShaderStage::Geometry => "gs",
            ShaderStage::Pixel => "ps",
            ShaderStage::Compute => "cs",
        }
    }

    /// Infer the stage from the last two characters of a file stem
    ///
    /// `"Bloom_ps.glsl"` and `"shaders/Blur_cs"` both resolve, anything without a
    /// known suffix returns `None`.
    pub fn from_file_name(file_name: &str) -> Option<ShaderStage> {
        let stem = std::path::Path::new(file_name).file_stem()?.to_str()?;
        let (_, suffix) = stem.rsplit_once('_')?;
        ShaderStage::ALL
            .into_iter()
            .find(|stage| stage.suffix().eq_ignore_ascii_case(suffix))
    }

    /// Flag for this stage
    pub fn flag(self) -> ShaderStageFlags {
        ShaderStageFlags::from_bits_truncate(1 << self.index())
    }
}

bitflags! {
    /// Set of shader stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const HULL = 1 << 1;
        const DOMAIN = 1 << 2;
        const GEOMETRY = 1 << 3;
        const PIXEL = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc<'a> {
    /// SPIR-V words
    pub code: &'a [u32],
    /// Pipeline stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
}

/// Compiled, device-side shader stage program
pub trait ShaderModule: Send + Sync {
    /// Stage this module was created for
    fn stage(&self) -> ShaderStage;
}
