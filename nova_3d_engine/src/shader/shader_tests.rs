/// Unit tests for Shader: build, constants, bindings and reload

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{MockCommandList, MockGraphicsDevice, RecordedCommand};
use crate::graphics_device::ShaderStage;
use crate::shader::*;
use crate::test_utils::ScratchDir;

const VERTEX: &str = "#version 450
layout(location = 0) out vec2 uv;
void main() {
    vec2 position = vec2(float((gl_VertexIndex << 1) & 2), float(gl_VertexIndex & 2));
    uv = position;
    gl_Position = vec4(position * 2.0 - 1.0, 0.0, 1.0);
}
";

const PIXEL: &str = "#version 450
layout(location = 0) in vec2 uv;
layout(location = 0) out vec4 outColor;
layout(set = 0, binding = 0) uniform TintParams {
    float intensity;
    int mode;
    vec4 tint;
} params;
layout(set = 0, binding = 1) uniform texture2D albedo;
layout(set = 0, binding = 2) uniform sampler linearSampler;
void main() {
    vec4 color = texture(sampler2D(albedo, linearSampler), uv);
    outColor = color * params.tint * params.intensity + vec4(float(params.mode));
}
";

const PIXEL_BROKEN: &str = "#version 450
layout(location = 0) out vec4 outColor;
void main() { outColor = undefinedSymbol; }
";

struct Fixture {
    sources: ScratchDir,
    cache: ShaderCache,
    _cache_dir: ScratchDir,
    compiler: GlslCompiler,
    device: MockGraphicsDevice,
}

impl Fixture {
    fn new(label: &str) -> Self {
        let sources = ScratchDir::new(label);
        let cache_dir = ScratchDir::new(&format!("{}_cache", label));
        sources.write("Tint_vs.glsl", VERTEX);
        sources.write("Tint_ps.glsl", PIXEL);
        sources.write("Broken_ps.glsl", PIXEL_BROKEN);
        Self {
            cache: ShaderCache::new(cache_dir.path()),
            _cache_dir: cache_dir,
            sources,
            compiler: GlslCompiler::new(),
            device: MockGraphicsDevice::new(),
        }
    }

    fn build(&mut self, desc: ShaderDesc) -> Shader {
        let mut ctx = ShaderBuildContext {
            device: &mut self.device,
            cache: &self.cache,
            compiler: &self.compiler,
            shader_root: self.sources.path(),
            entry_point: "main",
        };
        Shader::new(desc, &mut ctx).unwrap()
    }

    fn reload(&mut self, shader: &mut Shader) {
        let mut ctx = ShaderBuildContext {
            device: &mut self.device,
            cache: &self.cache,
            compiler: &self.compiler,
            shader_root: self.sources.path(),
            entry_point: "main",
        };
        shader.reload(&mut ctx).unwrap();
    }
}

fn tint_desc() -> ShaderDesc {
    ShaderDesc::new("Tint")
        .with_stage(ShaderStage::Vertex, ShaderStageDesc::new("Tint_vs.glsl"))
        .with_stage(ShaderStage::Pixel, ShaderStageDesc::new("Tint_ps.glsl"))
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn test_new_links_all_stages() {
    let mut fixture = Fixture::new("shader_link");
    let shader = fixture.build(tint_desc());

    assert_eq!(shader.state(), ShaderState::Linked);
    assert_eq!(shader.name(), "Tint");
    assert_eq!(shader.compile_report(), CompileReport { compiled: 2, cached: 0, failed: 0 });
    assert!(shader.module(ShaderStage::Vertex).is_some());
    assert!(shader.module(ShaderStage::Pixel).is_some());
    assert!(shader.module(ShaderStage::Compute).is_none());
    assert_eq!(fixture.device.shader_modules_created, 2);
    assert!(shader.cache_path(ShaderStage::Pixel).unwrap().exists());
}

#[test]
fn test_second_build_uses_cache() {
    let mut fixture = Fixture::new("shader_cached");
    let first = fixture.build(tint_desc());
    let second = fixture.build(tint_desc());

    assert_eq!(second.compile_report(), CompileReport { compiled: 0, cached: 2, failed: 0 });
    assert_eq!(
        first.reflection(ShaderStage::Pixel),
        second.reflection(ShaderStage::Pixel)
    );
    assert_eq!(first.stage_blob(ShaderStage::Pixel), second.stage_blob(ShaderStage::Pixel));
}

#[test]
fn test_failed_stage_left_unbound() {
    let mut fixture = Fixture::new("shader_failed");
    let desc = ShaderDesc::new("Broken")
        .with_stage(ShaderStage::Vertex, ShaderStageDesc::new("Tint_vs.glsl"))
        .with_stage(ShaderStage::Pixel, ShaderStageDesc::new("Broken_ps.glsl"));
    let shader = fixture.build(desc);

    assert_eq!(shader.state(), ShaderState::Linked);
    assert_eq!(shader.compile_report().failed, 1);
    assert!(shader.module(ShaderStage::Pixel).is_none());
    assert!(shader.module(ShaderStage::Vertex).is_some());
}

#[test]
fn test_missing_source_is_not_fatal() {
    let mut fixture = Fixture::new("shader_missing");
    let desc = ShaderDesc::new("Missing")
        .with_stage(ShaderStage::Pixel, ShaderStageDesc::new("Nope_ps.glsl"));
    let shader = fixture.build(desc);
    assert_eq!(shader.compile_report().failed, 1);
    assert!(shader.cpu_constants().is_empty());
}

#[test]
fn test_empty_file_name_skipped() {
    let mut fixture = Fixture::new("shader_empty_stage");
    let desc = tint_desc().with_stage(ShaderStage::Geometry, ShaderStageDesc::new(""));
    let shader = fixture.build(desc);
    assert_eq!(shader.compile_report(), CompileReport { compiled: 2, cached: 0, failed: 0 });
}

// ============================================================================
// Constants
// ============================================================================

#[test]
fn test_constant_mirrors_follow_layout() {
    let mut fixture = Fixture::new("shader_layout");
    let shader = fixture.build(tint_desc());

    assert_eq!(shader.constant_buffers().len(), 1);
    let names: Vec<&str> = shader.cpu_constants().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["intensity", "mode", "tint"]);
    assert_eq!(shader.constant("intensity").unwrap().offset(), 0);
    assert_eq!(shader.constant("mode").unwrap().offset(), 4);
    assert_eq!(shader.constant("tint").unwrap().offset(), 16);
    assert_eq!(shader.constant("tint").unwrap().size(), 16);

    let layout = &shader.constant_buffers()[0].layout;
    assert_eq!(shader.constant_buffers()[0].buffer().size(), layout.size as u64);
}

#[test]
fn test_set_constant() {
    let mut fixture = Fixture::new("shader_set_constant");
    let mut shader = fixture.build(tint_desc());

    assert!(shader.set_constant("intensity", &2.5f32));
    assert_eq!(shader.constant("intensity").unwrap().data(), 2.5f32.to_ne_bytes());
    assert!(shader.set_constant("tint", &[1.0f32, 0.5, 0.25, 1.0]));

    // wrong size and unknown names are ignored
    assert!(!shader.set_constant("intensity", &1.0f64));
    assert_eq!(shader.constant("intensity").unwrap().data(), 2.5f32.to_ne_bytes());
    assert!(!shader.set_constant("missing", &1.0f32));
    assert!(!shader.has_constant("missing"));
    assert!(matches!(shader.constant("missing"), Err(Error::LookupMiss(_))));
}

#[test]
fn test_update_constants_flushes_dirty_buffers() {
    let mut fixture = Fixture::new("shader_flush");
    let mut shader = fixture.build(tint_desc());
    let mut cmd = MockCommandList::new();

    shader.set_constant("intensity", &2.0f32);
    shader.set_constant("mode", &3i32);
    shader.update_constants(&mut cmd).unwrap();

    let buffer = fixture.device.buffers.last().unwrap();
    let bytes = buffer.bytes();
    assert_eq!(&bytes[0..4], &2.0f32.to_ne_bytes());
    assert_eq!(&bytes[4..8], &3i32.to_ne_bytes());
    assert_eq!(buffer.updates(), 1);
    assert!(matches!(
        cmd.commands.as_slice(),
        [RecordedCommand::BindConstantBuffer { stage: ShaderStage::Pixel, slot: 0, .. }]
    ));

    // clean buffers are not flushed again
    shader.update_constants(&mut cmd).unwrap();
    assert_eq!(buffer.updates(), 1);
    assert_eq!(cmd.commands.len(), 1);
}

#[test]
fn test_bind_marks_buffers_dirty() {
    let mut fixture = Fixture::new("shader_bind");
    let mut shader = fixture.build(tint_desc());
    let mut cmd = MockCommandList::new();
    shader.update_constants(&mut cmd).unwrap();
    assert!(!shader.constant_buffers()[0].is_dirty());

    shader.bind(&mut cmd).unwrap();
    let bound: Vec<(ShaderStage, bool)> = cmd
        .commands
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::BindShaderModule { stage, bound } => Some((*stage, *bound)),
            _ => None,
        })
        .collect();
    assert_eq!(bound.len(), ShaderStage::COUNT);
    assert!(bound.contains(&(ShaderStage::Vertex, true)));
    assert!(bound.contains(&(ShaderStage::Pixel, true)));
    assert!(bound.contains(&(ShaderStage::Hull, false)));
    assert!(shader.constant_buffers()[0].is_dirty());
}

#[test]
fn test_cpu_constant_equality_is_identity() {
    let mut fixture = Fixture::new("shader_identity");
    let a = fixture.build(tint_desc());
    let b = fixture.build(tint_desc());

    let mine = a.constant("intensity").unwrap();
    assert_eq!(mine, &a.cpu_constants()[0]);
    assert_ne!(mine, b.constant("intensity").unwrap());
}

// ============================================================================
// Textures and samplers
// ============================================================================

#[test]
fn test_texture_and_sampler_bindings() {
    let mut fixture = Fixture::new("shader_textures");
    let shader = fixture.build(tint_desc());

    let albedo = shader.texture_binding("albedo").unwrap();
    assert_eq!((albedo.stage, albedo.slot), (ShaderStage::Pixel, 1));
    let sampler = shader.sampler_binding("linearSampler").unwrap();
    assert_eq!(sampler.slot, 2);
    assert!(matches!(shader.texture_binding("normalMap"), Err(Error::LookupMiss(_))));
    assert!(matches!(shader.sampler_binding("albedo"), Err(Error::LookupMiss(_))));
}

#[test]
fn test_set_texture_records_slot() {
    let mut fixture = Fixture::new("shader_set_texture");
    let shader = fixture.build(tint_desc());
    let texture = {
        use crate::graphics_device::{GraphicsDevice, TextureDesc, TextureFormat, TextureUsage};
        fixture
            .device
            .create_texture(TextureDesc {
                width: 4,
                height: 4,
                format: TextureFormat::R8G8B8A8_UNORM,
                usage: TextureUsage::SAMPLED,
            })
            .unwrap()
    };
    let mut cmd = MockCommandList::new();

    assert!(shader.set_texture(&mut cmd, "albedo", texture).unwrap());
    assert!(!shader.set_texture(&mut cmd, "normalMap", texture).unwrap());
    assert_eq!(
        cmd.commands,
        vec![RecordedCommand::BindTexture { stage: ShaderStage::Pixel, slot: 1, texture }]
    );
}

#[test]
fn test_texture_name_shared_by_stages_last_wins() {
    let mut fixture = Fixture::new("shader_last_wins");
    fixture.sources.write(
        "Shared_vs.glsl",
        "#version 450
layout(set = 0, binding = 3) uniform texture2D heightMap;
layout(set = 0, binding = 4) uniform sampler heightSampler;
void main() {
    float h = textureLod(sampler2D(heightMap, heightSampler), vec2(0.0), 0.0).r;
    gl_Position = vec4(0.0, h, 0.0, 1.0);
}
",
    );
    fixture.sources.write(
        "Shared_ps.glsl",
        "#version 450
layout(location = 0) out vec4 outColor;
layout(set = 0, binding = 1) uniform texture2D heightMap;
layout(set = 0, binding = 2) uniform sampler heightSampler;
void main() { outColor = texture(sampler2D(heightMap, heightSampler), vec2(0.5)); }
",
    );
    let shader = fixture.build(ShaderDesc::from_shader_name(
        "Shared",
        crate::graphics_device::ShaderStageFlags::VERTEX | crate::graphics_device::ShaderStageFlags::PIXEL,
    ));

    assert_eq!(shader.texture_bindings().len(), 2);
    let binding = shader.texture_binding("heightMap").unwrap();
    assert_eq!((binding.stage, binding.slot), (ShaderStage::Pixel, 1));
}

// ============================================================================
// Reload and release
// ============================================================================

#[test]
fn test_reload_preserves_constants() {
    let mut fixture = Fixture::new("shader_reload_constants");
    let mut shader = fixture.build(tint_desc());
    shader.set_constant("intensity", &4.0f32);

    fixture.reload(&mut shader);
    assert_eq!(shader.constant("intensity").unwrap().data(), 4.0f32.to_ne_bytes());
    assert_eq!(shader.compile_report().cached, 2);
}

#[test]
fn test_macro_patch_and_reload_compiles_new_permutation() {
    let mut fixture = Fixture::new("shader_reload_macro");
    let mut shader = fixture.build(tint_desc());
    assert!(shader.desc_mut().set_macro("TINT_VARIANT", 2));

    fixture.reload(&mut shader);
    assert_eq!(shader.compile_report(), CompileReport { compiled: 2, cached: 0, failed: 0 });
    assert_eq!(
        shader.desc().pixel().unwrap().macro_value("TINT_VARIANT"),
        Some("2")
    );
}

#[test]
fn test_source_update_detection() {
    let mut fixture = Fixture::new("shader_hot_reload");
    let path = fixture.sources.path().join("Tint_ps.glsl");
    set_mtime(&path, SystemTime::now() - Duration::from_secs(600));

    let mut shader = fixture.build(tint_desc());
    assert!(!shader.has_source_file_been_updated());

    // newer than the cache entry written by the first build
    set_mtime(&path, SystemTime::now() + Duration::from_secs(60));
    assert!(shader.has_source_file_been_updated());

    fixture.reload(&mut shader);
    assert!(!shader.has_source_file_been_updated());
    assert_eq!(shader.compile_report().compiled, 1);
}

#[test]
fn test_release() {
    let mut fixture = Fixture::new("shader_release");
    let mut shader = fixture.build(tint_desc());
    shader.release();

    assert_eq!(shader.state(), ShaderState::Released);
    assert!(shader.module(ShaderStage::Pixel).is_none());
    assert!(shader.cpu_constants().is_empty());
    assert!(!shader.has_texture_binding("albedo"));
}
