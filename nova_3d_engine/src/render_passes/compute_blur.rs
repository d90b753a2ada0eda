/// Separable Gaussian blur in two compute dispatches
///
/// The horizontal dispatch runs one thread group per row, the vertical one
/// thread group per column; the pass count is unrolled into the shader
/// through the PASS_COUNT macro.

use std::sync::{Arc, Mutex};
use glam::UVec3;
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, SamplerId, TextureDesc, TextureFormat, TextureId, TextureUsage,
};
use crate::render_passes::blur_strategy::{pass_shader, patch_pass_count};
use crate::render_passes::{BloomSettings, BlurContext, BlurStrategy, BlurStrategyKind};
use crate::shader::{ShaderDesc, ShaderId, ShaderManager, ShaderStage, ShaderStageDesc};

/// Upper bound of threads per group along the blurred axis
pub const MAX_THREAD_GROUP_SIZE: u32 = 1024;

const DISPATCH_COUNT: usize = 2;

/// Axis a compute blur runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurAxis {
    Horizontal,
    Vertical,
}

/// Parameters of one `Blur_cs` permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeBlurParams {
    pub axis: BlurAxis,
    /// Size of the image the shader reads
    pub image_width: u32,
    pub image_height: u32,
    pub kernel_dimension: u32,
    pub pass_count: u32,
    /// Write (y, x) instead of (x, y)
    pub transpose_output: bool,
}

impl ComputeBlurParams {
    /// Threads per group: the scanline length, capped, along the blurred axis
    pub fn thread_group_size(&self) -> UVec3 {
        match self.axis {
            BlurAxis::Horizontal => UVec3::new(self.image_width.min(MAX_THREAD_GROUP_SIZE), 1, 1),
            BlurAxis::Vertical => UVec3::new(1, self.image_height.min(MAX_THREAD_GROUP_SIZE), 1),
        }
    }

    /// Thread groups per dispatch: one per scanline
    pub fn group_count(&self) -> UVec3 {
        match self.axis {
            BlurAxis::Horizontal => UVec3::new(1, self.image_height, 1),
            BlurAxis::Vertical => UVec3::new(self.image_width, 1, 1),
        }
    }

    /// Shader descriptor for this permutation
    pub fn shader_desc(&self, name: &str) -> ShaderDesc {
        let groups = self.thread_group_size();
        let mut stage = ShaderStageDesc::new("Blur_cs.glsl");
        stage = match self.axis {
            BlurAxis::Horizontal => stage.with_macro("HORIZONTAL", 1),
            BlurAxis::Vertical => stage.with_macro("VERTICAL", 1),
        };
        stage = stage
            .with_macro("IMAGE_SIZE_X", self.image_width)
            .with_macro("IMAGE_SIZE_Y", self.image_height)
            .with_macro("THREAD_GROUP_SIZE_X", groups.x)
            .with_macro("THREAD_GROUP_SIZE_Y", groups.y)
            .with_macro("THREAD_GROUP_SIZE_Z", groups.z)
            .with_macro("KERNEL_DIMENSION", self.kernel_dimension)
            .with_macro("PASS_COUNT", self.pass_count);
        if self.transpose_output {
            stage = stage.with_macro("TRANSPOSE_OUTPUT", 1);
        }
        ShaderDesc::new(name).with_stage(ShaderStage::Compute, stage)
    }
}

/// Create a read-write intermediate texture
pub(crate) fn create_storage_texture(
    graphics_device: &Arc<Mutex<dyn GraphicsDevice>>,
    width: u32,
    height: u32,
) -> Result<TextureId> {
    let mut device = graphics_device
        .lock()
        .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))?;
    device.create_texture(TextureDesc {
        width,
        height,
        format: TextureFormat::R16G16B16A16_SFLOAT,
        usage: TextureUsage::STORAGE | TextureUsage::SAMPLED,
    })
}

pub struct ComputeBlur {
    shaders: [ShaderId; DISPATCH_COUNT],
    params: [ComputeBlurParams; DISPATCH_COUNT],
    outputs: [TextureId; DISPATCH_COUNT],
    sampler: SamplerId,
}

impl ComputeBlur {
    pub fn new(
        shaders: &mut ShaderManager,
        width: u32,
        height: u32,
        kernel_dimension: u32,
        settings: &BloomSettings,
        sampler: SamplerId,
    ) -> Result<Self> {
        let graphics_device = shaders.graphics_device().clone();
        let outputs = [
            create_storage_texture(&graphics_device, width, height)?,
            create_storage_texture(&graphics_device, width, height)?,
        ];

        let params = [BlurAxis::Horizontal, BlurAxis::Vertical].map(|axis| ComputeBlurParams {
            axis,
            image_width: width,
            image_height: height,
            kernel_dimension,
            pass_count: settings.pass_pairs(),
            transpose_output: false,
        });
        let ids = [
            shaders.create_shader(params[0].shader_desc("BlurCS_Horizontal"))?,
            shaders.create_shader(params[1].shader_desc("BlurCS_Vertical"))?,
        ];

        Ok(Self {
            shaders: ids,
            params,
            outputs,
            sampler,
        })
    }

    pub fn shader_ids(&self) -> [ShaderId; DISPATCH_COUNT] {
        self.shaders
    }
}

impl BlurStrategy for ComputeBlur {
    fn kind(&self) -> BlurStrategyKind {
        BlurStrategyKind::Compute
    }

    fn update_settings(&mut self, shaders: &mut ShaderManager, settings: &BloomSettings) -> Result<bool> {
        let mut reloaded = false;
        for (id, params) in self.shaders.iter().zip(self.params.iter_mut()) {
            if patch_pass_count(shaders, *id, settings.pass_pairs())? {
                params.pass_count = settings.pass_pairs();
                reloaded = true;
            }
        }
        Ok(reloaded)
    }

    fn execute(&self, ctx: &mut BlurContext<'_>) -> Result<TextureId> {
        for dispatch in 0..DISPATCH_COUNT {
            let input = if dispatch == 0 { ctx.source } else { self.outputs[dispatch - 1] };
            let shader = pass_shader(ctx.shaders, self.shaders[dispatch])?;
            shader.bind(ctx.cmd)?;
            shader.set_texture(ctx.cmd, "texColorIn", input)?;
            shader.set_texture(ctx.cmd, "texColorOut", self.outputs[dispatch])?;
            shader.set_sampler(ctx.cmd, "sSampler", self.sampler)?;
            shader.update_constants(ctx.cmd)?;
            ctx.cmd.dispatch(self.params[dispatch].group_count())?;
        }
        Ok(self.output_texture())
    }

    fn output_texture(&self) -> TextureId {
        self.outputs[(DISPATCH_COUNT - 1) % 2]
    }
}
