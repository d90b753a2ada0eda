/// Compute blur that replaces the vertical pass with transpose + horizontal
///
/// Both blur dispatches walk rows, so every tap reads contiguous memory; the
/// cost is the extra transpose dispatch.

use glam::UVec3;
use crate::error::Result;
use crate::graphics_device::{SamplerId, TextureId};
use crate::render_passes::blur_strategy::{pass_shader, patch_pass_count};
use crate::render_passes::compute_blur::{create_storage_texture, BlurAxis, ComputeBlurParams};
use crate::render_passes::{BloomSettings, BlurContext, BlurStrategy, BlurStrategyKind};
use crate::shader::{ShaderDesc, ShaderId, ShaderManager, ShaderStage, ShaderStageDesc};

/// Threads per transpose group along x and y
pub const TRANSPOSE_TILE_SIZE: u32 = 16;

pub struct ComputeTransposeBlur {
    blur_horizontal: ShaderId,
    transpose: ShaderId,
    blur_transposed: ShaderId,
    horizontal_params: ComputeBlurParams,
    transposed_params: ComputeBlurParams,
    output: TextureId,
    transposed: TextureId,
    sampler: SamplerId,
}

impl ComputeTransposeBlur {
    pub fn new(
        shaders: &mut ShaderManager,
        width: u32,
        height: u32,
        kernel_dimension: u32,
        settings: &BloomSettings,
        sampler: SamplerId,
    ) -> Result<Self> {
        let graphics_device = shaders.graphics_device().clone();
        let output = create_storage_texture(&graphics_device, width, height)?;
        let transposed = create_storage_texture(&graphics_device, height, width)?;

        let horizontal_params = ComputeBlurParams {
            axis: BlurAxis::Horizontal,
            image_width: width,
            image_height: height,
            kernel_dimension,
            pass_count: settings.pass_pairs(),
            transpose_output: false,
        };
        let transposed_params = ComputeBlurParams {
            image_width: height,
            image_height: width,
            transpose_output: true,
            ..horizontal_params
        };

        let blur_horizontal = shaders.create_shader(horizontal_params.shader_desc("BlurCS_Horizontal"))?;
        let transpose = shaders.create_shader(
            ShaderDesc::new("Transpose")
                .with_stage(ShaderStage::Compute, ShaderStageDesc::new("Transpose_cs.glsl")),
        )?;
        let blur_transposed = shaders.create_shader(transposed_params.shader_desc("BlurCS_Transposed"))?;

        Ok(Self {
            blur_horizontal,
            transpose,
            blur_transposed,
            horizontal_params,
            transposed_params,
            output,
            transposed,
            sampler,
        })
    }

    /// Transpose groups covering a `width` x `height` image
    pub fn transpose_group_count(width: u32, height: u32) -> UVec3 {
        UVec3::new(
            width.div_ceil(TRANSPOSE_TILE_SIZE),
            height.div_ceil(TRANSPOSE_TILE_SIZE),
            1,
        )
    }

    pub fn transposed_texture(&self) -> TextureId {
        self.transposed
    }
}

impl BlurStrategy for ComputeTransposeBlur {
    fn kind(&self) -> BlurStrategyKind {
        BlurStrategyKind::ComputeTranspose
    }

    fn update_settings(&mut self, shaders: &mut ShaderManager, settings: &BloomSettings) -> Result<bool> {
        let mut reloaded = false;
        if patch_pass_count(shaders, self.blur_horizontal, settings.pass_pairs())? {
            self.horizontal_params.pass_count = settings.pass_pairs();
            reloaded = true;
        }
        if patch_pass_count(shaders, self.blur_transposed, settings.pass_pairs())? {
            self.transposed_params.pass_count = settings.pass_pairs();
            reloaded = true;
        }
        Ok(reloaded)
    }

    fn execute(&self, ctx: &mut BlurContext<'_>) -> Result<TextureId> {
        let shader = pass_shader(ctx.shaders, self.blur_horizontal)?;
        shader.bind(ctx.cmd)?;
        shader.set_texture(ctx.cmd, "texColorIn", ctx.source)?;
        shader.set_texture(ctx.cmd, "texColorOut", self.output)?;
        shader.set_sampler(ctx.cmd, "sSampler", self.sampler)?;
        shader.update_constants(ctx.cmd)?;
        ctx.cmd.dispatch(self.horizontal_params.group_count())?;

        let shader = pass_shader(ctx.shaders, self.transpose)?;
        shader.bind(ctx.cmd)?;
        shader.set_texture(ctx.cmd, "texImageIn", self.output)?;
        shader.set_texture(ctx.cmd, "texTransposeOut", self.transposed)?;
        shader.update_constants(ctx.cmd)?;
        ctx.cmd.dispatch(Self::transpose_group_count(
            self.horizontal_params.image_width,
            self.horizontal_params.image_height,
        ))?;

        let shader = pass_shader(ctx.shaders, self.blur_transposed)?;
        shader.bind(ctx.cmd)?;
        shader.set_texture(ctx.cmd, "texColorIn", self.transposed)?;
        shader.set_texture(ctx.cmd, "texColorOut", self.output)?;
        shader.set_sampler(ctx.cmd, "sSampler", self.sampler)?;
        shader.update_constants(ctx.cmd)?;
        ctx.cmd.dispatch(self.transposed_params.group_count())?;

        Ok(self.output_texture())
    }

    fn output_texture(&self) -> TextureId {
        self.output
    }
}
