/// Bloom post-process pass.
///
/// Bright-pass filter into an MRT pair (color copy + bright), blur through the
/// blur strategy selected at initialization, then additive combine into the
/// final render target.

use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, DepthStencilState, RasterizationState, RenderTargetDesc,
    RenderTargetId, SamplerDesc, SamplerId, TextureId,
};
use crate::render_passes::blur_strategy::pass_shader;
use crate::render_passes::{
    BloomSettings, BlurContext, BlurStrategy, BlurStrategyKind, ComputeBlur,
    ComputeTransposeBlur, SeparablePixelBlur,
};
use crate::shader::{ShaderDesc, ShaderId, ShaderManager, ShaderStage, ShaderStageDesc};
use crate::{engine_debug, engine_error, engine_warn};

/// Static configuration of the bloom pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomPassConfig {
    /// 0 = separable pixel shader, 1 = compute, 2 = compute transpose
    pub blur_strategy: u32,
    /// Gaussian taps per blur pass, must be odd
    pub kernel_dimension: u32,
}

impl Default for BloomPassConfig {
    fn default() -> Self {
        Self {
            blur_strategy: BlurStrategyKind::SeparablePixel.index(),
            kernel_dimension: 15,
        }
    }
}

/// The five bloom render targets and their textures
#[derive(Debug, Clone, Copy)]
struct RenderTargetSet {
    color: RenderTargetId,
    bright: RenderTargetId,
    final_: RenderTargetId,
    ping_pong: [RenderTargetId; 2],
    color_texture: TextureId,
    bright_texture: TextureId,
    final_texture: TextureId,
    ping_pong_textures: [TextureId; 2],
}

pub struct BloomPass {
    targets: RenderTargetSet,
    bright_filter_shader: ShaderId,
    blur_horizontal_shader: ShaderId,
    blur_vertical_shader: ShaderId,
    combine_shader: ShaderId,
    sampler: SamplerId,
    blur_strategy_index: u32,
    blur: Option<Box<dyn BlurStrategy>>,
    settings_reloads: u32,
}

impl BloomPass {
    /// Create render targets, shaders, sampler and the configured blur strategy
    ///
    /// An out-of-range strategy index is not an error: the pass renders
    /// without blur and warns every frame.
    pub fn initialize(
        shaders: &mut ShaderManager,
        settings: &BloomSettings,
        target_desc: &RenderTargetDesc,
        config: &BloomPassConfig,
    ) -> Result<Self> {
        let kernel_dimension = if config.kernel_dimension % 2 == 0 {
            engine_warn!(
                "nova3d::BloomPass",
                "Kernel dimension {} is even, using {}",
                config.kernel_dimension,
                config.kernel_dimension + 1
            );
            config.kernel_dimension + 1
        } else {
            config.kernel_dimension
        };

        let (targets, sampler) = {
            let mut device = shaders
                .graphics_device()
                .lock()
                .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))?;

            let mut create = |desc: &RenderTargetDesc| -> Result<(RenderTargetId, TextureId)> {
                let target = device.create_render_target(desc)?;
                let texture = device.render_target_texture(target).ok_or_else(|| {
                    Error::InitializationFailed("Render target without texture".to_string())
                })?;
                Ok((target, texture))
            };
            let (color, color_texture) = create(target_desc)?;
            let (bright, bright_texture) = create(target_desc)?;
            let (final_, final_texture) = create(target_desc)?;
            let (ping, ping_texture) = create(target_desc)?;
            let (pong, pong_texture) = create(target_desc)?;

            let sampler = device.create_sampler(SamplerDesc::point_clamp())?;
            (
                RenderTargetSet {
                    color,
                    bright,
                    final_,
                    ping_pong: [ping, pong],
                    color_texture,
                    bright_texture,
                    final_texture,
                    ping_pong_textures: [ping_texture, pong_texture],
                },
                sampler,
            )
        };

        let fullscreen = || ShaderStageDesc::new("FullScreenTriangle_vs.glsl");
        let pixel_blur = |name: &str, axis_macro: &str| {
            ShaderDesc::new(name)
                .with_stage(ShaderStage::Vertex, fullscreen())
                .with_stage(
                    ShaderStage::Pixel,
                    ShaderStageDesc::new("Blur_ps.glsl")
                        .with_macro("KERNEL_DIMENSION", kernel_dimension)
                        .with_macro(axis_macro, 1),
                )
        };

        let bright_filter_shader = shaders.create_shader(
            ShaderDesc::new("Bloom")
                .with_stage(ShaderStage::Vertex, fullscreen())
                .with_stage(ShaderStage::Pixel, ShaderStageDesc::new("Bloom_ps.glsl")),
        )?;
        let blur_horizontal_shader = shaders.create_shader(pixel_blur("BlurH", "HORIZONTAL_PASS"))?;
        let blur_vertical_shader = shaders.create_shader(pixel_blur("BlurV", "VERTICAL_PASS"))?;
        let combine_shader = shaders.create_shader(
            ShaderDesc::new("BloomCombine")
                .with_stage(ShaderStage::Vertex, fullscreen())
                .with_stage(ShaderStage::Pixel, ShaderStageDesc::new("BloomCombine_ps.glsl")),
        )?;

        let (width, height) = (target_desc.width, target_desc.height);
        let blur: Option<Box<dyn BlurStrategy>> = match BlurStrategyKind::from_index(config.blur_strategy) {
            Some(BlurStrategyKind::SeparablePixel) => Some(Box::new(SeparablePixelBlur::new(
                blur_horizontal_shader,
                blur_vertical_shader,
                targets.ping_pong,
                targets.ping_pong_textures,
                width,
                height,
                sampler,
            ))),
            Some(BlurStrategyKind::Compute) => Some(Box::new(ComputeBlur::new(
                shaders, width, height, kernel_dimension, settings, sampler,
            )?)),
            Some(BlurStrategyKind::ComputeTranspose) => Some(Box::new(ComputeTransposeBlur::new(
                shaders, width, height, kernel_dimension, settings, sampler,
            )?)),
            None => {
                engine_warn!(
                    "nova3d::BloomPass",
                    "Unknown blur strategy {}, bloom will not be blurred",
                    config.blur_strategy
                );
                None
            }
        };

        if let Some(blur) = &blur {
            engine_debug!(
                "nova3d::BloomPass",
                "Initialized {}x{} with {} blur",
                width,
                height,
                blur.kind()
            );
        }

        Ok(Self {
            targets,
            bright_filter_shader,
            blur_horizontal_shader,
            blur_vertical_shader,
            combine_shader,
            sampler,
            blur_strategy_index: config.blur_strategy,
            blur,
            settings_reloads: 0,
        })
    }

    /// Forward a settings change to the blur strategy
    ///
    /// Returns true if shaders were reloaded (compute strategies with a new
    /// blur strength). Repeating the same settings is a no-op.
    pub fn update_settings(&mut self, shaders: &mut ShaderManager, settings: &BloomSettings) -> Result<bool> {
        let Some(blur) = self.blur.as_mut() else {
            return Ok(false);
        };
        let reloaded = blur.update_settings(shaders, settings)?;
        if reloaded {
            self.settings_reloads += 1;
        }
        Ok(reloaded)
    }

    /// Record bright filter, blur and combine
    ///
    /// # Arguments
    ///
    /// * `cmd` - Command list receiving the passes
    /// * `shaders` - Manager owning the bloom shaders
    /// * `input` - Scene color to extract highlights from
    /// * `settings` - Threshold and blur strength for this frame
    ///
    /// # Errors
    ///
    /// `InvalidResource` if `input` is one of the textures the bright filter
    /// writes (the color copy or the bright target). Nothing is recorded then.
    pub fn render(
        &mut self,
        cmd: &mut dyn CommandList,
        shaders: &mut ShaderManager,
        input: TextureId,
        settings: &BloomSettings,
    ) -> Result<()> {
        if input == self.targets.color_texture || input == self.targets.bright_texture {
            let message = "Bloom input aliases a bright filter output".to_string();
            engine_error!("nova3d::BloomPass", "{}", message);
            return Err(Error::InvalidResource(message));
        }

        cmd.begin_event("Bloom")?;

        cmd.begin_event("Bloom Bright Filter")?;
        let shader = pass_shader(shaders, self.bright_filter_shader)?;
        shader.bind(cmd)?;
        cmd.bind_render_targets(&[self.targets.color, self.targets.bright])?;
        cmd.unbind_depth_target()?;
        cmd.set_depth_stencil_state(DepthStencilState::disabled())?;
        cmd.set_rasterization_state(RasterizationState::cull_front())?;
        shader.set_texture(cmd, "colorInput", input)?;
        shader.set_sampler(cmd, "pointSampler", self.sampler)?;
        shader.set_constant("BrightnessThreshold", &settings.brightness_threshold);
        shader.update_constants(cmd)?;
        cmd.draw(3, 0)?;
        cmd.end_event()?;

        cmd.begin_event("Bloom Blur")?;
        match &self.blur {
            Some(blur) => {
                let mut ctx = BlurContext {
                    cmd: &mut *cmd,
                    shaders: &mut *shaders,
                    source: self.targets.bright_texture,
                    settings,
                };
                blur.execute(&mut ctx)?;
            }
            None => engine_warn!(
                "nova3d::BloomPass",
                "Unsupported blur strategy = {}",
                self.blur_strategy_index
            ),
        }
        cmd.end_event()?;

        cmd.begin_event("Bloom Combine")?;
        let bloom_texture = self.bloom_texture();
        let shader = pass_shader(shaders, self.combine_shader)?;
        shader.bind(cmd)?;
        cmd.bind_render_targets(&[self.targets.final_])?;
        shader.set_texture(cmd, "ColorTexture", self.targets.color_texture)?;
        if let Some(bloom) = bloom_texture {
            shader.set_texture(cmd, "BloomTexture", bloom)?;
        }
        shader.set_sampler(cmd, "BlurSampler", self.sampler)?;
        shader.update_constants(cmd)?;
        cmd.draw(3, 0)?;
        cmd.end_event()?;

        cmd.end_event()
    }

    /// Texture holding the blurred highlights, `None` without a valid strategy
    pub fn bloom_texture(&self) -> Option<TextureId> {
        self.blur.as_ref().map(|blur| blur.output_texture())
    }

    pub fn blur_strategy(&self) -> Option<BlurStrategyKind> {
        self.blur.as_ref().map(|blur| blur.kind())
    }

    /// Number of settings updates that reloaded shaders
    pub fn settings_reload_count(&self) -> u32 {
        self.settings_reloads
    }

    pub fn color_render_target(&self) -> RenderTargetId {
        self.targets.color
    }

    pub fn final_render_target(&self) -> RenderTargetId {
        self.targets.final_
    }

    pub fn color_texture(&self) -> TextureId {
        self.targets.color_texture
    }

    pub fn bright_texture(&self) -> TextureId {
        self.targets.bright_texture
    }

    pub fn final_texture(&self) -> TextureId {
        self.targets.final_texture
    }

    /// Ping-pong texture 0 or 1
    pub fn ping_pong_texture(&self, index: usize) -> Option<TextureId> {
        self.targets.ping_pong_textures.get(index).copied()
    }

    pub fn sampler(&self) -> SamplerId {
        self.sampler
    }

    /// Bright filter, horizontal blur, vertical blur and combine shaders
    pub fn shader_ids(&self) -> [ShaderId; 4] {
        [
            self.bright_filter_shader,
            self.blur_horizontal_shader,
            self.blur_vertical_shader,
            self.combine_shader,
        ]
    }
}

#[cfg(test)]
#[path = "bloom_pass_tests.rs"]
mod tests;
