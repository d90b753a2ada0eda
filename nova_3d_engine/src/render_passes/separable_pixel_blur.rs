/// Separable Gaussian blur in full-screen pixel shader passes
///
/// `2 * blur_strength` passes alternate horizontal and vertical taps between
/// two ping-pong render targets. Pass `i` writes buffer `i % 2` and reads
/// buffer `1 - i % 2`, except pass 0 which reads the bright-pass output.

use crate::error::Result;
use crate::graphics_device::{RenderTargetId, SamplerId, TextureId};
use crate::render_passes::blur_strategy::pass_shader;
use crate::render_passes::{BlurContext, BlurStrategy, BlurStrategyKind};
use crate::shader::ShaderId;

pub struct SeparablePixelBlur {
    blur_horizontal: ShaderId,
    blur_vertical: ShaderId,
    targets: [RenderTargetId; 2],
    textures: [TextureId; 2],
    width: u32,
    height: u32,
    sampler: SamplerId,
}

impl SeparablePixelBlur {
    pub fn new(
        blur_horizontal: ShaderId,
        blur_vertical: ShaderId,
        targets: [RenderTargetId; 2],
        textures: [TextureId; 2],
        width: u32,
        height: u32,
        sampler: SamplerId,
    ) -> Self {
        Self {
            blur_horizontal,
            blur_vertical,
            targets,
            textures,
            width,
            height,
            sampler,
        }
    }

    /// Ping-pong slot written by pass `pass`
    pub fn write_slot(pass: u32) -> usize {
        (pass % 2) as usize
    }

    /// Ping-pong slot read by pass `pass`, `None` for the first pass
    pub fn read_slot(pass: u32) -> Option<usize> {
        (pass != 0).then(|| 1 - Self::write_slot(pass))
    }
}

impl BlurStrategy for SeparablePixelBlur {
    fn kind(&self) -> BlurStrategyKind {
        BlurStrategyKind::SeparablePixel
    }

    fn execute(&self, ctx: &mut BlurContext<'_>) -> Result<TextureId> {
        let pass_count = 2 * ctx.settings.pass_pairs();
        for pass in 0..pass_count {
            let write = Self::write_slot(pass);
            let read = match Self::read_slot(pass) {
                Some(slot) => self.textures[slot],
                None => ctx.source,
            };
            let shader_id = if write == 0 { self.blur_horizontal } else { self.blur_vertical };

            let shader = pass_shader(ctx.shaders, shader_id)?;
            shader.bind(ctx.cmd)?;
            ctx.cmd.bind_render_targets(&[self.targets[write]])?;
            shader.set_constant("textureWidth", &(self.width as i32));
            shader.set_constant("textureHeight", &(self.height as i32));
            shader.set_texture(ctx.cmd, "InputTexture", read)?;
            shader.set_sampler(ctx.cmd, "BlurSampler", self.sampler)?;
            shader.update_constants(ctx.cmd)?;
            ctx.cmd.draw(3, 0)?;
        }
        Ok(self.output_texture())
    }

    /// Always ping-pong slot 0, which also serves as the "no blur" fallback
    /// when the strength is zero
    fn output_texture(&self) -> TextureId {
        self.textures[0]
    }
}
