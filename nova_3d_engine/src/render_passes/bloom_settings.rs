/// Runtime bloom settings, supplied by the scene settings

/// Upper bound on blur pass pairs; larger strengths are clamped
pub const MAX_BLUR_STRENGTH: u32 = 64;

/// Bloom parameters read by the bloom pass every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Whether the engine runs the bloom pass at all
    pub enabled: bool,
    /// Luminance above which a pixel contributes to bloom
    pub brightness_threshold: f32,
    /// Number of horizontal + vertical blur pass pairs
    pub blur_strength: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            brightness_threshold: 1.5,
            blur_strength: 3,
        }
    }
}

impl BloomSettings {
    /// Blur pass pairs actually issued, `blur_strength` clamped to `MAX_BLUR_STRENGTH`
    pub fn pass_pairs(&self) -> u32 {
        self.blur_strength.min(MAX_BLUR_STRENGTH)
    }
}
