/// Render passes built on shader objects

pub mod bloom_settings;
pub mod blur_strategy;
pub mod separable_pixel_blur;
pub mod compute_blur;
pub mod compute_transpose_blur;
pub mod bloom_pass;

pub use bloom_settings::*;
pub use blur_strategy::{BlurContext, BlurStrategy, BlurStrategyKind};
pub use separable_pixel_blur::*;
pub use compute_blur::{BlurAxis, ComputeBlur, ComputeBlurParams, MAX_THREAD_GROUP_SIZE};
pub use compute_transpose_blur::*;
pub use bloom_pass::*;
