/// Scene settings files

pub mod scene_settings;

pub use scene_settings::*;
