/// Line-oriented scene settings parser.
///
/// One command per line, tokens separated by whitespace. Lines starting with
/// `/` or `#` are comments. A malformed or unknown line is logged and skipped,
/// parsing always yields a `SceneSettings`.
///
/// ```text
/// // bloom <enabled> [threshold] [blurStrength]
/// bloom true 1.2 4
/// object begin
///     transform 0 1 0  0 45 0  2
///     brdf
///     brdf
/// object end
/// ```

use std::path::Path;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::render_passes::{BloomSettings, MAX_BLUR_STRENGTH};
use crate::{engine_error, engine_warn};

/// Material blocks declared inside objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Pbr,
    Brdf,
    Phong,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub near_plane: f32,
    pub far_plane: f32,
    /// Vertical field of view, degrees
    pub fov_v: f32,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Everything the engine reads from a scene settings file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneSettings {
    pub bloom: BloomSettings,
    pub cameras: Vec<CameraSettings>,
    pub object_count: u32,
    pub light_count: u32,
    /// Material kinds in declaration order
    pub materials: Vec<MaterialKind>,
}

/// Block state carried from one line to the next
#[derive(Debug, Clone, Default)]
pub struct ParserContext {
    pub reading_object: bool,
    pub reading_light: bool,
    pub reading_material: Option<MaterialKind>,
    /// 1-based line being parsed
    pub line: usize,
}

/// `true/false`, `yes/no`, `1/0`, case-insensitive
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse settings text
pub fn parse_scene_settings(text: &str) -> SceneSettings {
    let mut ctx = ParserContext::default();
    let mut settings = SceneSettings::default();

    for (index, raw) in text.lines().enumerate() {
        ctx.line = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('/') || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Err(e) = parse_command(&mut ctx, &tokens, &mut settings) {
            engine_error!("nova3d::SceneSettings", "Line {}: {}", ctx.line, e);
        }
    }

    if ctx.reading_object {
        engine_warn!("nova3d::SceneSettings", "Missing \"object end\" at end of file");
    }
    if ctx.reading_light {
        engine_warn!("nova3d::SceneSettings", "Missing \"light end\" at end of file");
    }
    settings
}

/// Read and parse a settings file
///
/// # Errors
///
/// Returns `FileNotFound` if the file cannot be read. Content errors are
/// logged, never returned.
pub fn load_scene_settings(path: &Path) -> Result<SceneSettings> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Ok(parse_scene_settings(&text))
}

/// Apply one tokenized line
pub fn parse_command(ctx: &mut ParserContext, tokens: &[&str], settings: &mut SceneSettings) -> Result<()> {
    let Some((&command, args)) = tokens.split_first() else {
        return Ok(());
    };

    match command.to_ascii_lowercase().as_str() {
        "bloom" => parse_bloom(args, &mut settings.bloom),
        "camera" => {
            settings.cameras.push(parse_camera(args)?);
            Ok(())
        }
        "object" => match block_argument("object", args)?.as_str() {
            "begin" => {
                if ctx.reading_object {
                    return Err(parse_error("expecting \"object end\" before a new object"));
                }
                ctx.reading_object = true;
                Ok(())
            }
            "end" => {
                if !ctx.reading_object {
                    return Err(parse_error("expecting \"object begin\" before \"object end\""));
                }
                ctx.reading_object = false;
                ctx.reading_material = None;
                settings.object_count += 1;
                Ok(())
            }
            other => Err(parse_error(format!("object expects begin/end, got '{}'", other))),
        },
        "light" => match block_argument("light", args)?.as_str() {
            "begin" => {
                if ctx.reading_light {
                    return Err(parse_error("expecting \"light end\" before a new light"));
                }
                ctx.reading_light = true;
                Ok(())
            }
            "end" => {
                if !ctx.reading_light {
                    return Err(parse_error("expecting \"light begin\" before \"light end\""));
                }
                ctx.reading_light = false;
                settings.light_count += 1;
                Ok(())
            }
            other => Err(parse_error(format!("light expects begin/end, got '{}'", other))),
        },
        "pbr" => {
            require_object(ctx, "pbr")?;
            match block_argument("pbr", args)?.as_str() {
                "begin" => {
                    ctx.reading_material = Some(MaterialKind::Pbr);
                    settings.materials.push(MaterialKind::Pbr);
                }
                "end" => ctx.reading_material = None,
                // preset directory
                _ => settings.materials.push(MaterialKind::Pbr),
            }
            Ok(())
        }
        "brdf" => toggle_material(ctx, settings, MaterialKind::Brdf),
        "phong" | "blinnphong" => toggle_material(ctx, settings, MaterialKind::Phong),
        "transform" => {
            if !ctx.reading_object && !ctx.reading_light {
                return Err(parse_error("transform outside of an object or light block"));
            }
            if args.len() != 7 && args.len() != 9 {
                return Err(parse_error(format!("transform expects 7 or 9 values, got {}", args.len())));
            }
            parse_floats(args)?;
            Ok(())
        }
        other => Err(parse_error(format!("Unknown command \"{}\"", other))),
    }
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::ParseFailed(message.into())
}

fn block_argument(command: &str, args: &[&str]) -> Result<String> {
    args.first()
        .map(|a| a.to_ascii_lowercase())
        .ok_or_else(|| parse_error(format!("{} expects an argument", command)))
}

fn require_object(ctx: &ParserContext, command: &str) -> Result<()> {
    if ctx.reading_object {
        Ok(())
    } else {
        Err(parse_error(format!("{} material outside of an object block", command)))
    }
}

/// `brdf` / `phong` open a material block, the same keyword closes it
fn toggle_material(ctx: &mut ParserContext, settings: &mut SceneSettings, kind: MaterialKind) -> Result<()> {
    require_object(ctx, if kind == MaterialKind::Brdf { "brdf" } else { "phong" })?;
    match ctx.reading_material {
        Some(open) if open == kind => {
            ctx.reading_material = None;
            Ok(())
        }
        Some(open) => Err(parse_error(format!("already defining a {:?} material", open))),
        None => {
            ctx.reading_material = Some(kind);
            settings.materials.push(kind);
            Ok(())
        }
    }
}

fn parse_floats(args: &[&str]) -> Result<Vec<f32>> {
    args.iter()
        .map(|a| a.parse::<f32>().map_err(|_| parse_error(format!("'{}' is not a number", a))))
        .collect()
}

/// `bloom <enabled> [threshold=1.5] [blurStrength=3]`
///
/// Nothing is written unless every present value parses.
fn parse_bloom(args: &[&str], bloom: &mut BloomSettings) -> Result<()> {
    let enabled_token = args.first().ok_or_else(|| parse_error("bloom expects an enabled flag"))?;
    let enabled = parse_bool(enabled_token)
        .ok_or_else(|| parse_error(format!("'{}' is not a boolean", enabled_token)))?;

    let defaults = BloomSettings::default();
    let brightness_threshold = match args.get(1) {
        Some(t) => t.parse::<f32>().map_err(|_| parse_error(format!("'{}' is not a threshold", t)))?,
        None => defaults.brightness_threshold,
    };
    let blur_strength = match args.get(2) {
        Some(t) => t.parse::<u32>().map_err(|_| parse_error(format!("'{}' is not a blur strength", t)))?,
        None => defaults.blur_strength,
    };
    if blur_strength > MAX_BLUR_STRENGTH {
        return Err(parse_error(format!(
            "blur strength {} exceeds {}",
            blur_strength, MAX_BLUR_STRENGTH
        )));
    }

    *bloom = BloomSettings { enabled, brightness_threshold, blur_strength };
    Ok(())
}

/// `camera near far fovV x y z yaw pitch`
fn parse_camera(args: &[&str]) -> Result<CameraSettings> {
    if args.len() != 8 {
        return Err(parse_error(format!("camera expects 8 values, got {}", args.len())));
    }
    let v = parse_floats(args)?;
    Ok(CameraSettings {
        near_plane: v[0],
        far_plane: v[1],
        fov_v: v[2],
        position: Vec3::new(v[3], v[4], v[5]),
        yaw: v[6],
        pitch: v[7],
    })
}

#[cfg(test)]
#[path = "scene_settings_tests.rs"]
mod tests;
