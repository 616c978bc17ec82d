use std::path::PathBuf;

use clap::{Args, Parser};
use gallery::LoadStrategy;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "fxgallery",
    author,
    version,
    about = "Cycle GLSL effects over an image or a textured cube"
)]
pub struct Cli {
    /// Root directory that relative image and shader paths resolve against.
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Base image the effects are applied to.
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Initial window size (e.g. `960x720`).
    #[arg(short = 'r', long, value_name = "WIDTHxHEIGHT", value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Newline-delimited list of extra effect files to append to the built-ins.
    #[arg(long, value_name = "FILE")]
    pub shader_index: Option<PathBuf>,

    /// Directory the shader index entries live in.
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Effect loading strategy: `incremental` (one per frame) or `eager`.
    #[arg(long, value_name = "MODE", value_parser = parse_load_strategy)]
    pub load: Option<LoadStrategy>,

    /// Apply effects to a textured cube instead of the flat image.
    #[arg(long)]
    pub cube: bool,

    /// Fragment source compiled into the custom slot once loading finishes.
    #[arg(long, value_name = "FRAG")]
    pub custom: Option<PathBuf>,

    /// Where `P` screenshots are written.
    #[arg(long, value_name = "DIR")]
    pub capture_dir: Option<PathBuf>,

    /// Settings file; defaults to `fxgallery/settings.toml` in the user config directory.
    #[arg(long, value_name = "FILE", env = "FXGALLERY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log filter (e.g. `debug` or `gallery=trace`); `RUST_LOG` is used when absent.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Present without waiting for vblank.
    #[arg(long)]
    pub no_vsync: bool,

    /// Print the merged settings as TOML and exit without opening a window.
    #[arg(long)]
    pub print_settings: bool,

    #[command(flatten)]
    pub uniforms: UniformArgs,
}

/// Initial values for the tunable uniforms. Out-of-range values are clamped.
#[derive(Args, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformArgs {
    /// Animation speed multiplier (0-10).
    #[arg(long, value_name = "X")]
    pub speed: Option<f32>,

    /// Effect amplitude (0-10).
    #[arg(long, value_name = "X")]
    pub amplitude: Option<f32>,

    /// Effect frequency (0-10).
    #[arg(long, value_name = "X")]
    pub frequency: Option<f32>,

    /// Brightness multiplier (0-3).
    #[arg(long, value_name = "X")]
    pub brightness: Option<f32>,

    /// Contrast multiplier (0-3).
    #[arg(long, value_name = "X")]
    pub contrast: Option<f32>,

    /// Saturation multiplier (0-3).
    #[arg(long, value_name = "X")]
    pub saturation: Option<f32>,

    /// Hue rotation in radians.
    #[arg(long, value_name = "RADIANS", allow_negative_numbers = true)]
    pub hue: Option<f32>,

    /// Zoom factor (0.1-10).
    #[arg(long, value_name = "X")]
    pub zoom: Option<f32>,

    /// Image rotation in radians.
    #[arg(long, value_name = "RADIANS", allow_negative_numbers = true)]
    pub rotation: Option<f32>,

    /// Quality hint for effects that loop (0.1-4).
    #[arg(long, value_name = "X")]
    pub quality: Option<f32>,

    /// Turn on the effects' debug visualisation.
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_resolution(value: &str) -> Result<Resolution, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("resolution must not be empty".to_string());
    }
    let (w, h) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid resolution '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("resolution must be greater than zero".to_string());
    }
    Ok(Resolution { width, height })
}

pub fn parse_load_strategy(value: &str) -> Result<LoadStrategy, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("load mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "incremental" | "async" | "lazy" => Ok(LoadStrategy::Incremental),
        "eager" | "sync" | "all" => Ok(LoadStrategy::Eager),
        other => Err(format!(
            "unknown load mode '{other}'; expected incremental or eager"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolutions() {
        assert_eq!(
            parse_resolution("1280x720").unwrap(),
            Resolution {
                width: 1280,
                height: 720
            }
        );
        assert_eq!(parse_resolution(" 640 X 480 ").unwrap().height, 480);
        assert!(parse_resolution("0x720").is_err());
        assert!(parse_resolution("1280").is_err());
        assert!(parse_resolution("").is_err());
        assert!(parse_resolution("widexhigh").is_err());
    }

    #[test]
    fn parses_load_strategies() {
        assert_eq!(parse_load_strategy("Eager").unwrap(), LoadStrategy::Eager);
        assert_eq!(
            parse_load_strategy("incremental").unwrap(),
            LoadStrategy::Incremental
        );
        assert!(parse_load_strategy("sometimes").is_err());
    }

    #[test]
    fn cli_accepts_full_flag_set() {
        let cli = Cli::try_parse_from([
            "fxgallery",
            "--assets",
            "/srv/fx",
            "-r",
            "800x600",
            "--load",
            "eager",
            "--cube",
            "--speed",
            "2.5",
            "--hue",
            "-1.0",
        ])
        .unwrap();
        assert_eq!(cli.assets, Some(PathBuf::from("/srv/fx")));
        assert_eq!(
            cli.resolution,
            Some(Resolution {
                width: 800,
                height: 600
            })
        );
        assert_eq!(cli.load, Some(LoadStrategy::Eager));
        assert!(cli.cube);
        assert_eq!(cli.uniforms.speed, Some(2.5));
        assert_eq!(cli.uniforms.hue, Some(-1.0));
    }

    #[test]
    fn cli_rejects_bad_resolution() {
        assert!(Cli::try_parse_from(["fxgallery", "--resolution", "big"]).is_err());
    }
}
