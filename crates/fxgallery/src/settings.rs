use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use directories_next::ProjectDirs;
use gallery::{LoadStrategy, Tunable, UniformState};
use renderer::SurfaceOptions;
use serde::{Deserialize, Serialize};

use crate::cli::{parse_load_strategy, Cli, UniformArgs};

pub const ENV_CONFIG_DIR: &str = "FXGALLERY_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "fxgallery";
const APPLICATION: &str = "fxgallery";

/// Persistent launch settings. Every field has a default, so a partial file
/// (or none at all) is valid; command-line flags override what is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub assets: PathBuf,
    pub image: PathBuf,
    pub width: u32,
    pub height: u32,
    pub load: String,
    pub cube: bool,
    pub shader_dir: Option<PathBuf>,
    pub shader_index: Option<PathBuf>,
    pub capture_dir: Option<PathBuf>,
    pub vsync: bool,
    pub high_performance: bool,
    pub uniforms: UniformArgs,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("."),
            image: PathBuf::from("data/logo.png"),
            width: 960,
            height: 720,
            load: "incremental".to_string(),
            cube: false,
            shader_dir: None,
            shader_index: None,
            capture_dir: None,
            vsync: true,
            high_performance: false,
            uniforms: UniformArgs::default(),
        }
    }
}

/// Fully resolved paths and options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    pub image: PathBuf,
    pub canvas: (u32, u32),
    pub strategy: LoadStrategy,
    pub cube: bool,
    pub shader_dir: PathBuf,
    pub shader_index: PathBuf,
    pub capture_dir: PathBuf,
    pub custom: Option<PathBuf>,
    pub surface: SurfaceOptions,
    pub uniforms: UniformArgs,
}

impl Settings {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file at {}", path.display()))?;
            let settings: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse settings file at {}", path.display()))?;
            Ok(settings)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings to TOML")
    }

    /// Overlays the flags that were given on the command line.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(assets) = &cli.assets {
            self.assets = assets.clone();
        }
        if let Some(image) = &cli.image {
            self.image = image.clone();
        }
        if let Some(resolution) = cli.resolution {
            self.width = resolution.width;
            self.height = resolution.height;
        }
        if let Some(strategy) = cli.load {
            self.load = strategy_name(strategy).to_string();
        }
        if cli.cube {
            self.cube = true;
        }
        if let Some(dir) = &cli.shader_dir {
            self.shader_dir = Some(dir.clone());
        }
        if let Some(index) = &cli.shader_index {
            self.shader_index = Some(index.clone());
        }
        if let Some(dir) = &cli.capture_dir {
            self.capture_dir = Some(dir.clone());
        }
        if cli.no_vsync {
            self.vsync = false;
        }
        self.uniforms.merge(&cli.uniforms);
    }

    /// Resolves relative paths against `assets` and validates the rest.
    pub fn launch(&self, custom: Option<PathBuf>) -> Result<Launch> {
        if self.width == 0 || self.height == 0 {
            bail!(
                "window size must be greater than zero (got {}x{})",
                self.width,
                self.height
            );
        }
        let strategy = parse_load_strategy(&self.load).map_err(|err| anyhow!(err))?;

        let shader_dir = match &self.shader_dir {
            Some(dir) => self.resolve(dir),
            None => self.assets.join("shaders"),
        };
        let shader_index = match &self.shader_index {
            Some(index) => self.resolve(index),
            None => shader_dir.join("index.txt"),
        };
        let capture_dir = match &self.capture_dir {
            Some(dir) => self.resolve(dir),
            None => self.assets.join("captures"),
        };

        Ok(Launch {
            image: self.resolve(&self.image),
            canvas: (self.width, self.height),
            strategy,
            cube: self.cube,
            shader_dir,
            shader_index,
            capture_dir,
            custom,
            surface: SurfaceOptions {
                high_performance: self.high_performance,
                vsync: self.vsync,
            },
            uniforms: self.uniforms.clone(),
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets.join(path)
        }
    }
}

impl UniformArgs {
    /// Takes every value `other` sets, keeping ours otherwise.
    pub fn merge(&mut self, other: &UniformArgs) {
        for tunable in Tunable::ALL {
            if let Some(value) = other.value(tunable) {
                *self.slot(tunable) = Some(value);
            }
        }
        self.debug |= other.debug;
    }

    pub fn apply(&self, state: &mut UniformState) {
        for tunable in Tunable::ALL {
            if let Some(value) = self.value(tunable) {
                if !state.set(tunable, value) {
                    tracing::warn!(uniform = tunable.name(), value, "ignoring non-finite value");
                }
            }
        }
        if self.debug {
            state.set_debug(true);
        }
    }

    fn value(&self, tunable: Tunable) -> Option<f32> {
        match tunable {
            Tunable::Speed => self.speed,
            Tunable::Amplitude => self.amplitude,
            Tunable::Frequency => self.frequency,
            Tunable::Brightness => self.brightness,
            Tunable::Contrast => self.contrast,
            Tunable::Saturation => self.saturation,
            Tunable::HueShift => self.hue,
            Tunable::Zoom => self.zoom,
            Tunable::Rotation => self.rotation,
            Tunable::Quality => self.quality,
        }
    }

    fn slot(&mut self, tunable: Tunable) -> &mut Option<f32> {
        match tunable {
            Tunable::Speed => &mut self.speed,
            Tunable::Amplitude => &mut self.amplitude,
            Tunable::Frequency => &mut self.frequency,
            Tunable::Brightness => &mut self.brightness,
            Tunable::Contrast => &mut self.contrast,
            Tunable::Saturation => &mut self.saturation,
            Tunable::HueShift => &mut self.hue,
            Tunable::Zoom => &mut self.zoom,
            Tunable::Rotation => &mut self.rotation,
            Tunable::Quality => &mut self.quality,
        }
    }
}

pub fn strategy_name(strategy: LoadStrategy) -> &'static str {
    match strategy {
        LoadStrategy::Eager => "eager",
        LoadStrategy::Incremental => "incremental",
    }
}

/// `$FXGALLERY_CONFIG_DIR/settings.toml`, or the platform config directory.
pub fn default_settings_path() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(ENV_CONFIG_DIR) {
        return Ok(PathBuf::from(dir).join("settings.toml"));
    }
    let dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(dirs.config_dir().join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "assets = \"/srv/fx\"\nload = \"eager\"\n\n[uniforms]\nspeed = 2.0\n",
        )
        .unwrap();

        let settings = Settings::load_or_default(&path).unwrap();
        assert_eq!(settings.assets, PathBuf::from("/srv/fx"));
        assert_eq!(settings.load, "eager");
        assert_eq!(settings.uniforms.speed, Some(2.0));
        assert_eq!(settings.width, 960);
        assert!(settings.vsync);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "width = \"wide\"").unwrap();
        let err = Settings::load_or_default(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse settings file"));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut settings = Settings {
            width: 640,
            height: 480,
            uniforms: UniformArgs {
                speed: Some(3.0),
                zoom: Some(2.0),
                ..UniformArgs::default()
            },
            ..Settings::default()
        };
        let cli = Cli::try_parse_from([
            "fxgallery",
            "-r",
            "1024x768",
            "--load",
            "eager",
            "--speed",
            "5",
            "--no-vsync",
        ])
        .unwrap();
        settings.merge_cli(&cli);

        assert_eq!((settings.width, settings.height), (1024, 768));
        assert_eq!(settings.load, "eager");
        assert_eq!(settings.uniforms.speed, Some(5.0));
        assert_eq!(settings.uniforms.zoom, Some(2.0));
        assert!(!settings.vsync);
    }

    #[test]
    fn launch_resolves_paths_against_assets() {
        let settings = Settings {
            assets: PathBuf::from("/srv/fx"),
            capture_dir: Some(PathBuf::from("/tmp/shots")),
            ..Settings::default()
        };
        let launch = settings.launch(None).unwrap();
        assert_eq!(launch.image, PathBuf::from("/srv/fx/data/logo.png"));
        assert_eq!(launch.shader_dir, PathBuf::from("/srv/fx/shaders"));
        assert_eq!(launch.shader_index, PathBuf::from("/srv/fx/shaders/index.txt"));
        assert_eq!(launch.capture_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(launch.strategy, LoadStrategy::Incremental);
        assert_eq!(launch.canvas, (960, 720));
    }

    #[test]
    fn launch_rejects_bad_values() {
        let zero = Settings {
            width: 0,
            ..Settings::default()
        };
        assert!(zero.launch(None).is_err());

        let unknown = Settings {
            load: "whenever".to_string(),
            ..Settings::default()
        };
        assert!(unknown.launch(None).is_err());
    }

    #[test]
    fn overrides_are_clamped_when_applied() {
        let overrides = UniformArgs {
            speed: Some(50.0),
            brightness: Some(0.5),
            debug: true,
            ..UniformArgs::default()
        };
        let mut state = UniformState::default();
        overrides.apply(&mut state);
        assert_eq!(state.speed(), 10.0);
        assert_eq!(state.brightness(), 0.5);
        assert_eq!(state.zoom(), 1.0);
        assert!(state.debug());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings {
            cube: true,
            uniforms: UniformArgs {
                hue: Some(1.5),
                ..UniformArgs::default()
            },
            ..Settings::default()
        };
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
