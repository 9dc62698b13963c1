use dither_engine::{DitherParams, ToneAdjustment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file used when neither `--config` nor `DITHERLAB_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "ditherlab.yaml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "DITHERLAB_CONFIG";

/// Default longer-edge budget for the working resolution.
pub const DEFAULT_WORKING_RESOLUTION: u32 = 1024;

/// Application configuration loaded from ditherlab.yaml
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Longer-edge pixel budget used by preview and export
    #[serde(default = "default_working_resolution")]
    pub working_resolution: u32,

    /// Preset used when none is requested
    #[serde(default)]
    pub default_preset: Option<String>,

    /// Named parameter sets
    #[serde(default)]
    pub presets: HashMap<String, PresetConfig>,
}

fn default_working_resolution() -> u32 {
    DEFAULT_WORKING_RESOLUTION
}

/// A named set of dither, tone and export parameters.
///
/// Dither parameters sit at the top level of the preset; `tone` and
/// `pre_blur` sit next to them.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PresetConfig {
    #[serde(flatten)]
    pub params: DitherParams,

    /// Tone adjustment applied before dithering
    #[serde(default)]
    pub tone: ToneAdjustment,

    /// Gaussian sigma applied to the working buffer during export (0 = off)
    #[serde(default)]
    pub pre_blur: f32,
}

impl AppConfig {
    /// Config path from an explicit flag, then the environment, then the default.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content, path)?;
        tracing::info!(
            path = %path.display(),
            presets = config.presets.len(),
            working_resolution = config.working_resolution,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(%e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve a preset by name, or the default preset when `name` is `None`.
    ///
    /// A requested name that is not configured is an error. With no name and
    /// no `default_preset`, built-in defaults are returned.
    pub fn preset(&self, name: Option<&str>) -> Result<PresetConfig, ConfigError> {
        match name.or(self.default_preset.as_deref()) {
            Some(name) => self
                .presets
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownPreset(name.to_string())),
            None => Ok(PresetConfig::default()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            working_resolution: DEFAULT_WORKING_RESOLUTION,
            default_preset: None,
            presets: HashMap::new(),
        }
    }
}
