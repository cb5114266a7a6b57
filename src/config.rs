use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::controller::{PlaybackSettings, DEFAULT_DECLICK, DEFAULT_FADE};
use crate::error::ConfigError;
use crate::resource::default_sound_path;
use crate::system::ramp::FadeCurve;

/// Contents of the TOML configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Sound to loop, relative to the install base unless absolute.
    pub asset: PathBuf,
    /// Starting volume, 0.0 to 1.0.
    pub volume: f32,
    pub fade_ms: u64,
    pub fade_curve: FadeCurve,
    pub declick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            asset: default_sound_path(),
            volume: 1.0,
            fade_ms: DEFAULT_FADE.as_millis() as u64,
            fade_curve: FadeCurve::Linear,
            declick_ms: DEFAULT_DECLICK.as_millis() as u64,
        }
    }
}

impl PlaybackConfig {
    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            fade_duration: Duration::from_millis(self.fade_ms),
            fade_curve: self.fade_curve,
            declick: Duration::from_millis(self.declick_ms),
            volume: self.volume,
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
