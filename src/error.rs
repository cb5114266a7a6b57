use std::io;
use std::path::PathBuf;

use rodio::{PlayError, StreamError};
use thiserror::Error;

/// Failure to bring up the audio output. Non-fatal: the front end keeps running with a silent
/// controller.
#[derive(Error, Debug)]
pub enum MixerInitError {
    #[error("failed to open default output stream: {0}")]
    Stream(#[from] StreamError),
    #[error("failed to open mixing channel: {0}")]
    Channel(#[from] PlayError),
    #[error("failed to spawn audio thread: {0}")]
    Thread(#[source] io::Error),
    #[error("audio thread exited before reporting readiness")]
    ThreadExited,
}

/// Failure to load the sound asset.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("sound file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("cannot decode {}: {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no audio output available")]
    NoOutput,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Unparseable line on the control front end.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControlParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("volume must be a whole number from 0 to 100, got '{0}'")]
    BadVolume(String),
}
