//! Seamlessly looping ambient sound with fade-in/fade-out transitions and live volume control.
//!
//! [`AudioSubsystem`] owns the output stream, [`PlaybackController`] plays one [`SoundAsset`]
//! on a channel of it and is driven by the front end through `resume`, `pause` and
//! `set_volume`.

pub mod command;
pub mod config;
pub mod control;
pub mod controller;
pub mod error;
pub mod handle;
pub mod resource;
pub mod system;

pub use controller::{PlaybackController, PlaybackSettings, PlaybackState};
pub use error::{ConfigError, LoadError, MixerInitError};
pub use handle::{HandleStatus, PlaybackHandle};
pub use system::ramp::FadeCurve;
pub use system::sound::SoundAsset;
pub use system::AudioSubsystem;
