use std::path::Path;
use std::time::Duration;

use rodio::Sink;
use tracing::{debug, error, info};

use crate::command::GainCommand;
use crate::error::{LoadError, MixerInitError};
use crate::handle::{HandleStatus, PlaybackHandle};
use crate::system::ramp::FadeCurve;
use crate::system::sound::{RampedSource, SoundAsset};
use crate::system::AudioSubsystem;

pub const DEFAULT_FADE: Duration = Duration::from_millis(1000);
pub const DEFAULT_DECLICK: Duration = Duration::from_millis(15);

/// Clamp a requested volume into [0.0, 1.0]. NaN counts as silence.
pub fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Length of the fade-in on resume and the fade-out on pause.
    pub fade_duration: Duration,
    pub fade_curve: FadeCurve,
    /// Shortest ramp used for volume changes and for cutting a superseded playback.
    pub declick: Duration,
    /// Volume before the first `set_volume` call.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fade_duration: DEFAULT_FADE,
            fade_curve: FadeCurve::Linear,
            declick: DEFAULT_DECLICK,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing has been played yet.
    Stopped,
    Playing,
    /// Fade-out in progress.
    Pausing,
    /// Faded out and released.
    Idle,
}

/// Plays one sound asset in a seamless infinite loop with fade-in on resume, fade-out on pause
/// and live volume control.
///
/// Calls never block on the audio thread: they post gain commands that the audio thread picks
/// up on its next frame. The controller expects a single owner (the front end's event loop).
pub struct PlaybackController {
    output: Option<Sink>,
    asset: Option<SoundAsset>,
    handle: Option<PlaybackHandle>,
    volume: f32,
    settings: PlaybackSettings,
    starts: u64,
}

impl PlaybackController {
    /// Controller playing into `output`.
    pub fn new(output: Sink, settings: PlaybackSettings) -> Self {
        Self::with_output(Some(output), settings)
    }

    /// Controller on a fresh channel of the audio subsystem.
    pub fn open(
        subsystem: &AudioSubsystem,
        settings: PlaybackSettings,
    ) -> Result<Self, MixerInitError> {
        Ok(Self::new(subsystem.open_channel()?, settings))
    }

    /// Controller without any audio output, for when the mixer failed to initialize. Loading
    /// fails with [`LoadError::NoOutput`] and every other call is a no-op.
    pub fn silent(settings: PlaybackSettings) -> Self {
        Self::with_output(None, settings)
    }

    fn with_output(output: Option<Sink>, settings: PlaybackSettings) -> Self {
        Self {
            output,
            asset: None,
            handle: None,
            volume: clamp_volume(settings.volume),
            settings,
            starts: 0,
        }
    }

    /// Decode the sound at `path` and start playing it. A playback of a previously loaded
    /// sound is cut short. The error is logged here; callers need not report it again.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        if self.output.is_none() {
            error!(path = %path.display(), "cannot load sound: no audio output");
            return Err(LoadError::NoOutput);
        }

        let asset = match SoundAsset::open(path) {
            Ok(asset) => asset,
            Err(e) => {
                error!("failed to load sound: {}", e);
                return Err(e);
            }
        };
        info!(
            path = %path.display(),
            channels = asset.channels(),
            sample_rate = asset.sample_rate(),
            period_ms = asset.period().as_millis() as u64,
            "sound loaded"
        );

        self.asset = Some(asset);
        self.supersede();
        self.start();
        Ok(())
    }

    /// Start or continue playback with a fade-in. No-op while playing or before a sound is
    /// loaded.
    pub fn resume(&mut self) {
        if self.asset.is_none() {
            debug!("resume ignored: no sound loaded");
            return;
        }
        if let Some(handle) = &self.handle {
            match handle.status() {
                HandleStatus::Active => {
                    debug!("resume ignored: already playing");
                    return;
                }
                HandleStatus::Releasing => {
                    let reached = handle.gain();
                    if handle.revive(self.fade_to(self.volume)) {
                        debug!(handle = handle.id(), gain = reached, "fade-out cancelled");
                        return;
                    }
                }
                HandleStatus::Released => {}
            }
        }
        self.start();
    }

    /// Fade out and release the playback. No-op unless playing.
    pub fn pause(&mut self) {
        match &self.handle {
            Some(handle) if handle.release(self.fade_to(0.0)) => {
                debug!(handle = handle.id(), "fading out");
            }
            _ => debug!("pause ignored: not playing"),
        }
    }

    /// Set the volume for the live playback and any later one. Out-of-range levels are
    /// clamped.
    pub fn set_volume(&mut self, level: f32) {
        self.volume = clamp_volume(level);
        if let Some(handle) = &self.handle {
            handle.retarget(self.volume);
        }
        debug!(volume = self.volume, "volume set");
    }

    pub fn state(&self) -> PlaybackState {
        match &self.handle {
            None => PlaybackState::Stopped,
            Some(handle) => match handle.status() {
                HandleStatus::Active => PlaybackState::Playing,
                HandleStatus::Releasing => PlaybackState::Pausing,
                HandleStatus::Released => PlaybackState::Idle,
            },
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Gain last applied by the audio thread, 0.0 without a playback.
    pub fn current_gain(&self) -> f32 {
        self.handle.as_ref().map_or(0.0, PlaybackHandle::gain)
    }

    pub fn fade_duration(&self) -> Duration {
        self.settings.fade_duration
    }

    /// Applies from the next pause or resume.
    pub fn set_fade_duration(&mut self, duration: Duration) {
        self.settings.fade_duration = duration;
    }

    /// Number of loop-forever playback requests issued so far.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn is_loaded(&self) -> bool {
        self.asset.is_some()
    }

    pub fn asset(&self) -> Option<&SoundAsset> {
        self.asset.as_ref()
    }

    fn fade_to(&self, target: f32) -> GainCommand {
        GainCommand::Fade {
            target,
            duration: self.settings.fade_duration,
        }
    }

    fn start(&mut self) {
        let (asset, output) = match (&self.asset, &self.output) {
            (Some(asset), Some(output)) => (asset, output),
            _ => return,
        };
        self.starts += 1;
        let handle = PlaybackHandle::new(self.starts, self.fade_to(self.volume));
        let source = RampedSource::new(
            asset.looped(),
            handle.channel(),
            self.settings.fade_curve,
            self.settings.declick,
        );
        output.append(source);
        info!(handle = handle.id(), volume = self.volume, "playback started");
        self.handle = Some(handle);
    }

    /// Quickly fade out the current playback so the next one follows without overlap.
    fn supersede(&mut self) {
        if let Some(handle) = self.handle.take() {
            let cut = GainCommand::Fade {
                target: 0.0,
                duration: self.settings.declick,
            };
            if handle.cut(cut) {
                debug!(handle = handle.id(), "playback superseded");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use rodio::queue::SourcesQueueOutput;
    use rodio::Sink;
    use tempfile::TempDir;

    use super::{clamp_volume, PlaybackController, PlaybackSettings, PlaybackState};
    use crate::error::LoadError;

    const RATE: u32 = 8000;
    // 10 ms loop at 8 kHz mono
    const LOOP_FRAMES: usize = 80;

    fn write_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(16000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn fixture() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.wav");
        write_wav(&path, LOOP_FRAMES);
        (dir, path)
    }

    fn settings() -> PlaybackSettings {
        PlaybackSettings {
            // 80 frames
            fade_duration: Duration::from_millis(10),
            // 8 frames
            declick: Duration::from_millis(1),
            ..PlaybackSettings::default()
        }
    }

    fn mock_controller() -> (PlaybackController, SourcesQueueOutput<f32>) {
        let (sink, output) = Sink::new_idle();
        (PlaybackController::new(sink, settings()), output)
    }

    /// Pull samples the way the output device would.
    fn pull(output: &mut SourcesQueueOutput<f32>, samples: usize) -> Vec<f32> {
        output.take(samples).collect()
    }

    fn handles(controller: &PlaybackController) -> usize {
        controller.output.as_ref().map_or(0, Sink::len)
    }

    #[test]
    fn load_starts_playing() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        assert_eq!(controller.state(), PlaybackState::Stopped);

        controller.load(&path).unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.is_loaded());
        assert_eq!(controller.starts(), 1);
        assert_eq!(handles(&controller), 1);

        pull(&mut output, 200);
        assert_eq!(controller.current_gain(), 1.0);
    }

    #[test]
    fn failed_load_stays_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, mut output) = mock_controller();

        let result = controller.load(dir.path().join("missing.wav"));
        assert!(matches!(result, Err(LoadError::NotFound(_))));
        assert_eq!(controller.state(), PlaybackState::Stopped);

        controller.resume();
        controller.pause();
        controller.set_volume(0.3);
        pull(&mut output, 100);
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert_eq!(controller.starts(), 0);
        assert_eq!(handles(&controller), 0);
        assert_eq!(controller.volume(), 0.3);
        assert_eq!(controller.current_gain(), 0.0);
    }

    #[test]
    fn silent_controller_cannot_load() {
        let (_dir, path) = fixture();
        let mut controller = PlaybackController::silent(settings());
        assert!(matches!(controller.load(&path), Err(LoadError::NoOutput)));
        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Stopped);
        assert!(!controller.is_loaded());
    }

    #[test]
    fn volume_is_clamped() {
        let (mut controller, _output) = mock_controller();
        let cases = [
            (-1.0, 0.0),
            (0.0, 0.0),
            (0.3, 0.3),
            (1.0, 1.0),
            (7.5, 1.0),
            (f32::INFINITY, 1.0),
            (f32::NEG_INFINITY, 0.0),
            (f32::NAN, 0.0),
        ];
        for (input, expected) in cases {
            controller.set_volume(input);
            assert_eq!(controller.volume(), expected, "input {}", input);
            assert_eq!(clamp_volume(input), expected);
        }
    }

    #[test]
    fn initial_volume_from_settings_is_clamped() {
        let (sink, _output) = Sink::new_idle();
        let controller = PlaybackController::new(
            sink,
            PlaybackSettings {
                volume: 3.0,
                ..settings()
            },
        );
        assert_eq!(controller.volume(), 1.0);
    }

    #[test]
    fn resume_is_idempotent() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();

        controller.resume();
        pull(&mut output, 40);
        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.starts(), 1);
        assert_eq!(handles(&controller), 1);
    }

    #[test]
    fn pause_fades_out_then_idles() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);

        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Pausing);
        let tail = pull(&mut output, 40);
        assert!(tail.windows(2).all(|w| w[1] <= w[0]));
        assert!(controller.current_gain() > 0.0 && controller.current_gain() < 1.0);

        pull(&mut output, 200);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(handles(&controller), 0);

        // pausing while idle does nothing
        controller.pause();
        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(handles(&controller), 0);
        assert_eq!(controller.starts(), 1);
    }

    #[test]
    fn pause_during_fade_in() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();

        // a quarter of the way into the fade-in
        pull(&mut output, 20);
        assert!((controller.current_gain() - 0.25).abs() < 1e-6);
        assert_eq!(controller.state(), PlaybackState::Playing);

        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Pausing);
        let tail = pull(&mut output, 80);
        assert!(tail.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(tail.last(), Some(&0.0));

        pull(&mut output, 200);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.current_gain(), 0.0);
        assert_eq!(handles(&controller), 0);
    }

    #[test]
    fn resume_during_fade_out_reuses_handle() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);

        controller.pause();
        pull(&mut output, 40);
        let reached = controller.current_gain();
        assert!(reached > 0.0 && reached < 1.0);

        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Playing);
        pull(&mut output, 1);
        let gain = controller.current_gain();
        assert!(gain > reached && gain < 1.0, "{} after {}", gain, reached);

        pull(&mut output, 200);
        assert_eq!(controller.current_gain(), 1.0);
        assert_eq!(controller.starts(), 1);
        assert_eq!(handles(&controller), 1);
    }

    #[test]
    fn resume_after_idle_starts_new_playback() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);
        controller.pause();
        pull(&mut output, 200);
        assert_eq!(controller.state(), PlaybackState::Idle);

        controller.set_volume(0.4);
        controller.resume();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.starts(), 2);
        // the idle queue plays up to 441 samples of keep-alive silence before the new playback
        pull(&mut output, 1000);
        assert!((controller.current_gain() - 0.4).abs() < 1e-6);
        assert_eq!(handles(&controller), 1);
    }

    #[test]
    fn set_volume_retargets_live_playback() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);

        controller.set_volume(0.25);
        pull(&mut output, 50);
        assert!((controller.current_gain() - 0.25).abs() < 1e-6);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.starts(), 1);
    }

    #[test]
    fn set_volume_during_fade_out_keeps_fading() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);

        controller.pause();
        controller.set_volume(0.8);
        pull(&mut output, 200);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.volume(), 0.8);
    }

    #[test]
    fn loop_is_requested_once() {
        let (_dir, path) = fixture();
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();

        // well past the fade-in, then twenty loop periods
        pull(&mut output, 200);
        let looped = pull(&mut output, LOOP_FRAMES * 20);
        assert_eq!(controller.starts(), 1);
        assert_eq!(handles(&controller), 1);

        // constant input: any gap at a loop boundary would show up as a differing sample
        let level = looped[0];
        assert!(level > 0.0);
        assert!(looped.iter().all(|s| (s - level).abs() < 1e-6));
    }

    #[test]
    fn reload_supersedes_previous_playback() {
        let (dir, path) = fixture();
        let other = dir.path().join("storm.wav");
        write_wav(&other, LOOP_FRAMES * 2);
        let (mut controller, mut output) = mock_controller();
        controller.load(&path).unwrap();
        pull(&mut output, 200);

        controller.load(&other).unwrap();
        assert_eq!(controller.starts(), 2);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.asset().unwrap().path(), other.as_path());

        pull(&mut output, 200);
        assert_eq!(handles(&controller), 1);
    }

    #[test]
    fn fade_duration_can_change() {
        let (mut controller, _output) = mock_controller();
        assert_eq!(controller.fade_duration(), Duration::from_millis(10));
        controller.set_fade_duration(Duration::from_millis(250));
        assert_eq!(controller.fade_duration(), Duration::from_millis(250));
    }
}
