use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rodio::source::{Buffered, Repeat, SamplesConverter};
use rodio::{Decoder, Source};

use crate::command::GainCommand;
use crate::error::LoadError;
use crate::handle::{Channel, HandleStatus};
use crate::system::ramp::{frames_for, FadeCurve, GainRamp};

type DecodedSound = Buffered<Decoder<BufReader<File>>>;

/// The asset looped forever by a single request, as handed to a playback.
pub type LoopedSound = SamplesConverter<Repeat<DecodedSound>, f32>;

/// Immutable, fully decoded sound. Clones share the decoded frames.
#[derive(Clone)]
pub struct SoundAsset {
    path: PathBuf,
    source: DecodedSound,
    channels: u16,
    sample_rate: u32,
    samples: usize,
}

impl SoundAsset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| LoadError::DecodeFailure {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        if channels == 0 || sample_rate == 0 {
            return Err(LoadError::DecodeFailure {
                path: path.to_path_buf(),
                reason: format!("invalid format: {} channels at {} Hz", channels, sample_rate),
            });
        }

        let source = decoder.buffered();
        // Decode everything now so the loop never waits on the file.
        let samples = source.clone().count();
        if samples < channels as usize {
            return Err(LoadError::DecodeFailure {
                path: path.to_path_buf(),
                reason: "no audio frames".to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            source,
            channels,
            sample_rate,
            samples,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of one pass through the sound.
    pub fn period(&self) -> Duration {
        let frames = (self.samples / self.channels as usize) as u64;
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate as u64)
    }

    pub(crate) fn looped(&self) -> LoopedSound {
        self.source.clone().repeat_infinite().convert_samples()
    }
}

/// Audio-thread side of a playback: passes the input through, scaled by a per-frame gain
/// ramp driven by commands from the controller.
pub struct RampedSource<I> {
    input: I,
    channels: u16,
    sample_rate: u32,
    ramp: GainRamp,
    declick_frames: u64,
    channel: Arc<Channel>,
    frame_offset: u16,
    finished: bool,
}

impl<I> RampedSource<I>
where
    I: Source<Item = f32>,
{
    pub(crate) fn new(input: I, channel: Arc<Channel>, curve: FadeCurve, declick: Duration) -> Self {
        let channels = input.channels().max(1);
        let sample_rate = input.sample_rate().max(1);
        Self {
            ramp: GainRamp::new(channel.gain(), curve),
            declick_frames: frames_for(declick, sample_rate),
            input,
            channels,
            sample_rate,
            channel,
            frame_offset: 0,
            finished: false,
        }
    }

    fn apply(&mut self, command: GainCommand) {
        match command {
            GainCommand::Fade { target, duration } => {
                self.ramp.ramp_to(target, frames_for(duration, self.sample_rate))
            }
            GainCommand::Retarget { target } => self.ramp.retarget(target, self.declick_frames),
        }
    }

    /// Runs before the first sample of every frame. Returns false once the stream has to end.
    fn begin_frame(&mut self) -> bool {
        if let Some(command) = self.channel.try_take() {
            self.apply(command);
        }
        if self.ramp.is_settled()
            && self.ramp.gain() <= 0.0
            && self.channel.status() == HandleStatus::Releasing
            && self.channel.finish_release()
        {
            return false;
        }
        let gain = self.ramp.tick();
        self.channel.publish_gain(gain);
        true
    }
}

impl<I> Iterator for RampedSource<I>
where
    I: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.frame_offset == 0 && !self.begin_frame() {
            self.finished = true;
            return None;
        }
        let sample = match self.input.next() {
            Some(sample) => sample,
            None => {
                self.finished = true;
                self.channel.mark_released();
                return None;
            }
        };
        self.frame_offset = (self.frame_offset + 1) % self.channels;
        Some(sample * self.ramp.gain())
    }
}

impl<I> Source for RampedSource<I>
where
    I: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
