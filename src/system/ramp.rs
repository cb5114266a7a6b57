use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Shape of a gain ramp's progress from its start value to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FadeCurve {
    /// Constant rate of change.
    #[default]
    Linear,
    /// Smooth acceleration and deceleration: 0.5 * (1 - cos(pi * t)).
    SCurve,
    /// Fast start, gentle finish: sin(t * pi / 2).
    EqualPower,
}

impl FadeCurve {
    /// Fraction of the distance from start to target covered at normalized time `t`.
    pub fn progress(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }
}

impl FromStr for FadeCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "s-curve" | "scurve" | "cosine" => Ok(FadeCurve::SCurve),
            "equal-power" | "equalpower" => Ok(FadeCurve::EqualPower),
            other => Err(format!("unknown fade curve '{}'", other)),
        }
    }
}

impl Display for FadeCurve {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FadeCurve::Linear => "linear",
            FadeCurve::SCurve => "s-curve",
            FadeCurve::EqualPower => "equal-power",
        };
        f.write_str(name)
    }
}

/// Number of frames `duration` spans at `sample_rate`.
pub fn frames_for(duration: Duration, sample_rate: u32) -> u64 {
    (duration.as_secs_f64() * sample_rate as f64).round() as u64
}

/// Playback gain plus an optional in-flight ramp, advanced one frame per `tick`.
#[derive(Debug, Clone)]
pub struct GainRamp {
    gain: f32,
    start: f32,
    target: f32,
    position: u64,
    length: u64,
    curve: FadeCurve,
}

impl GainRamp {
    pub fn new(gain: f32, curve: FadeCurve) -> Self {
        Self {
            gain,
            start: gain,
            target: gain,
            position: 0,
            length: 0,
            curve,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Jump straight to `gain`, cancelling any ramp.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        self.start = gain;
        self.target = gain;
        self.position = 0;
        self.length = 0;
    }

    pub fn is_settled(&self) -> bool {
        self.position >= self.length
    }

    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Ramp from the current gain to `target` over `frames`. Replaces any ramp in flight.
    pub fn ramp_to(&mut self, target: f32, frames: u64) {
        if frames == 0 {
            self.set_gain(target);
            return;
        }
        self.start = self.gain;
        self.target = target;
        self.position = 0;
        self.length = frames;
    }

    /// Head for `target` using what is left of the current ramp, but never faster than
    /// `min_frames`.
    pub fn retarget(&mut self, target: f32, min_frames: u64) {
        let frames = self.remaining().max(min_frames);
        self.ramp_to(target, frames);
    }

    /// Advance one frame and return the gain for it.
    pub fn tick(&mut self) -> f32 {
        if self.position < self.length {
            self.position += 1;
            if self.position == self.length {
                self.gain = self.target;
            } else {
                let t = self.position as f32 / self.length as f32;
                self.gain = self.start + (self.target - self.start) * self.curve.progress(t);
            }
        }
        self.gain
    }
}
