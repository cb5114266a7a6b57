//! Text commands driving the controller the way the window's toggle button and volume slider
//! would.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::debug;

use crate::controller::{PlaybackController, PlaybackState};
use crate::error::ControlParseError;

pub const SLIDER_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Play/pause button.
    Toggle,
    Resume,
    Pause,
    /// Slider position, 0 to 100.
    Volume(u8),
    Status,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ControlParseError::Empty)?;
        match command.to_ascii_lowercase().as_str() {
            "toggle" | "t" => Ok(ControlCommand::Toggle),
            "play" | "resume" => Ok(ControlCommand::Resume),
            "pause" => Ok(ControlCommand::Pause),
            "volume" | "vol" | "v" => {
                let arg = words.next().unwrap_or_default();
                match arg.parse::<u8>() {
                    Ok(position) if position <= SLIDER_MAX => Ok(ControlCommand::Volume(position)),
                    _ => Err(ControlParseError::BadVolume(arg.to_string())),
                }
            }
            "status" | "s" => Ok(ControlCommand::Status),
            "quit" | "exit" | "q" => Ok(ControlCommand::Quit),
            other => Err(ControlParseError::Unknown(other.to_string())),
        }
    }
}

pub fn slider_to_volume(position: u8) -> f32 {
    f32::from(position.min(SLIDER_MAX)) / f32::from(SLIDER_MAX)
}

pub fn volume_to_slider(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * f32::from(SLIDER_MAX)).round() as u8
}

/// Apply `command` to the controller. Returns false when the front end should exit.
pub fn apply(command: ControlCommand, controller: &mut PlaybackController) -> bool {
    debug!(?command, "control command");
    match command {
        ControlCommand::Toggle => {
            if controller.is_playing() {
                controller.pause();
            } else {
                controller.resume();
            }
        }
        ControlCommand::Resume => controller.resume(),
        ControlCommand::Pause => controller.pause(),
        ControlCommand::Volume(position) => controller.set_volume(slider_to_volume(position)),
        ControlCommand::Status => {}
        ControlCommand::Quit => return false,
    }
    true
}

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// An explicit `quit`.
    Quit,
    /// End of input. Playback carries on; the caller decides how long.
    InputClosed,
}

/// Read commands line by line from `input`, apply them and write the status to `output`.
pub fn run<R, W>(input: R, mut output: W, controller: &mut PlaybackController) -> io::Result<Exit>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", status_line(controller))?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<ControlCommand>() {
            Ok(command) => {
                if !apply(command, controller) {
                    return Ok(Exit::Quit);
                }
                writeln!(output, "{}", status_line(controller))?;
            }
            Err(e) => writeln!(
                output,
                "{} (commands: toggle, play, pause, volume <0-100>, status, quit)",
                e
            )?,
        }
    }
    Ok(Exit::InputClosed)
}

pub fn status_line(controller: &PlaybackController) -> String {
    let state = match controller.state() {
        PlaybackState::Stopped => "stopped",
        PlaybackState::Playing => "playing",
        PlaybackState::Pausing => "pausing",
        PlaybackState::Idle => "paused",
    };
    format!(
        "{} | volume {}",
        state,
        volume_to_slider(controller.volume())
    )
}
