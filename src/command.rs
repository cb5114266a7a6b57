use std::time::Duration;

/// Gain instruction posted by the controller to the audio thread of a live playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainCommand {
    /// Ramp from the current gain to `target` over `duration`.
    Fade { target: f32, duration: Duration },
    /// Head for a new target without restarting an in-flight fade.
    Retarget { target: f32 },
}

impl GainCommand {
    /// Combine a pending command with a newer one. The newer command wins, but a retarget
    /// arriving over a pending fade keeps that fade's duration.
    pub fn merge(self, newer: GainCommand) -> GainCommand {
        match (self, newer) {
            (GainCommand::Fade { duration, .. }, GainCommand::Retarget { target }) => {
                GainCommand::Fade { target, duration }
            }
            (_, newer) => newer,
        }
    }
}
