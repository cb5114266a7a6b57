use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::command::GainCommand;

/// Lifecycle of a single looping playback as seen from both sides of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// Audible or fading in.
    Active,
    /// Fading out; the audio thread ends the stream once the gain reaches zero.
    Releasing,
    /// Stream ended. Terminal.
    Released,
}

impl HandleStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => HandleStatus::Active,
            1 => HandleStatus::Releasing,
            _ => HandleStatus::Released,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            HandleStatus::Active => 0,
            HandleStatus::Releasing => 1,
            HandleStatus::Released => 2,
        }
    }
}

/// State shared between the controller and the audio thread for one playback.
///
/// The audio thread never blocks on it: status and gain are atomics and the mailbox is only
/// ever `try_lock`ed from the audio side.
#[derive(Debug)]
pub(crate) struct Channel {
    status: AtomicU8,
    gain: AtomicU32,
    mailbox: Mutex<Option<GainCommand>>,
}

impl Channel {
    pub(crate) fn new(initial_gain: f32) -> Self {
        Self {
            status: AtomicU8::new(HandleStatus::Active.as_u8()),
            gain: AtomicU32::new(initial_gain.to_bits()),
            mailbox: Mutex::new(None),
        }
    }

    pub(crate) fn status(&self) -> HandleStatus {
        HandleStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn transition(&self, from: HandleStatus, to: HandleStatus) -> bool {
        self.status
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn post(&self, command: GainCommand) {
        let mut pending = self.mailbox.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = Some(match pending.take() {
            Some(older) => older.merge(command),
            None => command,
        });
    }

    /// Audio side. Returns `None` when nothing is pending or the controller holds the lock.
    pub(crate) fn try_take(&self) -> Option<GainCommand> {
        self.mailbox.try_lock().ok().and_then(|mut pending| pending.take())
    }

    pub(crate) fn publish_gain(&self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    /// Audio side. Completes a fade-out unless the controller revived the handle meanwhile.
    pub(crate) fn finish_release(&self) -> bool {
        self.transition(HandleStatus::Releasing, HandleStatus::Released)
    }

    /// Audio side. The looped input ran dry, which only happens for a broken source.
    pub(crate) fn mark_released(&self) {
        self.status
            .store(HandleStatus::Released.as_u8(), Ordering::Release);
    }
}

/// Controller-side handle of one active looping playback on the mixing channel.
#[derive(Debug)]
pub struct PlaybackHandle {
    id: u64,
    channel: Arc<Channel>,
}

impl PlaybackHandle {
    /// New handle starting silent with `fade_in` already queued for the audio thread.
    pub(crate) fn new(id: u64, fade_in: GainCommand) -> Self {
        let channel = Arc::new(Channel::new(0.0));
        channel.post(fade_in);
        Self { id, channel }
    }

    pub(crate) fn channel(&self) -> Arc<Channel> {
        Arc::clone(&self.channel)
    }

    /// Sequence number of the playback start that created this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> HandleStatus {
        self.channel.status()
    }

    /// Gain most recently applied by the audio thread.
    pub fn gain(&self) -> f32 {
        self.channel.gain()
    }

    /// Start fading out. Returns false unless the handle was active.
    pub(crate) fn release(&self, fade_out: GainCommand) -> bool {
        if !self
            .channel
            .transition(HandleStatus::Active, HandleStatus::Releasing)
        {
            return false;
        }
        self.channel.post(fade_out);
        true
    }

    /// Cancel an in-flight fade-out and fade back in from the reached gain. Returns false if
    /// the audio thread already released the stream.
    pub(crate) fn revive(&self, fade_in: GainCommand) -> bool {
        if !self
            .channel
            .transition(HandleStatus::Releasing, HandleStatus::Active)
        {
            return false;
        }
        self.channel.post(fade_in);
        true
    }

    /// Fade out over `fade_out` whether active or already releasing, so a newer playback
    /// queued behind this one is not held up by a long fade. Returns false once released.
    pub(crate) fn cut(&self, fade_out: GainCommand) -> bool {
        let releasing = self
            .channel
            .transition(HandleStatus::Active, HandleStatus::Releasing)
            || self.status() == HandleStatus::Releasing;
        if releasing {
            self.channel.post(fade_out);
        }
        releasing
    }

    /// Move an active playback to a new gain. Ignored while releasing.
    pub(crate) fn retarget(&self, target: f32) -> bool {
        if self.status() != HandleStatus::Active {
            return false;
        }
        self.channel.post(GainCommand::Retarget { target });
        true
    }
}
