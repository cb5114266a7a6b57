use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, info, warn};

use crate::error::MixerInitError;

pub mod ramp;
pub mod sound;

/// Process-wide audio output. Owns the thread that keeps the default output stream alive and
/// opens mixing channels on it. Created once by the entry point and injected into the
/// playback controller.
pub struct AudioSubsystem {
    stream_handle: OutputStreamHandle,
    shutdown_sender: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl AudioSubsystem {
    /// Open the default output device on a dedicated thread. Blocks until the device is open
    /// or has failed to open.
    pub fn init() -> Result<Self, MixerInitError> {
        let (ready_sender, ready_receiver) =
            mpsc::channel::<Result<OutputStreamHandle, MixerInitError>>();
        let (shutdown_sender, shutdown_receiver) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("rainy-audio".to_string())
            .spawn(move || {
                // OutputStream must stay on the thread that created it, otherwise there is no
                // sound output on some hosts
                match OutputStream::try_default() {
                    Ok((stream, stream_handle)) => {
                        if ready_sender.send(Ok(stream_handle)).is_err() {
                            return;
                        }
                        // Sender dropped or shutdown requested
                        let _ = shutdown_receiver.recv();
                        drop(stream);
                        debug!("audio output stream closed");
                    }
                    Err(e) => {
                        let _ = ready_sender.send(Err(MixerInitError::Stream(e)));
                    }
                }
            })
            .map_err(MixerInitError::Thread)?;

        match ready_receiver.recv() {
            Ok(Ok(stream_handle)) => {
                info!("audio subsystem initialized");
                Ok(Self {
                    stream_handle,
                    shutdown_sender,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(MixerInitError::ThreadExited)
            }
        }
    }

    /// Open a new mixing channel on the output stream.
    pub fn open_channel(&self) -> Result<Sink, MixerInitError> {
        Ok(Sink::try_new(&self.stream_handle)?)
    }

    /// Close the output stream and wait for the audio thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.shutdown_sender.send(());
            if thread.join().is_err() {
                warn!("audio thread panicked during shutdown");
            }
            info!("audio subsystem shut down");
        }
    }
}

impl Drop for AudioSubsystem {
    fn drop(&mut self) {
        self.stop();
    }
}
