use std::thread;
use std::time::Duration;

use rainy::{AudioSubsystem, PlaybackController, PlaybackSettings};

fn main() {
    // try initialize audio output with default device
    let subsystem = AudioSubsystem::init().unwrap();
    let mut controller = PlaybackController::open(&subsystem, PlaybackSettings::default()).unwrap();
    // loading starts playback with a fade-in
    controller.load("assets/audio/rain.wav").unwrap();
    thread::sleep(Duration::from_secs(3));
    // fade out
    controller.pause();
    thread::sleep(Duration::from_millis(500));
    // change of mind halfway through the fade-out
    controller.resume();
    thread::sleep(Duration::from_secs(2));
    controller.set_volume(0.3);
    thread::sleep(Duration::from_secs(3));
    drop(controller);
    subsystem.shutdown();
}
