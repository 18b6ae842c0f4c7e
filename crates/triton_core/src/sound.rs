//! The beep oscillator.
//!
//! Port 7 bit 6 gates a fixed tone through a small speaker; here a looped
//! sine fed to a rodio sink that is played or paused to match the latch.
//! If no audio device can be opened the emulator runs silently.

use log::error;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};

/// Tone frequency of the on-board oscillator.
const BEEP_FREQ_HZ: f32 = 1_000.0;

/// Handle to the audio output; dropping it silences the machine.
pub struct Beeper {
    // The stream must stay alive for the sink to produce sound.
    _stream: OutputStream,
    sink: Sink,
}

impl Beeper {
    /// Open the default audio device and park a paused, endless tone on
    /// it. Returns `None` when audio is unavailable.
    pub fn new() -> Option<Self> {
        let Ok((stream, handle)) = OutputStream::try_default() else {
            error!("failed to open audio output, beeper disabled");
            return None;
        };
        let Ok(sink) = Sink::try_new(&handle) else {
            error!("failed to create audio sink, beeper disabled");
            return None;
        };

        sink.append(SineWave::new(BEEP_FREQ_HZ).amplify(0.20));
        sink.pause();

        Some(Self {
            _stream: stream,
            sink,
        })
    }

    /// Gate the tone on or off. Idempotent.
    pub fn set_active(&self, active: bool) {
        if active {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }
}
