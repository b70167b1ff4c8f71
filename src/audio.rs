use std::io::{BufReader, Cursor};
use std::path::Path;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::engine::clock::Clock;
use crate::error::EngineError;
use crate::model::rhythm::Sound;

pub mod samples;
pub mod timing;

use samples::SampleBank;
use timing::secs_to_duration;

/// How long stopped voices take to fade to silence.
const FADE_OUT: Duration = Duration::from_millis(60);
const FADE_STEPS: u32 = 6;

/// Volume at each step of a linear fade; the last step is silent.
fn fade_levels(steps: u32) -> Vec<f32> {
    let steps = steps.max(1);
    (1..=steps).map(|i| 1.0 - i as f32 / steps as f32).collect()
}

/// Audio output doubling as the session clock.
///
/// Time is measured from construction and excludes every suspended span, so
/// beats scheduled before a pause keep their place relative to the clock. Each
/// scheduled sound gets its own sink holding a delayed source; those sinks are
/// tracked in a voice registry and released when they drain or on `stop_all`.
pub struct RodioClock {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    bank: SampleBank,
    master: f32,
    origin: Instant,
    paused_total: Duration,
    paused_at: Option<Instant>,
    voices: Vec<VoiceHandle>,
}

struct VoiceHandle {
    sink: Sink,
}

impl RodioClock {
    /// Opens the default output device. Failing here means no session can start.
    pub fn new(samples_dir: &Path, master: f32) -> Result<Self, EngineError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| EngineError::ClockUnavailable(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            bank: SampleBank::load(samples_dir),
            master: master.max(0.0),
            origin: Instant::now(),
            paused_total: Duration::ZERO,
            paused_at: None,
            voices: Vec::new(),
        })
    }

    pub fn bank(&self) -> &SampleBank {
        &self.bank
    }

    fn start_voice(&mut self, data: Vec<u8>, lead: Duration, gain: f32) {
        let decoded = match Decoder::new(BufReader::new(Cursor::new(data))) {
            Ok(s) => s,
            Err(e) => {
                crate::console::error(format!("audio decode error: {}", e));
                return;
            }
        };
        let source = decoded
            .amplify(gain.max(0.0) * self.master)
            .convert_samples::<f32>()
            .delay(lead);

        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(source);
                if self.paused_at.is_some() {
                    sink.pause();
                }
                self.voices.push(VoiceHandle { sink });
            }
            Err(e) => crate::console::error(format!("audio error: {}", e)),
        }
    }
}

impl Clock for RodioClock {
    fn now(&self) -> f64 {
        let reference = self.paused_at.unwrap_or_else(Instant::now);
        reference
            .saturating_duration_since(self.origin)
            .saturating_sub(self.paused_total)
            .as_secs_f64()
    }

    fn schedule_at(&mut self, sound: Sound, at: f64, gain: f32) {
        // Missing assets were reported at load; skip silently here.
        let Some(data) = self.bank.get(sound).cloned() else { return };
        let lead = secs_to_duration(at - self.now());
        self.start_voice(data, lead, gain);
    }

    fn suspend(&mut self) {
        if self.paused_at.is_some() {
            return;
        }
        self.paused_at = Some(Instant::now());
        for voice in &self.voices {
            voice.sink.pause();
        }
    }

    fn resume(&mut self) {
        let Some(since) = self.paused_at.take() else { return };
        self.paused_total += since.elapsed();
        for voice in &self.voices {
            voice.sink.play();
        }
    }

    /// Fades every voice out on a background thread, then stops it.
    fn stop_all(&mut self) {
        let sinks: Vec<Sink> = self.voices.drain(..).map(|voice| voice.sink).collect();
        if sinks.is_empty() {
            return;
        }
        std::thread::spawn(move || {
            let step = FADE_OUT / FADE_STEPS;
            for level in fade_levels(FADE_STEPS) {
                for sink in &sinks {
                    sink.set_volume(level);
                }
                std::thread::sleep(step);
            }
            for sink in sinks {
                sink.stop();
            }
        });
    }

    fn release_finished(&mut self) {
        self.voices.retain(|voice| !voice.sink.empty());
    }
}

impl Drop for RodioClock {
    // The stream closes with the clock; cut without a fade.
    fn drop(&mut self) {
        for voice in self.voices.drain(..) {
            voice.sink.stop();
        }
    }
}
