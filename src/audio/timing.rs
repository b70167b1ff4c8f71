use std::time::Duration;

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 140;
pub const DEFAULT_BPM: u32 = 90;

/// Default gain for the metronome click.
pub const METRONOME_GAIN: f32 = 0.55;

/// Default gain for pattern and pad drum hits.
pub const DRUM_GAIN: f32 = 0.95;

/// Default output gain applied on top of every voice.
pub const MASTER_GAIN: f32 = 0.9;

// --- Tempo helpers (pure, testable) ---
pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Seconds per beat at the given tempo, after clamping.
pub fn beat_period_secs(bpm: u32) -> f64 {
    60.0 / clamp_bpm(bpm) as f64
}

pub fn beat_period(bpm: u32) -> Duration {
    Duration::from_secs_f64(beat_period_secs(bpm))
}

/// Converts a span on the audio clock into a `Duration`, treating negative spans as zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}
