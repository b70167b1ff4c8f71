//! Audio-domain time source and playback port.
//!
//! The engine never reads wall-clock time directly. Everything it knows about
//! "now" and every sound it wants played goes through [`Clock`], so a session
//! can be driven by real audio output or by a [`ManualClock`] in tests.

use crate::model::rhythm::Sound;

pub trait Clock {
    /// Current time in seconds on the audio clock. Stops advancing while suspended.
    fn now(&self) -> f64;

    /// Fire-and-forget: play `sound` at absolute time `at` with linear `gain`.
    fn schedule_at(&mut self, sound: Sound, at: f64, gain: f32);

    fn suspend(&mut self) {}

    fn resume(&mut self) {}

    /// Cut every in-flight and pending voice.
    fn stop_all(&mut self) {}

    /// Drop bookkeeping for voices that have finished on their own.
    fn release_finished(&mut self) {}
}

/// A sound handed to the playback port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledSound {
    pub sound: Sound,
    pub at: f64,
    pub gain: f32,
}

/// Deterministic clock advanced by hand; records everything it is asked to play.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: f64,
    suspended: bool,
    pub scheduled: Vec<ScheduledSound>,
    pub stop_all_calls: usize,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { now: start, ..Self::default() }
    }

    /// Moves time forward unless suspended.
    pub fn advance(&mut self, secs: f64) {
        if !self.suspended {
            self.now += secs;
        }
    }

    /// Jumps to an absolute time, even backwards.
    pub fn set(&mut self, now: f64) {
        self.now = now;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn scheduled_of(&self, sound: Sound) -> impl Iterator<Item = &ScheduledSound> + '_ {
        self.scheduled.iter().filter(move |s| s.sound == sound)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn schedule_at(&mut self, sound: Sound, at: f64, gain: f32) {
        self.scheduled.push(ScheduledSound { sound, at, gain });
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn stop_all(&mut self) {
        self.stop_all_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspended_manual_clock_does_not_advance() {
        let mut clock = ManualClock::new(1.0);
        clock.advance(0.5);
        clock.suspend();
        clock.advance(10.0);
        assert!((clock.now() - 1.5).abs() < 1e-12);
        clock.resume();
        clock.advance(0.25);
        assert!((clock.now() - 1.75).abs() < 1e-12);
    }

    #[test]
    fn manual_clock_records_schedule_requests() {
        let mut clock = ManualClock::new(0.0);
        clock.schedule_at(Sound::Kick, 0.5, 0.95);
        clock.schedule_at(Sound::ClickHigh, 0.5, 0.55);
        assert_eq!(clock.scheduled_of(Sound::Kick).count(), 1);
        assert_eq!(clock.scheduled[1].at, 0.5);
    }
}
