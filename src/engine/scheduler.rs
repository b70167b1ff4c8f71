//! Look-ahead beat scheduler.
//!
//! Each call to [`Scheduler::schedule_due`] schedules every beat whose nominal
//! time falls inside the look-ahead horizon. Sounds are handed to the clock at
//! the beat's own time, never at the time the tick happened to fire, so tick
//! jitter only has to stay below the look-ahead to be inaudible.
//!
//! Beat times inside one tempo segment are `anchor_time + k * period`. A tempo
//! change re-anchors at the next unscheduled beat, which leaves every beat that
//! is already on the timeline untouched.

use serde::{Deserialize, Serialize};

use crate::audio::timing::beat_period_secs;
use crate::engine::clock::Clock;
use crate::engine::timeline::{BeatEvent, Timeline};
use crate::model::rhythm::{RhythmPattern, Sound, BAR_LEN};
use crate::model::settings::Gains;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How far ahead of the clock beats are handed to playback.
    pub look_ahead_secs: f64,
    /// Delay between `begin` and the first downbeat.
    pub start_lead_secs: f64,
    /// Minimum gap between a resume and the next beat.
    pub resume_lead_secs: f64,
    /// Period of the driving tick.
    pub tick_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            look_ahead_secs: 0.14,
            start_lead_secs: 0.10,
            resume_lead_secs: 0.05,
            tick_ms: 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    cfg: SchedulerConfig,
    anchor_index: u64,
    anchor_time: f64,
    period: f64,
    next_index: u64,
}

impl Scheduler {
    pub fn new(cfg: SchedulerConfig, bpm: u32) -> Self {
        Self {
            cfg,
            anchor_index: 0,
            anchor_time: 0.0,
            period: beat_period_secs(bpm),
            next_index: 0,
        }
    }

    /// Places beat 0 shortly after `now`.
    pub fn start(&mut self, now: f64, bpm: u32) {
        self.anchor_index = 0;
        self.anchor_time = now + self.cfg.start_lead_secs;
        self.period = beat_period_secs(bpm);
        self.next_index = 0;
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn next_beat_time(&self) -> f64 {
        self.anchor_time + (self.next_index - self.anchor_index) as f64 * self.period
    }

    /// Applies a tempo to beats not yet scheduled.
    pub fn set_tempo(&mut self, bpm: u32) {
        let period = beat_period_secs(bpm);
        if period != self.period {
            self.anchor_time = self.next_beat_time();
            self.anchor_index = self.next_index;
            self.period = period;
        }
    }

    /// Moves the next beat to no earlier than `now + resume_lead` so nothing
    /// that fell due while paused is released in a burst.
    pub fn realign(&mut self, now: f64) {
        let next = self.next_beat_time().max(now + self.cfg.resume_lead_secs);
        self.anchor_time = next;
        self.anchor_index = self.next_index;
    }

    /// Schedules every beat due within the look-ahead window.
    pub fn schedule_due<C: Clock>(
        &mut self,
        clock: &mut C,
        bpm: u32,
        pattern: &RhythmPattern,
        gains: &Gains,
        timeline: &mut Timeline,
    ) {
        self.set_tempo(bpm);
        let horizon = clock.now() + self.cfg.look_ahead_secs;
        while self.next_beat_time() < horizon {
            let time = self.next_beat_time();
            let index = self.next_index;
            let position = (index % BAR_LEN as u64) as usize;

            clock.schedule_at(Sound::click_for(position), time, gains.metronome);
            let expected = pattern.expected_at(position);
            if let Some(instrument) = expected {
                clock.schedule_at(instrument.sound(), time, gains.drum);
            }

            timeline.push_beat(BeatEvent { index, time, expected });
            self.next_index += 1;
        }
    }
}
