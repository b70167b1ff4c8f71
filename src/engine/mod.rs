//! The practice session engine.
//!
//! One [`Engine`] owns everything a session mutates: the scheduler, both
//! timelines, the tracking gate, the scoring cursor and the running stats. It is
//! driven from a single thread by calling [`Engine::tick`] periodically and
//! [`Engine::register_hit`] whenever the player hits a pad.
//!
//! A tick always runs its steps in the same order: schedule due beats, prune the
//! timelines, evaluate the gate, then score. Scoring never sees a beat before
//! pruning has run, and a session that just came back from idle has its stale
//! hits dropped before anything is matched.

pub mod clock;
pub mod gate;
pub mod scheduler;
pub mod scorer;
pub mod stats;
pub mod timeline;

use serde::{Deserialize, Serialize};

use crate::audio::timing::{clamp_bpm, DEFAULT_BPM};
use crate::model::rhythm::{Instrument, RhythmPattern};
use crate::model::settings::Gains;

use clock::Clock;
use gate::{GateState, GateTransition, TrackingGate};
use scheduler::{Scheduler, SchedulerConfig};
use scorer::{ScoreResult, ScoringConfig};
use stats::{SessionStats, Snapshot};
use timeline::{BeatEvent, HitEvent, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub scoring: ScoringConfig,
    /// Beat periods without input before scoring pauses.
    pub idle_beats: f64,
    /// Beat periods of history kept on both timelines.
    pub horizon_beats: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            scoring: ScoringConfig::default(),
            idle_beats: 8.0,
            horizon_beats: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Running,
    Paused,
}

/// What a tick has to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    /// Not started.
    Ready,
    Paused,
    /// No recent input; scoring is on hold.
    Idle,
    /// Tracking, but no beat is old enough to score yet.
    Waiting,
    /// Score of the most recent window.
    Live(ScoreResult),
}

pub struct Engine<C: Clock> {
    clock: C,
    cfg: EngineConfig,
    gains: Gains,
    bpm: u32,
    rhythm: RhythmPattern,
    phase: Phase,
    scheduler: Scheduler,
    timeline: Timeline,
    gate: TrackingGate,
    /// Index of the last beat folded into the stats; `None` before the first.
    cursor: Option<u64>,
    stats: SessionStats,
    live: Option<ScoreResult>,
}

impl<C: Clock> Engine<C> {
    pub fn new(clock: C, cfg: EngineConfig) -> Self {
        Self {
            clock,
            cfg,
            gains: Gains::default(),
            bpm: DEFAULT_BPM,
            rhythm: RhythmPattern::default(),
            phase: Phase::Ready,
            scheduler: Scheduler::new(cfg.scheduler, DEFAULT_BPM),
            timeline: Timeline::new(),
            gate: TrackingGate::new(cfg.idle_beats),
            cursor: None,
            stats: SessionStats::new(),
            live: None,
        }
    }

    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }

    // --- Inputs read on every tick ---

    /// Sets the tempo; out-of-range values are clamped, not rejected.
    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = clamp_bpm(bpm);
    }

    pub fn set_rhythm(&mut self, rhythm: RhythmPattern) {
        self.rhythm = rhythm;
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn rhythm(&self) -> &RhythmPattern {
        &self.rhythm
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    // --- Lifecycle ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Starts a fresh session; restarts if one is already running.
    pub fn begin(&mut self) {
        if self.phase != Phase::Ready {
            self.clock.stop_all();
        }
        self.reset_state();
        self.clock.resume();
        self.scheduler.start(self.clock.now(), self.bpm);
        self.phase = Phase::Running;
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Paused;
        self.clock.suspend();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.clock.resume();
        self.scheduler.realign(self.clock.now());
        self.phase = Phase::Running;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Ready => false,
        }
    }

    /// Ends the session: returns its final snapshot and clears all state.
    pub fn stop(&mut self) -> Option<Snapshot> {
        if self.phase == Phase::Ready {
            return None;
        }
        let summary = self.snapshot();
        self.clock.stop_all();
        self.reset_state();
        Some(summary)
    }

    fn reset_state(&mut self) {
        self.phase = Phase::Ready;
        self.scheduler = Scheduler::new(self.cfg.scheduler, self.bpm);
        self.timeline.clear();
        self.gate.reset();
        self.cursor = None;
        self.stats.reset();
        self.live = None;
    }

    // --- Input ---

    /// Records a pad hit at the clock's current time. Ignored unless running.
    pub fn register_hit(&mut self, instrument: Instrument) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let now = self.clock.now();
        self.gate.record_hit(now);
        self.timeline.push_hit(HitEvent { time: now, instrument });
        self.clock.schedule_at(instrument.sound(), now, self.gains.drum);
        true
    }

    // --- Tick ---

    pub fn tick(&mut self) -> Feedback {
        match self.phase {
            Phase::Ready => return Feedback::Ready,
            Phase::Paused => return Feedback::Paused,
            Phase::Running => {}
        }
        self.clock.release_finished();

        self.scheduler.schedule_due(
            &mut self.clock,
            self.bpm,
            &self.rhythm,
            &self.gains,
            &mut self.timeline,
        );

        let now = self.clock.now();
        let period = self.scheduler.period();
        self.timeline.prune(now, self.cfg.horizon_beats * period);

        let transition = self.gate.evaluate(now, period);
        if transition == GateTransition::Resumed {
            self.on_tracking_resumed(now, period);
        }
        if !transition.is_active() {
            self.live = None;
            return Feedback::Idle;
        }

        self.score_eligible(now, period)
    }

    fn eligibility_cutoff(&self, now: f64, period: f64) -> f64 {
        now - self.cfg.scoring.eligibility_delay_beats * period
    }

    /// Drops hits from before the gap and skips the cursor past it.
    fn on_tracking_resumed(&mut self, now: f64, period: f64) {
        self.timeline.clear_hits();
        let cutoff = self.eligibility_cutoff(now, period);
        self.cursor = self
            .timeline
            .beats_until(cutoff)
            .last()
            .map(|b| b.index)
            .or_else(|| self.scheduler.next_index().checked_sub(1));
    }

    fn score_eligible(&mut self, now: f64, period: f64) -> Feedback {
        let eligible = self.timeline.beats_until(self.eligibility_cutoff(now, period));
        if eligible.is_empty() {
            return Feedback::Waiting;
        }
        let hits: Vec<HitEvent> = self.timeline.hits().copied().collect();
        let scoring = self.cfg.scoring;
        let window = scoring.window_len();

        for (pos, beat) in eligible.iter().enumerate() {
            if self.cursor.is_some_and(|c| beat.index <= c) {
                continue;
            }
            let start = (pos + 1).saturating_sub(window);
            let result = scoring.score_window(&eligible[start..=pos], &hits);
            self.stats.record(&result);
            self.cursor = Some(beat.index);
        }

        let start = eligible.len().saturating_sub(window);
        let live = scoring.score_window(&eligible[start..], &hits);
        self.live = Some(live);
        Feedback::Live(live)
    }

    // --- Read-only views ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_stats(&self.stats, self.bpm, self.rhythm.label)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn live(&self) -> Option<&ScoreResult> {
        self.live.as_ref()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Whether any pad has been hit since the session began.
    pub fn has_input(&self) -> bool {
        self.gate.ever_hit()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// The most recent beat that has already sounded.
    pub fn current_beat(&self) -> Option<BeatEvent> {
        let now = self.clock.now();
        self.timeline.beats().rev().find(|b| b.time <= now).copied()
    }

    pub fn next_beat_time(&self) -> f64 {
        self.scheduler.next_beat_time()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clock::ManualClock;

    fn engine() -> Engine<ManualClock> {
        let mut e = Engine::new(ManualClock::new(0.0), EngineConfig::default());
        e.set_bpm(120);
        e
    }

    #[test]
    fn tick_before_begin_reports_ready() {
        let mut e = engine();
        assert_eq!(e.tick(), Feedback::Ready);
        assert!(!e.register_hit(Instrument::Kick));
        assert_eq!(e.stop(), None);
    }

    #[test]
    fn idle_until_first_hit() {
        let mut e = engine();
        e.begin();
        assert_eq!(e.tick(), Feedback::Idle);
        e.clock_mut().advance(1.0);
        assert_eq!(e.tick(), Feedback::Idle);
        assert_eq!(e.gate_state(), GateState::Inactive);
    }

    #[test]
    fn hits_ignored_while_paused() {
        let mut e = engine();
        e.begin();
        assert!(e.pause());
        assert!(e.clock().is_suspended());
        assert!(!e.register_hit(Instrument::Snare));
        assert_eq!(e.tick(), Feedback::Paused);
        assert!(e.toggle_pause());
        assert_eq!(e.phase(), Phase::Running);
    }

    #[test]
    fn register_hit_plays_the_pad_immediately() {
        let mut e = engine();
        e.begin();
        e.clock_mut().advance(0.3);
        e.register_hit(Instrument::Snare);
        let played = e.clock().scheduled.last().copied().expect("pad sound");
        assert_eq!(played.sound, crate::model::rhythm::Sound::Snare);
        assert!((played.at - 0.3).abs() < 1e-12);
        assert_eq!(e.timeline().hit_count(), 1);
    }

    #[test]
    fn has_input_tracks_first_hit_per_session() {
        let mut e = engine();
        e.begin();
        assert!(!e.has_input());
        e.clock_mut().advance(0.2);
        e.register_hit(Instrument::Kick);
        assert!(e.has_input());
        e.stop();
        assert!(!e.has_input());
    }

    #[test]
    fn tick_uses_the_scheduled_period() {
        let mut e = engine();
        e.begin();
        e.tick();
        assert!((e.scheduler.period() - 0.5).abs() < 1e-12);
        e.set_bpm(60);
        e.tick();
        assert!((e.scheduler.period() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bpm_is_clamped() {
        let mut e = engine();
        e.set_bpm(500);
        assert_eq!(e.bpm(), 140);
        e.set_bpm(1);
        assert_eq!(e.bpm(), 40);
    }

    #[test]
    fn stop_resets_everything() {
        let mut e = engine();
        e.begin();
        for _ in 0..40 {
            e.tick();
            e.clock_mut().advance(0.025);
        }
        let summary = e.stop().expect("summary");
        assert_eq!(summary.bpm, 120);
        assert_eq!(e.phase(), Phase::Ready);
        assert_eq!(e.timeline().beat_count(), 0);
        assert_eq!(e.stats().evaluated_beats(), 0);
        assert_eq!(e.clock().stop_all_calls, 1);
    }
}
