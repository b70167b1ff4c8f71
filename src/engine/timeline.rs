use std::collections::VecDeque;

use crate::model::rhythm::Instrument;

/// One scheduled beat. Produced only by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    pub index: u64,
    /// Seconds on the audio clock.
    pub time: f64,
    pub expected: Option<Instrument>,
}

impl BeatEvent {
    pub fn position_in_bar(&self) -> usize {
        (self.index % crate::model::rhythm::BAR_LEN as u64) as usize
    }
}

/// One captured user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub time: f64,
    pub instrument: Instrument,
}

/// Time-ordered, bounded logs of scheduled beats and captured hits.
#[derive(Debug, Default)]
pub struct Timeline {
    beats: VecDeque<BeatEvent>,
    hits: VecDeque<HitEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_beat(&mut self, beat: BeatEvent) {
        debug_assert!(self.beats.back().map_or(true, |b| b.index < beat.index));
        self.beats.push_back(beat);
    }

    pub fn push_hit(&mut self, hit: HitEvent) {
        self.hits.push_back(hit);
    }

    /// Drops entries older than `horizon` seconds before `now` from the front of both logs.
    pub fn prune(&mut self, now: f64, horizon: f64) {
        let cutoff = now - horizon;
        while self.beats.front().is_some_and(|b| b.time < cutoff) {
            self.beats.pop_front();
        }
        while self.hits.front().is_some_and(|h| h.time < cutoff) {
            self.hits.pop_front();
        }
    }

    pub fn clear_hits(&mut self) {
        self.hits.clear();
    }

    pub fn clear(&mut self) {
        self.beats.clear();
        self.hits.clear();
    }

    pub fn beats(&self) -> impl DoubleEndedIterator<Item = &BeatEvent> + '_ {
        self.beats.iter()
    }

    pub fn hits(&self) -> impl Iterator<Item = &HitEvent> + '_ {
        self.hits.iter()
    }

    /// Beats whose scheduled time is at or before `cutoff`, in index order.
    pub fn beats_until(&self, cutoff: f64) -> Vec<BeatEvent> {
        self.beats.iter().take_while(|b| b.time <= cutoff).copied().collect()
    }

    pub fn last_beat(&self) -> Option<&BeatEvent> {
        self.beats.back()
    }

    pub fn beat_count(&self) -> usize {
        self.beats.len()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }
}
