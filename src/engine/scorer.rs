//! Rolling-window accuracy scoring.
//!
//! A window is the last few eligible beats. Hits are matched to beats in beat
//! order; each hit can be claimed by at most one beat within a window. Expected
//! slots accrue their timing error (or the full match window for a miss), rest
//! slots accrue the full match window when a hit lands on them. The mean error is
//! then inflated by the miss and extra ratios and bucketed into a 1–5 tier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::timeline::{BeatEvent, HitEvent};

/// Accuracy grade for one window, 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(u8);

impl Tier {
    pub const MIN: Tier = Tier(1);
    pub const MAX: Tier = Tier(5);

    pub fn new(value: u8) -> Tier {
        Tier(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Short encouragement shown next to a live score.
    pub fn message(self) -> &'static str {
        match self.0 {
            1 => "Listen to the beat - try and match it!",
            2 => "You're a little out",
            3 => "Not bad!",
            4 => "Good!",
            _ => "Excellent! You are on beat!",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// Upper bounds on effective error (ms) for tiers 5 down to 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub tier5_ms: f64,
    pub tier4_ms: f64,
    pub tier3_ms: f64,
    pub tier2_ms: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self { tier5_ms: 25.0, tier4_ms: 60.0, tier3_ms: 95.0, tier2_ms: 135.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Largest |hit - beat| that still counts as a match; also the penalty for a miss or extra.
    pub match_window_ms: f64,
    /// Beats per rolling window.
    pub window_beats: usize,
    /// How long (in beat periods) a beat waits before it is scored, to admit late hits.
    pub eligibility_delay_beats: f64,
    pub miss_weight: f64,
    pub extra_weight: f64,
    pub tiers: TierThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            match_window_ms: 180.0,
            window_beats: 4,
            eligibility_delay_beats: 0.5,
            miss_weight: 0.85,
            extra_weight: 0.55,
            tiers: TierThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub tier: Tier,
    pub avg_error_ms: f64,
    pub effective_error_ms: f64,
    pub misses: u32,
    pub extras: u32,
}

impl ScoringConfig {
    /// Beats per rolling window as actually scored; never less than one.
    pub fn window_len(&self) -> usize {
        self.window_beats.max(1)
    }

    /// Grades an effective error. Tier 5 additionally requires a clean window.
    pub fn tier_for(&self, effective_error_ms: f64, misses: u32, extras: u32) -> Tier {
        let t = &self.tiers;
        if effective_error_ms <= t.tier5_ms && misses == 0 && extras == 0 {
            Tier(5)
        } else if effective_error_ms <= t.tier4_ms {
            Tier(4)
        } else if effective_error_ms <= t.tier3_ms {
            Tier(3)
        } else if effective_error_ms <= t.tier2_ms {
            Tier(2)
        } else {
            Tier(1)
        }
    }

    /// Scores one window of beats against the captured hits.
    pub fn score_window(&self, window: &[BeatEvent], hits: &[HitEvent]) -> ScoreResult {
        let max_ms = self.match_window_ms;
        let mut claimed = vec![false; hits.len()];
        let mut misses = 0u32;
        let mut extras = 0u32;
        let mut total_ms = 0.0;

        for beat in window {
            let closest = hits
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, h)| (i, h, (h.time - beat.time).abs() * 1000.0))
                .filter(|(_, _, err)| *err <= max_ms)
                .min_by(|a, b| a.2.total_cmp(&b.2));

            match (beat.expected, closest) {
                (Some(_), None) => {
                    misses += 1;
                    total_ms += max_ms;
                }
                (Some(expected), Some((i, hit, err))) => {
                    claimed[i] = true;
                    if hit.instrument == expected {
                        total_ms += err;
                    } else {
                        misses += 1;
                        total_ms += max_ms;
                    }
                }
                (None, Some((i, _, _))) => {
                    claimed[i] = true;
                    extras += 1;
                    total_ms += max_ms;
                }
                (None, None) => {}
            }
        }

        let avg_error_ms = if window.is_empty() {
            max_ms
        } else {
            total_ms / window.len() as f64
        };
        let size = window.len().max(1) as f64;
        let miss_ratio = misses as f64 / size;
        let extra_ratio = extras as f64 / size;
        let effective_error_ms =
            avg_error_ms * (1.0 + self.miss_weight * miss_ratio + self.extra_weight * extra_ratio);

        ScoreResult {
            tier: self.tier_for(effective_error_ms, misses, extras),
            avg_error_ms,
            effective_error_ms,
            misses,
            extras,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rhythm::Instrument::{self, Kick, Snare};

    fn beats(expected: &[Option<Instrument>]) -> Vec<BeatEvent> {
        expected
            .iter()
            .enumerate()
            .map(|(i, e)| BeatEvent { index: i as u64, time: i as f64 * 0.5, expected: *e })
            .collect()
    }

    fn hit(time: f64, instrument: Instrument) -> HitEvent {
        HitEvent { time, instrument }
    }

    #[test]
    fn zero_window_setting_scores_one_beat() {
        let cfg = ScoringConfig { window_beats: 0, ..ScoringConfig::default() };
        assert_eq!(cfg.window_len(), 1);
        assert_eq!(ScoringConfig::default().window_len(), 4);
    }

    #[test]
    fn tight_correct_window_is_tier_five() {
        let cfg = ScoringConfig::default();
        let window = beats(&[Some(Kick), Some(Snare), Some(Kick), Some(Snare)]);
        let hits = vec![
            hit(0.004, Kick),
            hit(0.5 - 0.008, Snare),
            hit(1.0 + 0.010, Kick),
            hit(1.5, Snare),
        ];
        let res = cfg.score_window(&window, &hits);
        assert_eq!(res.tier, Tier::new(5));
        assert_eq!((res.misses, res.extras), (0, 0));
        assert!((res.avg_error_ms - 5.5).abs() < 1e-6);
    }

    #[test]
    fn all_misses_are_tier_one() {
        let cfg = ScoringConfig::default();
        let window = beats(&[Some(Kick); 4]);
        let res = cfg.score_window(&window, &[]);
        assert_eq!(res.misses, 4);
        assert!((res.avg_error_ms - 180.0).abs() < 1e-9);
        assert!((res.effective_error_ms - 333.0).abs() < 1e-9);
        assert_eq!(res.tier, Tier::new(1));
    }

    #[test]
    fn empty_window_is_maximal_error() {
        let cfg = ScoringConfig::default();
        let res = cfg.score_window(&[], &[hit(0.0, Kick)]);
        assert!((res.avg_error_ms - 180.0).abs() < 1e-9);
        assert_eq!(res.tier, Tier::new(1));
    }

    #[test]
    fn wrong_instrument_counts_as_miss_and_consumes_the_hit() {
        let cfg = ScoringConfig::default();
        // Rest right after the kick slot: the wrong-instrument hit must not come back as an extra.
        let window = vec![
            BeatEvent { index: 0, time: 0.0, expected: Some(Kick) },
            BeatEvent { index: 1, time: 0.1, expected: None },
        ];
        let res = cfg.score_window(&window, &[hit(0.05, Snare)]);
        assert_eq!(res.misses, 1);
        assert_eq!(res.extras, 0);
        assert!((res.avg_error_ms - 90.0).abs() < 1e-9);
    }

    #[test]
    fn hit_on_rest_is_an_extra() {
        let cfg = ScoringConfig::default();
        let window = beats(&[Some(Kick), None, Some(Kick), None]);
        let hits = vec![hit(0.0, Kick), hit(0.51, Snare), hit(1.0, Kick)];
        let res = cfg.score_window(&window, &hits);
        assert_eq!(res.extras, 1);
        assert_eq!(res.misses, 0);
        assert!((res.avg_error_ms - 45.0).abs() < 1e-9);
        let expected_eff = 45.0 * (1.0 + 0.55 * 0.25);
        assert!((res.effective_error_ms - expected_eff).abs() < 1e-9);
        assert_eq!(res.tier, Tier::new(4));
    }

    #[test]
    fn rest_claims_only_one_of_several_hits() {
        let cfg = ScoringConfig::default();
        let window = beats(&[None]);
        let hits = vec![hit(0.01, Kick), hit(0.02, Kick), hit(-0.03, Snare)];
        let res = cfg.score_window(&window, &hits);
        assert_eq!(res.extras, 1);
    }

    #[test]
    fn each_hit_claimed_once_across_slots() {
        let cfg = ScoringConfig::default();
        // Two expected slots 100ms apart, one hit between them.
        let window = vec![
            BeatEvent { index: 0, time: 0.0, expected: Some(Kick) },
            BeatEvent { index: 1, time: 0.1, expected: Some(Kick) },
        ];
        let res = cfg.score_window(&window, &[hit(0.06, Kick)]);
        assert_eq!(res.misses, 1);
        assert!((res.avg_error_ms - (60.0 + 180.0) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn closest_candidate_wins() {
        let cfg = ScoringConfig::default();
        let window = beats(&[Some(Kick)]);
        let res = cfg.score_window(&window, &[hit(0.15, Kick), hit(-0.02, Kick)]);
        assert!((res.avg_error_ms - 20.0).abs() < 1e-6);
        assert_eq!(res.extras, 0);
    }

    #[test]
    fn hits_outside_match_window_are_ignored() {
        let cfg = ScoringConfig::default();
        let window = beats(&[Some(Kick)]);
        let res = cfg.score_window(&window, &[hit(0.181, Kick)]);
        assert_eq!(res.misses, 1);
    }

    #[test]
    fn tiers_are_monotonic_in_effective_error() {
        let cfg = ScoringConfig::default();
        let mut last = Tier::MAX;
        for ms in 0..400 {
            let tier = cfg.tier_for(ms as f64, 0, 0);
            assert!(tier <= last);
            last = tier;
        }
        assert_eq!(cfg.tier_for(25.0, 0, 0), Tier::new(5));
        assert_eq!(cfg.tier_for(25.0, 0, 1), Tier::new(4));
        assert_eq!(cfg.tier_for(135.0, 2, 0), Tier::new(2));
        assert_eq!(cfg.tier_for(135.1, 0, 0), Tier::new(1));
    }
}
