use serde::Serialize;

use crate::engine::scorer::{ScoreResult, Tier};

/// Running aggregates over every beat scored this session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    evaluated_beats: u64,
    last_tier: Option<Tier>,
    tier_sum: u64,
    error_sum_ms: f64,
    best_avg_error_ms: Option<f64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds in the first evaluation of one beat. Call exactly once per beat index.
    pub fn record(&mut self, result: &ScoreResult) {
        self.evaluated_beats += 1;
        self.last_tier = Some(result.tier);
        self.tier_sum += result.tier.get() as u64;
        self.error_sum_ms += result.avg_error_ms;
        if result.avg_error_ms.is_finite() {
            self.best_avg_error_ms = Some(match self.best_avg_error_ms {
                Some(best) => best.min(result.avg_error_ms),
                None => result.avg_error_ms,
            });
        }
    }

    pub fn evaluated_beats(&self) -> u64 {
        self.evaluated_beats
    }

    pub fn last_tier(&self) -> Option<Tier> {
        self.last_tier
    }

    pub fn running_avg_tier(&self) -> Option<f64> {
        (self.evaluated_beats > 0).then(|| self.tier_sum as f64 / self.evaluated_beats as f64)
    }

    pub fn running_avg_error_ms(&self) -> Option<f64> {
        (self.evaluated_beats > 0).then(|| self.error_sum_ms / self.evaluated_beats as f64)
    }

    pub fn best_avg_error_ms(&self) -> Option<f64> {
        self.best_avg_error_ms
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view of a session handed to display and export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub beats_evaluated: u64,
    pub last_tier: Option<Tier>,
    pub running_avg_tier: Option<f64>,
    pub running_avg_error_ms: Option<f64>,
    pub best_error_ms: Option<f64>,
    pub bpm: u32,
    pub pattern_label: String,
}

impl Snapshot {
    pub fn from_stats(stats: &SessionStats, bpm: u32, pattern_label: impl Into<String>) -> Self {
        Self {
            beats_evaluated: stats.evaluated_beats(),
            last_tier: stats.last_tier(),
            running_avg_tier: stats.running_avg_tier(),
            running_avg_error_ms: stats.running_avg_error_ms(),
            best_error_ms: stats.best_avg_error_ms(),
            bpm,
            pattern_label: pattern_label.into(),
        }
    }

    /// End-of-session verdict keyed by the rounded average tier.
    pub fn verdict(&self) -> &'static str {
        let rounded = self.running_avg_tier.unwrap_or(0.0).round() as i64;
        match rounded {
            i64::MIN..=1 => "You scored an average of 1/5 - You're down but you're not out! Give it another go and see if you can improve",
            2 => "You scored an average of 2/5 - That's not a bad way to begin, but I reckon you've got a higher score in you!",
            3 => "You scored an average of 3/5 - That's not bad at all, though the higher scores are calling your name",
            4 => "You scored an average of 4/5 - That's pretty great! A score to be proud of, but can you go one further?",
            _ => "Average 5/5: Nice one! You were consistently on beat! Time to move on to the next game in the series!",
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let dash = || "—".to_string();
        let ms = |v: Option<f64>| v.map(|v| format!("{}ms", v.round() as i64)).unwrap_or_else(dash);
        vec![
            format!("Rhythm: {} @ {} BPM", self.pattern_label, self.bpm),
            format!("Beats played: {}", self.beats_evaluated),
            format!(
                "Average score: {}",
                self.running_avg_tier.map(|a| format!("{:.1}/5", a)).unwrap_or_else(dash)
            ),
            format!("Avg ms accuracy: {}", ms(self.running_avg_error_ms)),
            format!("Best accuracy: {}", ms(self.best_error_ms)),
            String::new(),
            self.verdict().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(tier: u8, avg_error_ms: f64) -> ScoreResult {
        ScoreResult {
            tier: Tier::new(tier),
            avg_error_ms,
            effective_error_ms: avg_error_ms,
            misses: 0,
            extras: 0,
        }
    }

    #[test]
    fn running_averages_follow_records() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.running_avg_tier(), None);
        stats.record(&result(5, 10.0));
        stats.record(&result(3, 50.0));
        stats.record(&result(4, 30.0));
        assert_eq!(stats.evaluated_beats(), 3);
        assert_eq!(stats.last_tier(), Some(Tier::new(4)));
        assert!((stats.running_avg_tier().unwrap() - 4.0).abs() < 1e-9);
        assert!((stats.running_avg_error_ms().unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn best_error_only_improves() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.best_avg_error_ms(), None);
        stats.record(&result(2, 120.0));
        stats.record(&result(4, 40.0));
        stats.record(&result(1, 180.0));
        assert_eq!(stats.best_avg_error_ms(), Some(40.0));
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut stats = SessionStats::new();
        stats.record(&result(5, 5.0));
        stats.reset();
        assert_eq!(stats, SessionStats::default());
    }

    #[test]
    fn summary_shows_dashes_before_any_beat() {
        let snap = Snapshot::from_stats(&SessionStats::new(), 90, "Kick on 1 & 3");
        let lines = snap.summary_lines();
        assert_eq!(lines[1], "Beats played: 0");
        assert_eq!(lines[2], "Average score: —");
        assert!(snap.verdict().contains("1/5"));
    }

    #[test]
    fn verdict_uses_rounded_average() {
        let mut stats = SessionStats::new();
        stats.record(&result(4, 40.0));
        stats.record(&result(5, 10.0));
        let snap = Snapshot::from_stats(&stats, 120, "Four on the floor");
        assert!(snap.verdict().contains("5/5"));
        assert_eq!(snap.summary_lines()[4], "Best accuracy: 10ms");
    }
}
