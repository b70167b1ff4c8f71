use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::timing::{clamp_bpm, DEFAULT_BPM, DRUM_GAIN, MASTER_GAIN, METRONOME_GAIN};
use crate::engine::EngineConfig;
use crate::model::rhythm::RhythmPattern;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gains {
    pub metronome: f32, // 0..1
    pub drum: f32,      // 0..1
    pub master: f32,    // 0..1
}

impl Default for Gains {
    fn default() -> Self {
        Self { metronome: METRONOME_GAIN, drum: DRUM_GAIN, master: MASTER_GAIN }
    }
}

/// User-facing configuration, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bpm: u32,
    pub rhythm: String,
    pub samples_dir: PathBuf,
    pub gains: Gains,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            rhythm: "r1".to_string(),
            samples_dir: PathBuf::from("audio"),
            gains: Gains::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    pub fn effective_bpm(&self) -> u32 {
        clamp_bpm(self.bpm)
    }

    pub fn rhythm_pattern(&self) -> RhythmPattern {
        RhythmPattern::preset(&self.rhythm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let s: Settings = serde_yaml::from_str("bpm: 200\nrhythm: r3\n").expect("parse");
        assert_eq!(s.effective_bpm(), 140);
        assert_eq!(s.rhythm_pattern().id, "r3");
        assert_eq!(s.gains, Gains::default());
        assert_eq!(s.engine.scoring.window_beats, 4);
    }

    #[test]
    fn nested_scoring_overrides_apply() {
        let yaml = "engine:\n  scoring:\n    match_window_ms: 150\n    tiers:\n      tier5_ms: 20\n";
        let s: Settings = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(s.engine.scoring.match_window_ms, 150.0);
        assert_eq!(s.engine.scoring.tiers.tier5_ms, 20.0);
        assert_eq!(s.engine.scoring.tiers.tier4_ms, 60.0);
        assert_eq!(s.engine.idle_beats, 8.0);
    }
}
