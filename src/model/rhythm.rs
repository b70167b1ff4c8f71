use std::fmt;

use serde::{Deserialize, Serialize};

/// Beats per bar; every rhythm is exactly one bar long.
pub const BAR_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Kick,
    Snare,
}

impl Instrument {
    pub fn sound(self) -> Sound {
        match self {
            Instrument::Kick => Sound::Kick,
            Instrument::Snare => Sound::Snare,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Instrument::Kick => 'K',
            Instrument::Snare => 'S',
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Kick => write!(f, "kick"),
            Instrument::Snare => write!(f, "snare"),
        }
    }
}

/// Everything the engine can ask the playback port to sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Kick,
    Snare,
    ClickHigh,
    ClickLow,
}

impl Sound {
    pub const ALL: [Sound; 4] = [Sound::Kick, Sound::Snare, Sound::ClickHigh, Sound::ClickLow];

    /// Metronome click for a position within the bar (downbeat = 0).
    pub fn click_for(position: usize) -> Sound {
        if position == 0 {
            Sound::ClickHigh
        } else {
            Sound::ClickLow
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Sound::Kick => "kick1.mp3",
            Sound::Snare => "snare1.mp3",
            Sound::ClickHigh => "metronomehigh.mp3",
            Sound::ClickLow => "metronomelow.mp3",
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sound::Kick => "kick",
            Sound::Snare => "snare",
            Sound::ClickHigh => "click (high)",
            Sound::ClickLow => "click (low)",
        };
        f.write_str(name)
    }
}

/// A one-bar cycle of expected instruments; `None` is a rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhythmPattern {
    pub id: &'static str,
    pub label: &'static str,
    pub slots: [Option<Instrument>; BAR_LEN],
}

const K: Option<Instrument> = Some(Instrument::Kick);
const S: Option<Instrument> = Some(Instrument::Snare);

pub const PRESETS: [RhythmPattern; 4] = [
    RhythmPattern { id: "r1", label: "Kick on 1 & 3", slots: [K, None, K, None] },
    RhythmPattern { id: "r2", label: "Kick 1, Snare 3", slots: [K, None, S, None] },
    RhythmPattern { id: "r3", label: "Four on the floor", slots: [K, K, K, K] },
    RhythmPattern { id: "r4", label: "Kick/Snare alternate", slots: [K, S, K, S] },
];

impl RhythmPattern {
    /// Looks up a preset by id, falling back to the first preset.
    pub fn preset(id: &str) -> RhythmPattern {
        Self::find(id).unwrap_or_else(|| PRESETS[0].clone())
    }

    pub fn find(id: &str) -> Option<RhythmPattern> {
        PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id)).cloned()
    }

    /// Expected instrument at a position within the bar.
    pub fn expected_at(&self, position: usize) -> Option<Instrument> {
        self.slots[position % BAR_LEN]
    }

    /// Compact grid such as `K.S.`.
    pub fn grid(&self) -> String {
        self.slots
            .iter()
            .map(|s| s.map(Instrument::symbol).unwrap_or('.'))
            .collect()
    }
}

impl Default for RhythmPattern {
    fn default() -> Self {
        PRESETS[0].clone()
    }
}

pub fn list_presets() -> String {
    let mut out = String::new();
    for p in PRESETS.iter() {
        out.push_str(&format!("{}  {}  {}\n", p.id, p.grid(), p.label));
    }
    out
}
