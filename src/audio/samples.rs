use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::path::Path;

use rodio::Decoder;

use crate::error::EngineError;
use crate::model::rhythm::Sound;

/// Encoded sample bytes for each sound, decoded fresh for every voice.
#[derive(Debug, Default, Clone)]
pub struct SampleBank {
    samples: HashMap<Sound, Vec<u8>>,
}

impl SampleBank {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every sound from `dir`. Missing or undecodable files are reported
    /// on the console and left out; those sounds simply never play.
    pub fn load(dir: &Path) -> Self {
        let mut bank = Self::empty();
        for sound in Sound::ALL {
            match load_one(dir, sound) {
                Ok(bytes) => {
                    bank.samples.insert(sound, bytes);
                }
                Err(e) => crate::console::warn(e.to_string()),
            }
        }
        bank
    }

    pub fn get(&self, sound: Sound) -> Option<&Vec<u8>> {
        self.samples.get(&sound)
    }

    pub fn missing(&self) -> Vec<Sound> {
        Sound::ALL
            .into_iter()
            .filter(|s| !self.samples.contains_key(s))
            .collect()
    }
}

pub fn load_one(dir: &Path, sound: Sound) -> Result<Vec<u8>, EngineError> {
    let path = dir.join(sound.file_name());
    let unavailable = |reason: String| EngineError::AssetUnavailable {
        sound,
        path: path.clone(),
        reason,
    };
    let bytes = std::fs::read(&path).map_err(|e| unavailable(e.to_string()))?;
    // Decode once up front so a corrupt file is reported at load, not mid-session.
    Decoder::new(BufReader::new(Cursor::new(bytes.clone())))
        .map_err(|e| unavailable(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_yields_empty_bank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bank = SampleBank::load(&dir.path().join("nope"));
        assert_eq!(bank.missing().len(), Sound::ALL.len());
        assert!(bank.get(Sound::Kick).is_none());
    }

    #[test]
    fn garbage_file_is_asset_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(Sound::Snare.file_name()), b"not audio").expect("write");
        let err = load_one(dir.path(), Sound::Snare).expect_err("should fail");
        assert!(matches!(err, EngineError::AssetUnavailable { sound: Sound::Snare, .. }));
        assert!(err.to_string().contains("snare1.mp3"));
    }
}
