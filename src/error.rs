use std::path::PathBuf;

use thiserror::Error;

use crate::model::rhythm::Sound;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No audio output could be opened; a session cannot start.
    #[error("audio clock unavailable: {0}")]
    ClockUnavailable(String),

    /// A sound could not be loaded. Playback of that sound is skipped; the session continues.
    #[error("sound '{}' unavailable ({}): {}", .sound, .path.display(), .reason)]
    AssetUnavailable {
        sound: Sound,
        path: PathBuf,
        reason: String,
    },
}
