//! Rhythm practice engine: a looping drum pattern scheduled against an audio
//! clock, pad hits captured on the same clock, and a rolling accuracy score.

pub mod audio;
pub mod console;
pub mod engine;
pub mod error;
pub mod model;
pub mod storage;

pub use engine::{Engine, EngineConfig, Feedback, Phase};
pub use error::EngineError;
