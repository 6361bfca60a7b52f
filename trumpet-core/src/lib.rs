// trumpet-core/src/lib.rs

//! The core logic for the trumpet trainer.
//! This crate is responsible for microphone capture, pitch detection,
//! the pitch-matching rhythm game and the practice-session player.
//! It is completely headless and contains no GUI code.

pub mod audio;
pub mod error;
pub mod game;
pub mod highscore;
pub mod listener;
pub mod pitch;
pub mod scale;
pub mod session;
pub mod settings;
pub mod smoothing;
pub mod stability;
pub mod tuning;

/// One pitch estimate, produced at most once per analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSample {
    /// Detected frequency in Hz, within [20, 2000).
    pub frequency: f32,
    /// Pitch-class name of the nearest note (sharp spelling).
    pub note_name: &'static str,
    pub octave: i32,
    /// Signed deviation from the nearest note in cents.
    pub cents_deviation: i32,
    /// Pitch class, 0 = C .. 11 = B.
    pub note_index: u8,
}

impl PitchSample {
    /// MIDI number of the nearest note at concert pitch.
    pub fn concert_midi(&self) -> i32 {
        (self.octave + 1) * 12 + self.note_index as i32
    }
}

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    /// Input level of the frame.
    pub rms: f32,
    /// The pitch estimate, absent for silence or noise.
    pub sample: Option<PitchSample>,
}
