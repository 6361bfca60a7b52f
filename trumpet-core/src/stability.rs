//! # Note Stability Module
//!
//! Turns the per-frame pitch stream into discrete pitch-update events for the
//! game. A note counts once it has been held in tune for a few consecutive
//! frames, and keeps being reported on every frame it stays stable, so a
//! held note also meets notes that arrive after its onset.

use std::collections::VecDeque;

use crate::tuning;
use crate::PitchSample;

/// Consecutive in-tolerance frames required before a note is reported.
pub const STABLE_FRAMES: usize = 3;

/// Confidence threshold upper bounds and the cents window they allow.
const TOLERANCE_TABLE: [(f32, f32); 4] = [(0.25, 45.0), (0.5, 35.0), (0.75, 25.0), (1.0, 15.0)];

/// Maps the confidence-threshold setting (0.0 - 1.0) to a cents tolerance.
/// Higher confidence demands a tighter window.
pub fn tolerance_cents(confidence_threshold: f32) -> f32 {
    TOLERANCE_TABLE
        .iter()
        .find(|(upper, _)| confidence_threshold <= *upper)
        .map(|(_, cents)| *cents)
        .unwrap_or(TOLERANCE_TABLE[TOLERANCE_TABLE.len() - 1].1)
}

/// A stable note, expressed as written pitch for the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchUpdate {
    pub written_midi: i32,
}

#[derive(Debug, Clone)]
pub struct NoteStabilizer {
    tolerance_cents: f32,
    required_frames: usize,
    transposition: i32,
    window: VecDeque<i32>,
}

impl NoteStabilizer {
    pub fn new(tolerance_cents: f32, transposition: i32) -> Self {
        Self {
            tolerance_cents,
            required_frames: STABLE_FRAMES,
            transposition,
            window: VecDeque::with_capacity(STABLE_FRAMES),
        }
    }

    pub fn with_required_frames(mut self, frames: usize) -> Self {
        self.required_frames = frames.max(1);
        self
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance_cents
    }

    /// Feeds one frame's result; `None` is a silent frame.
    pub fn push(&mut self, sample: Option<&PitchSample>) -> Option<PitchUpdate> {
        let Some(sample) = sample else {
            self.window.clear();
            return None;
        };

        if sample.cents_deviation.unsigned_abs() as f32 > self.tolerance_cents {
            self.window.clear();
            return None;
        }

        let written = tuning::concert_to_written(sample.concert_midi(), self.transposition);
        self.window.push_back(written);
        if self.window.len() > self.required_frames {
            self.window.pop_front();
        }

        let stable = self.window.len() == self.required_frames
            && self.window.iter().all(|&midi| midi == written);
        stable.then_some(PitchUpdate {
            written_midi: written,
        })
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
