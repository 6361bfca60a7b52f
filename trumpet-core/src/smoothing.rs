//! Exponential smoothing of the cents-deviation signal for the meter.

use crate::PitchSample;

/// Default weight of a new reading.
pub const DEFAULT_SMOOTHING_ALPHA: f32 = 0.13;

/// `smoothed = alpha * new + (1 - alpha) * smoothed`, restarted from zero
/// whenever the detected note changes so deviations of different pitches are
/// never blended.
#[derive(Debug, Clone, PartialEq)]
pub struct CentsSmoother {
    alpha: f32,
    smoothed: f32,
    current_note: Option<(u8, i32)>,
}

impl Default for CentsSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA)
    }
}

impl CentsSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            smoothed: 0.0,
            current_note: None,
        }
    }

    /// Feeds one sample and returns the smoothed deviation.
    pub fn update(&mut self, sample: &PitchSample) -> f32 {
        let note = (sample.note_index, sample.octave);
        if self.current_note != Some(note) {
            self.current_note = Some(note);
            self.smoothed = 0.0;
        }
        self.smoothed =
            self.alpha * sample.cents_deviation as f32 + (1.0 - self.alpha) * self.smoothed;
        self.smoothed
    }

    /// Current smoothed value, if a note is being tracked.
    pub fn value(&self) -> Option<f32> {
        self.current_note.map(|_| self.smoothed)
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
        self.current_note = None;
    }
}
