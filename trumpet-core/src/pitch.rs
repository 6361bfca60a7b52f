//! # Pitch Detection Module
//!
//! Autocorrelation pitch estimation for monophonic brass input.
//!
//! ## Algorithm
//! - RMS noise gate: frames quieter than [`SILENCE_RMS`] are silence
//! - Normalized autocorrelation over lags up to half the frame
//! - The first rising run of correlations above [`GOOD_CORRELATION`] marks
//!   the period; its peak is refined with parabolic interpolation
//! - Frequencies outside [`MIN_FREQUENCY`, `MAX_FREQUENCY`) are discarded

use crate::tuning::{self, A4_FREQUENCY};
use crate::{AnalysisResult, PitchSample};

/// Frames with an RMS below this are treated as silence.
pub const SILENCE_RMS: f32 = 0.01;

/// Correlation a lag must reach to count as a period candidate.
pub const GOOD_CORRELATION: f32 = 0.9;

/// Below this best correlation nothing periodic was found.
pub const MIN_CORRELATION: f32 = 0.01;

pub const MIN_FREQUENCY: f32 = 20.0;
pub const MAX_FREQUENCY: f32 = 2000.0;

/// Root-mean-square level of a frame.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Estimates the fundamental frequency of `signal` by autocorrelation.
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz, within the audible band
/// * `None` - Silence, noise, or no clear period in the frame
pub fn detect_pitch_autocorrelation(signal: &[f32], sample_rate: u32) -> Option<f32> {
    let max_lag = signal.len() / 2;
    if max_lag < 3 || rms(signal) < SILENCE_RMS {
        return None;
    }

    // Energy of the fixed window and of the lagged window, updated per lag.
    let reference_energy: f32 = signal[..max_lag].iter().map(|&s| s * s).sum();
    let mut lagged_energy = reference_energy;

    let mut correlations = vec![0.0f32; max_lag + 1];
    correlations[0] = 1.0;

    let mut best_lag = 0usize;
    let mut best_correlation = 0.0f32;
    let mut last_correlation = 1.0f32;
    let mut found_good = false;

    for lag in 1..max_lag {
        let leaving = signal[lag - 1];
        let entering = signal[lag - 1 + max_lag];
        lagged_energy += entering * entering - leaving * leaving;

        let dot: f32 = signal[..max_lag]
            .iter()
            .zip(&signal[lag..lag + max_lag])
            .map(|(a, b)| a * b)
            .sum();
        let norm = (reference_energy * lagged_energy.max(0.0)).sqrt();
        let correlation = if norm > 1e-12 { dot / norm } else { 0.0 };
        correlations[lag] = correlation;

        if correlation > GOOD_CORRELATION && correlation > last_correlation {
            found_good = true;
            if correlation > best_correlation {
                best_correlation = correlation;
                best_lag = lag;
            }
        } else if found_good {
            // The rising run just ended, so `best_lag + 1 == lag` is available.
            let refined = refine_lag(&correlations, best_lag);
            return frequency_in_band(sample_rate as f32 / refined);
        }
        last_correlation = correlation;
    }

    if best_correlation > MIN_CORRELATION && best_lag > 0 {
        return frequency_in_band(sample_rate as f32 / best_lag as f32);
    }
    None
}

/// Parabolic interpolation of the correlation peak around `lag`.
fn refine_lag(correlations: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag + 1 >= correlations.len() {
        return lag as f32;
    }
    let y1 = correlations[lag - 1];
    let y2 = correlations[lag];
    let y3 = correlations[lag + 1];

    let denominator = y1 - 2.0 * y2 + y3;
    if denominator.abs() < 1e-9 {
        return lag as f32;
    }
    let shift = 0.5 * (y1 - y3) / denominator;
    lag as f32 + shift.clamp(-0.5, 0.5)
}

fn frequency_in_band(frequency: f32) -> Option<f32> {
    if frequency.is_finite() && (MIN_FREQUENCY..MAX_FREQUENCY).contains(&frequency) {
        Some(frequency)
    } else {
        None
    }
}

/// Converts audio frames into [`PitchSample`]s against a reference tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimator {
    sample_rate: u32,
    reference: f32,
}

impl PitchEstimator {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            reference: A4_FREQUENCY,
        }
    }

    /// Uses `reference` Hz as A4 instead of 440 Hz.
    pub fn with_reference(mut self, reference: f32) -> Self {
        self.reference = reference;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn reference(&self) -> f32 {
        self.reference
    }

    /// Estimates the pitch of one frame. `None` means nothing is emitted.
    pub fn estimate(&self, frame: &[f32]) -> Option<PitchSample> {
        detect_pitch_autocorrelation(frame, self.sample_rate).map(|f| self.sample_for(f))
    }

    /// Full per-frame analysis: level plus optional sample.
    pub fn analyse(&self, frame: &[f32]) -> AnalysisResult {
        AnalysisResult {
            rms: rms(frame),
            sample: self.estimate(frame),
        }
    }

    /// Describes an already known frequency as a [`PitchSample`].
    pub fn sample_for(&self, frequency: f32) -> PitchSample {
        let note = tuning::nearest_note(frequency, self.reference);
        PitchSample {
            frequency,
            note_name: tuning::pitch_class_name(note.note_index, false),
            octave: note.octave,
            cents_deviation: note.cents,
            note_index: note.note_index,
        }
    }
}
