use std::f32::consts::PI;

use trumpet_core::pitch::{PitchEstimator, detect_pitch_autocorrelation};
use trumpet_core::stability::NoteStabilizer;
use trumpet_core::tuning::midi_to_frequency;

const SAMPLE_RATE: u32 = 44100;
const FRAME: usize = 2048;

fn sine(freq: f32, amplitude: f32) -> Vec<f32> {
    (0..FRAME)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// A brassy tone: fundamental plus decaying harmonics.
fn brass(freq: f32) -> Vec<f32> {
    (0..FRAME)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (1..=4)
                .map(|h| 0.4 / h as f32 * (2.0 * PI * freq * h as f32 * t).sin())
                .sum()
        })
        .collect()
}

fn assert_close(detected: f32, expected: f32) {
    let error = (detected - expected).abs() / expected;
    assert!(
        error < 0.01,
        "expected {expected} Hz, detected {detected} Hz"
    );
}

#[test]
fn pure_tones_across_the_trumpet_range() {
    for freq in [164.81, 233.08, 329.63, 440.0, 587.33, 880.0] {
        let detected = detect_pitch_autocorrelation(&sine(freq, 0.5), SAMPLE_RATE)
            .unwrap_or_else(|| panic!("no pitch for {freq} Hz"));
        assert_close(detected, freq);
    }
}

#[test]
fn harmonic_tones_report_the_fundamental() {
    for freq in [233.08, 349.23, 466.16] {
        let detected = detect_pitch_autocorrelation(&brass(freq), SAMPLE_RATE)
            .unwrap_or_else(|| panic!("no pitch for {freq} Hz"));
        assert_close(detected, freq);
    }
}

#[test]
fn a4_is_named_with_small_deviation() {
    let estimator = PitchEstimator::new(SAMPLE_RATE);
    let sample = estimator.estimate(&sine(440.0, 0.5)).unwrap();
    assert_eq!(sample.note_name, "A");
    assert_eq!(sample.octave, 4);
    assert_eq!(sample.note_index, 9);
    assert!(sample.cents_deviation.abs() <= 5, "{sample:?}");
    assert_eq!(sample.concert_midi(), 69);
}

#[test]
fn deviation_is_measured_against_the_reference() {
    let estimator = PitchEstimator::new(SAMPLE_RATE).with_reference(442.0);
    let sample = estimator.estimate(&sine(442.0, 0.5)).unwrap();
    assert_eq!(sample.note_name, "A");
    assert!(sample.cents_deviation.abs() <= 5, "{sample:?}");

    // 440 Hz is about 8 cents flat of A4 = 442 Hz.
    let flat = estimator.estimate(&sine(440.0, 0.5)).unwrap();
    assert_eq!(flat.note_name, "A");
    assert!((-13..=-3).contains(&flat.cents_deviation), "{flat:?}");
}

#[test]
fn silence_and_noise_floor_produce_nothing() {
    let estimator = PitchEstimator::new(SAMPLE_RATE);
    assert!(estimator.estimate(&vec![0.0; FRAME]).is_none());

    let result = estimator.analyse(&sine(440.0, 0.001));
    assert!(result.sample.is_none());
    assert!(result.rms < 0.01);
}

#[test]
fn stable_concert_pitch_becomes_a_written_note() {
    let estimator = PitchEstimator::new(SAMPLE_RATE);
    let mut stabilizer = NoteStabilizer::new(35.0, 2);
    // Concert Bb4 sounds as written C5 on a Bb trumpet.
    let frame = sine(midi_to_frequency(70, 440.0), 0.5);

    let updates: Vec<_> = (0..5)
        .map(|_| {
            let sample = estimator.estimate(&frame);
            stabilizer.push(sample.as_ref())
        })
        .collect();

    // Reported from the third frame on, for as long as it is held.
    assert!(updates[..2].iter().all(Option::is_none));
    assert!(updates[2..].iter().all(|u| u.map(|u| u.written_midi) == Some(72)));
}
