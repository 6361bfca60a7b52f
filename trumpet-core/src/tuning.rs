//! # Musical Tuning Module
//!
//! Equal-temperament note arithmetic for the trainer: frequency to semitone
//! offset, cents deviation, pitch-class naming and the concert/written pitch
//! shift of a transposing trumpet.
//!
//! ## Conventions
//! - Semitone offsets are measured from the reference pitch A4 (default 440 Hz)
//! - Pitch classes are C-based: 0 = C, 9 = A, 11 = B
//! - MIDI 69 is A4; octave numbers follow scientific pitch notation (C4 = 60)

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard concert pitch for A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI number of A4.
pub const A4_MIDI: i32 = 69;

/// A B-flat trumpet sounds a major second below the written note.
pub const TRUMPET_TRANSPOSITION: i32 = 2;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Lookup for parsing pitch-class names in either spelling.
static PITCH_CLASS_MAP: Lazy<BTreeMap<String, u8>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    for (i, (sharp, flat)) in SHARP_NAMES.iter().zip(FLAT_NAMES.iter()).enumerate() {
        map.insert(sharp.to_lowercase(), i as u8);
        map.insert(flat.to_lowercase(), i as u8);
    }
    // Enharmonic spellings that fall outside the two tables.
    map.insert("cb".to_string(), 11);
    map.insert("b#".to_string(), 0);
    map.insert("fb".to_string(), 4);
    map.insert("e#".to_string(), 5);
    map
});

/// How accidentals are spelled when a pitch is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccidentalMode {
    Sharps,
    Flats,
    /// Follow the key signature of the selected key.
    #[default]
    Auto,
}

impl AccidentalMode {
    pub const ALL: [AccidentalMode; 3] = [
        AccidentalMode::Auto,
        AccidentalMode::Sharps,
        AccidentalMode::Flats,
    ];
}

impl std::fmt::Display for AccidentalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AccidentalMode::Sharps => "Sharps",
            AccidentalMode::Flats => "Flats",
            AccidentalMode::Auto => "Auto",
        };
        f.write_str(label)
    }
}

/// The nearest equal-tempered note to a measured frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestNote {
    /// Whole semitones above (or below) the reference A4.
    pub semitones: i32,
    /// Signed deviation from that note, rounded to whole cents.
    pub cents: i32,
    /// Pitch class, 0 = C .. 11 = B.
    pub note_index: u8,
    pub octave: i32,
}

impl NearestNote {
    /// MIDI number of the note at concert pitch.
    pub fn midi(&self) -> i32 {
        A4_MIDI + self.semitones
    }
}

/// Fractional semitone offset of `freq` from `reference`.
pub fn semitones_from_reference(freq: f32, reference: f32) -> f32 {
    12.0 * (freq / reference).log2()
}

/// Finds the nearest equal-tempered note and the cents deviation from it.
pub fn nearest_note(freq: f32, reference: f32) -> NearestNote {
    let offset = semitones_from_reference(freq, reference);
    let semitones = offset.round() as i32;
    let cents = ((offset - semitones as f32) * 100.0).round() as i32;

    // +9 anchors the C-based pitch classes at A4.
    let shifted = semitones + 9;
    NearestNote {
        semitones,
        cents,
        note_index: shifted.rem_euclid(12) as u8,
        octave: 4 + shifted.div_euclid(12),
    }
}

/// Frequency of a MIDI note against the given A4 reference.
pub fn midi_to_frequency(midi: i32, reference: f32) -> f32 {
    reference * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Name of a pitch class in the requested spelling.
pub fn pitch_class_name(note_index: u8, prefer_flats: bool) -> &'static str {
    let names = if prefer_flats { &FLAT_NAMES } else { &SHARP_NAMES };
    names[(note_index % 12) as usize]
}

/// Parses a pitch-class name such as `"Bb"`, `"C#"` or `"f"`.
pub fn parse_pitch_class(name: &str) -> Option<u8> {
    PITCH_CLASS_MAP.get(&name.trim().to_lowercase()).copied()
}

/// Full note name of a MIDI number, e.g. `"Bb4"`.
pub fn midi_note_name(midi: i32, prefer_flats: bool) -> String {
    let name = pitch_class_name(midi.rem_euclid(12) as u8, prefer_flats);
    format!("{}{}", name, midi.div_euclid(12) - 1)
}

/// Written pitch of a sounding note for an instrument pitched `transposition`
/// semitones below concert pitch.
pub fn concert_to_written(concert_midi: i32, transposition: i32) -> i32 {
    concert_midi + transposition
}

pub fn written_to_concert(written_midi: i32, transposition: i32) -> i32 {
    written_midi - transposition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_maps_to_itself() {
        let note = nearest_note(440.0, A4_FREQUENCY);
        assert_eq!(note.semitones, 0);
        assert_eq!(note.cents, 0);
        assert_eq!(note.note_index, 9);
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi(), 69);
    }

    #[test]
    fn octave_rolls_over_at_c() {
        // B4 and C5 straddle the octave boundary.
        let b4 = nearest_note(midi_to_frequency(71, A4_FREQUENCY), A4_FREQUENCY);
        let c5 = nearest_note(midi_to_frequency(72, A4_FREQUENCY), A4_FREQUENCY);
        assert_eq!((b4.note_index, b4.octave), (11, 4));
        assert_eq!((c5.note_index, c5.octave), (0, 5));

        let c4 = nearest_note(261.63, A4_FREQUENCY);
        assert_eq!((c4.note_index, c4.octave), (0, 4));
        let a3 = nearest_note(220.0, A4_FREQUENCY);
        assert_eq!((a3.note_index, a3.octave), (9, 3));
    }

    #[test]
    fn cents_are_signed() {
        let sharp = nearest_note(445.0, A4_FREQUENCY);
        assert_eq!(sharp.semitones, 0);
        assert_eq!(sharp.cents, 20);

        let flat = nearest_note(435.0, A4_FREQUENCY);
        assert_eq!(flat.cents, -20);
    }

    #[test]
    fn reference_shifts_the_grid() {
        let note = nearest_note(442.0, 442.0);
        assert_eq!(note.cents, 0);
        assert_eq!(note.note_index, 9);
    }

    #[test]
    fn names_and_parsing() {
        assert_eq!(midi_note_name(70, true), "Bb4");
        assert_eq!(midi_note_name(70, false), "A#4");
        assert_eq!(midi_note_name(60, false), "C4");
        assert_eq!(parse_pitch_class("Bb"), Some(10));
        assert_eq!(parse_pitch_class("a#"), Some(10));
        assert_eq!(parse_pitch_class("H"), None);
    }

    #[test]
    fn trumpet_reads_a_tone_higher() {
        // Concert Bb3 is written C4 for a Bb trumpet.
        assert_eq!(concert_to_written(58, TRUMPET_TRANSPOSITION), 60);
        assert_eq!(written_to_concert(60, TRUMPET_TRANSPOSITION), 58);
    }
}
