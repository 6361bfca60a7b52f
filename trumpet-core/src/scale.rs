//! Keys, scale types and the playable note set derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tuning::{self, AccidentalMode};

/// A key centre, stored as its pitch class (0 = C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    pitch_class: u8,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key { pitch_class: 0 },
        Key { pitch_class: 1 },
        Key { pitch_class: 2 },
        Key { pitch_class: 3 },
        Key { pitch_class: 4 },
        Key { pitch_class: 5 },
        Key { pitch_class: 6 },
        Key { pitch_class: 7 },
        Key { pitch_class: 8 },
        Key { pitch_class: 9 },
        Key { pitch_class: 10 },
        Key { pitch_class: 11 },
    ];

    pub fn new(pitch_class: u8) -> Self {
        Self { pitch_class: pitch_class % 12 }
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    /// Keys conventionally written with flats: F, Bb, Eb, Ab, Db.
    pub fn uses_flats(&self) -> bool {
        matches!(self.pitch_class, 1 | 3 | 5 | 8 | 10)
    }

    /// Whether notes in this key should be spelled with flats under `mode`.
    pub fn prefers_flats(&self, mode: AccidentalMode) -> bool {
        match mode {
            AccidentalMode::Sharps => false,
            AccidentalMode::Flats => true,
            AccidentalMode::Auto => self.uses_flats(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(tuning::pitch_class_name(self.pitch_class, self.uses_flats()))
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        tuning::parse_pitch_class(s)
            .map(Key::new)
            .ok_or_else(|| format!("unknown key '{s}'"))
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleType {
    #[default]
    Major,
    NaturalMinor,
    HarmonicMinor,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    Chromatic,
}

impl ScaleType {
    pub const ALL: [ScaleType; 7] = [
        ScaleType::Major,
        ScaleType::NaturalMinor,
        ScaleType::HarmonicMinor,
        ScaleType::MajorPentatonic,
        ScaleType::MinorPentatonic,
        ScaleType::Blues,
        ScaleType::Chromatic,
    ];

    /// Semitone steps above the tonic.
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    pub fn contains(&self, key: Key, midi: i32) -> bool {
        let degree = (midi - key.pitch_class() as i32).rem_euclid(12) as u8;
        self.intervals().contains(&degree)
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScaleType::Major => "Major",
            ScaleType::NaturalMinor => "Natural minor",
            ScaleType::HarmonicMinor => "Harmonic minor",
            ScaleType::MajorPentatonic => "Major pentatonic",
            ScaleType::MinorPentatonic => "Minor pentatonic",
            ScaleType::Blues => "Blues",
            ScaleType::Chromatic => "Chromatic",
        };
        f.write_str(label)
    }
}

/// Every MIDI note in `min..=max` that belongs to the scale, ascending.
pub fn scale_notes(key: Key, scale_type: ScaleType, min: i32, max: i32) -> Vec<i32> {
    (min..=max).filter(|&midi| scale_type.contains(key, midi)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_over_one_octave() {
        let notes = scale_notes(Key::new(0), ScaleType::Major, 60, 72);
        assert_eq!(notes, vec![60, 62, 64, 65, 67, 69, 71, 72]);
    }

    #[test]
    fn bb_major_starts_on_bb() {
        let key: Key = "Bb".parse().unwrap();
        let notes = scale_notes(key, ScaleType::Major, 58, 70);
        assert_eq!(notes, vec![58, 60, 62, 63, 65, 67, 69, 70]);
        assert!(key.uses_flats());
        assert_eq!(key.to_string(), "Bb");
    }

    #[test]
    fn key_round_trips_through_json() {
        let key: Key = serde_json::from_str("\"Eb\"").unwrap();
        assert_eq!(key.pitch_class(), 3);
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Eb\"");
        assert!(serde_json::from_str::<Key>("\"X\"").is_err());
    }

    #[test]
    fn accidental_mode_overrides_key_signature() {
        let g = Key::new(7);
        assert!(!g.prefers_flats(AccidentalMode::Auto));
        assert!(g.prefers_flats(AccidentalMode::Flats));
        assert!(!Key::new(5).prefers_flats(AccidentalMode::Sharps));
    }

    #[test]
    fn range_without_scale_notes_is_empty() {
        // C# is not in C major.
        assert!(scale_notes(Key::new(0), ScaleType::Major, 61, 61).is_empty());
    }
}
