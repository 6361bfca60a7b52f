//! # Settings Module
//!
//! The game's settings object and the numeric tuning of the game loop.
//! Settings are validated before a game may start and persisted as JSON.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::error::SettingsError;
use crate::scale::{self, Key, ScaleType};
use crate::stability;
use crate::tuning::{AccidentalMode, TRUMPET_TRANSPOSITION};

pub const START_SPEED_RANGE: RangeInclusive<u32> = 1..=10;

/// Player-facing game settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    pub key: Key,
    pub scale_type: ScaleType,
    pub accidental_mode: AccidentalMode,
    /// Lowest written MIDI note that may be spawned.
    pub range_min_midi: i32,
    /// Highest written MIDI note that may be spawned.
    pub range_max_midi: i32,
    pub start_speed: u32,
    /// 0.0 - 1.0, mapped to a cents tolerance for stable notes.
    pub confidence_threshold: f32,
    pub sfx_enabled: bool,
    /// Semitones between concert and written pitch (2 for a Bb trumpet).
    pub transposition: i32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            key: Key::default(),
            scale_type: ScaleType::Major,
            accidental_mode: AccidentalMode::Auto,
            range_min_midi: 60, // written C4
            range_max_midi: 72, // written C5
            start_speed: 3,
            confidence_threshold: 0.6,
            sfx_enabled: true,
            transposition: TRUMPET_TRANSPOSITION,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (min, max) = (self.range_min_midi, self.range_max_midi);
        if !(0..=127).contains(&min) || !(0..=127).contains(&max) || min > max {
            return Err(SettingsError::InvalidRange { min, max });
        }
        if self.playable_notes().is_empty() {
            return Err(SettingsError::EmptyScale { min, max });
        }
        if !START_SPEED_RANGE.contains(&self.start_speed) {
            return Err(SettingsError::StartSpeedOutOfRange(self.start_speed));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SettingsError::ConfidenceOutOfRange(self.confidence_threshold));
        }
        Ok(())
    }

    /// Written MIDI notes the game may spawn, ascending.
    pub fn playable_notes(&self) -> Vec<i32> {
        scale::scale_notes(
            self.key,
            self.scale_type,
            self.range_min_midi,
            self.range_max_midi,
        )
    }

    pub fn tolerance_cents(&self) -> f32 {
        stability::tolerance_cents(self.confidence_threshold)
    }

    pub fn prefers_flats(&self) -> bool {
        self.key.prefers_flats(self.accidental_mode)
    }
}

/// Numeric constants of the game loop.
#[derive(Debug, Clone, PartialEq)]
pub struct GameTuning {
    /// Speed independent of settings and level, in track units per second.
    pub base_speed: f32,
    /// Speed added per point of `start_speed`.
    pub speed_multiplier: f32,
    pub speed_up_per_level: f32,
    /// Correct hits per level.
    pub level_up_interval: u32,
    /// Track units between the spawn edge (1.0) and the hit-line (0.0).
    pub track_units: f32,
    /// Position at or below which an unhit note is missed.
    pub miss_threshold: f32,
    /// Position below which a missed note has left the screen.
    pub offscreen_position: f32,
    /// How long a hit note stays visible for its flash.
    pub hit_linger: Duration,
    pub starting_lives: u32,
    pub min_spawn_interval_ms: f32,
    pub max_spawn_interval_ms: f32,
    /// Milliseconds of spawn interval removed per unit of speed.
    pub spawn_interval_slope: f32,
    pub points_per_hit: u64,
    pub max_frame_delta: Duration,
}

impl Default for GameTuning {
    fn default() -> Self {
        Self {
            base_speed: 60.0,
            speed_multiplier: 10.0,
            speed_up_per_level: 8.0,
            level_up_interval: 10,
            track_units: 600.0,
            miss_threshold: 0.08,
            offscreen_position: -0.1,
            hit_linger: Duration::from_millis(500),
            starting_lives: 3,
            min_spawn_interval_ms: 800.0,
            max_spawn_interval_ms: 2500.0,
            spawn_interval_slope: 8.0,
            points_per_hit: 10,
            max_frame_delta: Duration::from_millis(250),
        }
    }
}

/// Loads settings from a JSON file; a missing file gives the defaults.
pub fn load_settings(path: impl AsRef<Path>) -> Result<GameSettings, SettingsError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(GameSettings::default());
    }
    let mut file = File::open(path)?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let settings: GameSettings = serde_json::from_str(&data)?;
    settings.validate()?;
    Ok(settings)
}

/// Saves settings as pretty-printed JSON.
pub fn save_settings(settings: &GameSettings, path: impl AsRef<Path>) -> Result<(), SettingsError> {
    let json_string = serde_json::to_string_pretty(settings)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}
