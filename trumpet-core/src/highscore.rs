//! # Highscore Module
//!
//! The game-over record handed to persistence, and a JSON file store for it.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StoreError;
use crate::scale::ScaleType;
use crate::tuning::AccidentalMode;

/// Summary of a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverRecord {
    pub score: u64,
    pub best_streak: u32,
    pub level_reached: u32,
    /// 0.0 - 1.0
    pub accuracy: f32,
    pub notes_correct: u32,
    pub notes_total: u32,
    pub scale_key: String,
    pub scale_type: ScaleType,
    pub accidental_mode: AccidentalMode,
    pub range_min: i32,
    pub range_max: i32,
}

/// Persistence collaborator for finished games.
pub trait HighscoreSink {
    fn record(&mut self, record: &GameOverRecord) -> Result<(), StoreError>;
}

impl HighscoreSink for Vec<GameOverRecord> {
    fn record(&mut self, record: &GameOverRecord) -> Result<(), StoreError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Highscores kept in a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonHighscoreStore {
    path: PathBuf,
    records: Vec<GameOverRecord>,
}

impl JsonHighscoreStore {
    /// Opens the store; a missing file starts an empty one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let mut file = File::open(&path)?;
            let mut data = String::new();
            file.read_to_string(&mut data)?;
            serde_json::from_str(&data)?
        } else {
            Vec::new()
        };
        Ok(Self { path, records })
    }

    pub fn records(&self) -> &[GameOverRecord] {
        &self.records
    }

    /// Best score played in the given key and scale.
    pub fn best_for(&self, scale_key: &str, scale_type: ScaleType) -> Option<&GameOverRecord> {
        self.records
            .iter()
            .filter(|r| r.scale_key == scale_key && r.scale_type == scale_type)
            .max_by_key(|r| r.score)
    }

    /// The `n` highest scores, best first.
    pub fn top(&self, n: usize) -> Vec<&GameOverRecord> {
        let mut sorted: Vec<&GameOverRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.truncate(n);
        sorted
    }

    fn save(&self) -> Result<(), StoreError> {
        let json_string = serde_json::to_string_pretty(&self.records)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

impl HighscoreSink for JsonHighscoreStore {
    fn record(&mut self, record: &GameOverRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        self.save()?;
        info!(score = record.score, path = %self.path.display(), "highscore saved");
        Ok(())
    }
}
