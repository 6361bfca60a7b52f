//! # Game Engine
//!
//! Single owner of the game: note stream, particles, score state and the
//! frame clock. The host calls [`GameEngine::tick`] once per display frame
//! while the game runs and [`GameEngine::check_hit`] whenever a stable pitch
//! arrives, never from inside a tick.
//!
//! ## Frame order
//! 1. Move notes and particles by the measured frame delta
//! 2. Resolve misses at the hit-line
//! 3. Remove finished notes
//! 4. Spawn a new note when the spawn interval has elapsed

use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::notes::{GameNote, NotePicker, NoteStream};
use super::particles::{BURST_SIZE, Particle, ParticleSystem};
use super::state::{GamePhase, GameState};
use crate::error::SettingsError;
use crate::highscore::GameOverRecord;
use crate::settings::{GameSettings, GameTuning};

/// Audio feedback requested by the game. Only queued with sfx enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Hit,
    Miss,
    LevelUp,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    pub note_id: u64,
    pub points: u64,
    pub streak: u32,
    pub level: u32,
    pub leveled_up: bool,
}

/// Time between successive frames. The first frame after a reset has a
/// zero delta, so pauses never turn into a jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    max_delta: Duration,
}

impl FrameClock {
    pub fn new(max_delta: Duration) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    pub fn delta(&mut self, now: Instant) -> Duration {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).min(self.max_delta),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub struct GameEngine {
    settings: GameSettings,
    tuning: GameTuning,
    playable: Vec<i32>,
    state: GameState,
    notes: NoteStream,
    particles: ParticleSystem,
    picker: NotePicker,
    clock: FrameClock,
    elapsed: Duration,
    since_spawn: Duration,
    game_over_record: Option<GameOverRecord>,
    cues: Vec<SoundCue>,
}

impl GameEngine {
    pub fn new(settings: GameSettings, tuning: GameTuning) -> Result<Self, SettingsError> {
        Self::build(
            settings,
            tuning,
            NotePicker::from_entropy(),
            ParticleSystem::new(rand::random()),
        )
    }

    /// Deterministic engine for replays and tests.
    pub fn with_seed(
        settings: GameSettings,
        tuning: GameTuning,
        seed: u64,
    ) -> Result<Self, SettingsError> {
        Self::build(
            settings,
            tuning,
            NotePicker::new(seed),
            ParticleSystem::new(seed),
        )
    }

    fn build(
        settings: GameSettings,
        tuning: GameTuning,
        picker: NotePicker,
        particles: ParticleSystem,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let playable = settings.playable_notes();
        Ok(Self {
            state: GameState::new(tuning.starting_lives),
            clock: FrameClock::new(tuning.max_frame_delta),
            settings,
            tuning,
            playable,
            notes: NoteStream::new(),
            particles,
            picker,
            elapsed: Duration::ZERO,
            since_spawn: Duration::ZERO,
            game_over_record: None,
            cues: Vec::new(),
        })
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn notes(&self) -> &[GameNote] {
        self.notes.notes()
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn playable_notes(&self) -> &[i32] {
        &self.playable
    }

    /// Running game time, excluding pauses.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Replaces the settings. New pitches and speed apply from the next
    /// spawn and frame.
    pub fn update_settings(&mut self, settings: GameSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.playable = settings.playable_notes();
        self.settings = settings;
        Ok(())
    }

    /// Current speed in track units per second.
    pub fn speed(&self) -> f32 {
        self.tuning.base_speed
            + self.settings.start_speed as f32 * self.tuning.speed_multiplier
            + (self.state.level.saturating_sub(1)) as f32 * self.tuning.speed_up_per_level
    }

    /// Current speed in track lengths per second.
    pub fn normalized_speed(&self) -> f32 {
        self.speed() / self.tuning.track_units
    }

    pub fn spawn_interval(&self) -> Duration {
        let ms = (self.tuning.max_spawn_interval_ms - self.speed() * self.tuning.spawn_interval_slope)
            .max(self.tuning.min_spawn_interval_ms);
        Duration::from_micros((ms * 1000.0).round() as u64)
    }

    /// Vertical lane of a pitch within the configured range, 0.0 - 1.0.
    pub fn lane_of(&self, pitch: i32) -> f32 {
        let (min, max) = (self.settings.range_min_midi, self.settings.range_max_midi);
        if max <= min {
            return 0.5;
        }
        ((pitch - min) as f32 / (max - min) as f32).clamp(0.0, 1.0)
    }

    /// Starts (or restarts) a game from a clean slate.
    pub fn start_game(&mut self) {
        self.state = GameState::new(self.tuning.starting_lives);
        self.state.phase = GamePhase::Running;
        self.notes.clear();
        self.particles.clear();
        self.picker.reset();
        self.clock.reset();
        self.elapsed = Duration::ZERO;
        // The first note appears on the first frame.
        self.since_spawn = self.spawn_interval();
        self.game_over_record = None;
        self.cues.clear();
        info!(
            key = %self.settings.key,
            scale = %self.settings.scale_type,
            notes = self.playable.len(),
            "game started"
        );
    }

    pub fn restart(&mut self) {
        self.start_game();
    }

    /// Freezes the game; notes and particles are kept.
    pub fn pause(&mut self) {
        if self.state.phase == GamePhase::Running {
            self.state.phase = GamePhase::Paused;
            self.clock.reset();
            debug!("game paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state.phase == GamePhase::Paused {
            self.state.phase = GamePhase::Running;
            self.clock.reset();
            debug!("game resumed");
        }
    }

    /// Abandons the current game without a game-over record.
    pub fn stop(&mut self) {
        self.state.phase = GamePhase::Idle;
        self.notes.clear();
        self.particles.clear();
        self.clock.reset();
    }

    /// Advances the game to the display frame at `now`.
    pub fn tick(&mut self, now: Instant) {
        if !self.state.is_running() {
            return;
        }
        let dt = self.clock.delta(now);
        self.advance(dt);
    }

    /// Advances the simulation by `dt` of game time.
    pub fn advance(&mut self, dt: Duration) {
        if !self.state.is_running() {
            return;
        }
        self.elapsed += dt;
        let seconds = dt.as_secs_f32();

        self.notes.advance(self.normalized_speed() * seconds);
        self.particles.update(seconds);

        while let Some((id, pitch)) = self
            .notes
            .next_miss(self.tuning.miss_threshold)
            .map(|n| (n.id, n.pitch))
        {
            debug!(id, pitch, "note missed");
            self.cue(SoundCue::Miss);
            if self.state.register_miss() {
                self.finish();
                return;
            }
        }

        self.notes.cleanup(
            self.elapsed,
            self.tuning.hit_linger,
            self.tuning.offscreen_position,
        );

        self.since_spawn += dt;
        let interval = self.spawn_interval();
        if self.since_spawn >= interval {
            // Keep the overshoot so the cadence does not drift with the frame
            // rate; at most one frame's worth carries over.
            self.since_spawn = (self.since_spawn - interval).min(dt);
            self.spawn_note();
        }
    }

    fn spawn_note(&mut self) {
        if let Some(pitch) = self.picker.pick(&self.playable) {
            let id = self.notes.spawn(pitch);
            debug!(id, pitch, "note spawned");
        }
    }

    /// Resolves a played written pitch against the pending notes. The most
    /// urgent matching note is hit; without one this is a no-op.
    pub fn check_hit(&mut self, written_midi: i32) -> Option<HitResult> {
        if !self.state.is_running() {
            return None;
        }
        let index = self.notes.hit_candidate(written_midi)?;
        let (note_id, position) = self
            .notes
            .mark_hit(index, self.elapsed)
            .map(|n| (n.id, n.position))?;

        let lane = self.lane_of(written_midi);
        self.particles.burst(position.max(0.0), lane, BURST_SIZE);

        let score = self
            .state
            .register_hit(self.tuning.points_per_hit, self.tuning.level_up_interval);
        debug!(note_id, points = score.points, streak = score.streak, "note hit");
        self.cue(SoundCue::Hit);
        if score.leveled_up {
            info!(level = self.state.level, speed = self.speed(), "level up");
            self.cue(SoundCue::LevelUp);
        }

        Some(HitResult {
            note_id,
            points: score.points,
            streak: score.streak,
            level: self.state.level,
            leveled_up: score.leveled_up,
        })
    }

    fn finish(&mut self) {
        self.state.phase = GamePhase::GameOver;
        self.clock.reset();
        let record = self.record();
        info!(
            score = record.score,
            level = record.level_reached,
            accuracy = record.accuracy,
            "game over"
        );
        self.cue(SoundCue::GameOver);
        self.game_over_record = Some(record);
    }

    fn record(&self) -> GameOverRecord {
        GameOverRecord {
            score: self.state.score,
            best_streak: self.state.best_streak,
            level_reached: self.state.level,
            accuracy: self.state.accuracy(),
            notes_correct: self.state.correct_count,
            notes_total: self.state.total_count,
            scale_key: self.settings.key.to_string(),
            scale_type: self.settings.scale_type,
            accidental_mode: self.settings.accidental_mode,
            range_min: self.settings.range_min_midi,
            range_max: self.settings.range_max_midi,
        }
    }

    /// The record of the last game-over, handed out exactly once.
    pub fn take_game_over_record(&mut self) -> Option<GameOverRecord> {
        self.game_over_record.take()
    }

    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    fn cue(&mut self, cue: SoundCue) {
        if self.settings.sfx_enabled {
            self.cues.push(cue);
        }
    }
}
