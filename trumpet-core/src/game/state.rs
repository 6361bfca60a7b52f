//! Scoring, lives and the game phase.

/// `Idle -> Running <-> Paused -> GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Idle,
    Running,
    Paused,
    /// Terminal until the next start.
    GameOver,
}

/// Outcome of registering a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitScore {
    pub points: u64,
    pub streak: u32,
    pub leveled_up: bool,
}

/// The authoritative record of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub lives: u32,
    pub level: u32,
    pub correct_count: u32,
    pub total_count: u32,
    pub phase: GamePhase,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(3)
    }
}

impl GameState {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            lives,
            level: 1,
            correct_count: 0,
            total_count: 0,
            phase: GamePhase::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Share of resolved notes that were hit, 0.0 - 1.0.
    pub fn accuracy(&self) -> f32 {
        if self.total_count == 0 {
            0.0
        } else {
            self.correct_count as f32 / self.total_count as f32
        }
    }

    /// Streak first, then `points_per_hit * streak`; the level follows the
    /// correct count immediately.
    pub fn register_hit(&mut self, points_per_hit: u64, level_up_interval: u32) -> HitScore {
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        let points = points_per_hit * self.streak as u64;
        self.score += points;
        self.correct_count += 1;
        self.total_count += 1;

        let interval = level_up_interval.max(1);
        let level = 1 + self.correct_count / interval;
        let leveled_up = level > self.level;
        self.level = self.level.max(level);

        HitScore {
            points,
            streak: self.streak,
            leveled_up,
        }
    }

    /// Costs a life and the streak. Returns `true` if this miss ended the game.
    pub fn register_miss(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        self.streak = 0;
        self.total_count += 1;
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = GamePhase::GameOver;
            return true;
        }
        false
    }
}
