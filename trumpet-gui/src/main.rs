//! # Trumpet Trainer GUI
//!
//! Desktop front-end for the trumpet trainer: the pitch-matching note game
//! and the practice-session player.
//!
//! ## Architecture
//! - **Main Thread**: Iced application, owns the game engine and the player
//! - **Audio Thread**: `PitchListener` worker, owned by the app while listening
//! - **Updates**: 60 FPS frame subscription while the game or the listener runs,
//!   plus a one-second subscription keyed by the active session countdown

mod ui;

use anyhow::Context;
use iced::{Element, Event, Subscription, Task, Theme, event, window};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use trumpet_core::{
    AnalysisResult, PitchSample,
    game::{GameEngine, GameNote, GameState, Particle, SoundCue},
    highscore::{HighscoreSink, JsonHighscoreStore},
    listener::PitchListener,
    scale::{Key, ScaleType},
    session::{SessionLibrary, SessionPlayer, TimerId},
    settings::{self, GameSettings, GameTuning},
    smoothing::CentsSmoother,
    stability::NoteStabilizer,
    tuning::{A4_FREQUENCY, AccidentalMode},
};
use ui::main_display::create_main_view;

const SETTINGS_FILE: &str = "trumpet_settings.json";
const HIGHSCORE_FILE: &str = "highscores.json";
const SESSIONS_FILE: &str = "data/sessions.json";

/// How long a sound cue stays visible on the hit-line.
const CUE_FLASH: Duration = Duration::from_millis(200);

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("starting trumpet trainer");
    let app = TrainerApp::load()?;
    iced::application("Trumpet Trainer", TrainerApp::update, TrainerApp::view)
        .subscription(TrainerApp::subscription)
        .theme(TrainerApp::theme)
        .run_with(move || (app, Task::none()))?;
    info!("trumpet trainer finished");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Game,
    Session,
}

#[derive(Debug, Clone)]
pub enum Message {
    SelectTab(Tab),

    // Game controls
    StartGame,
    PauseGame,
    ResumeGame,
    RestartGame,
    StopGame,
    RetryMicrophone,

    // Settings
    KeySelected(Key),
    ScaleSelected(ScaleType),
    AccidentalsSelected(AccidentalMode),
    StartSpeedChanged(u32),
    ConfidenceChanged(f32),
    RangeMinChanged(i32),
    RangeMaxChanged(i32),
    SfxToggled(bool),

    // Session player
    OpenSession(String),
    SessionLinkChanged(String),
    OpenSessionLink,
    CloseSession,
    SessionTick(TimerId),
    VideoEnded,
    TogglePdfTimer,
    ExtendCountdown,
    SkipBreak,
    NextItem,
    PrevItem,
    JumpTo(usize),
    ReplayItem,
    RestartSession,

    // Window and frame events
    WindowFocused,
    WindowUnfocused,
    Frame(Instant),
}

/// Snapshot of everything the game tab draws.
#[derive(Debug, Clone)]
pub struct GameDisplay {
    pub settings: GameSettings,
    pub state: GameState,
    pub notes: Vec<GameNote>,
    pub particles: Vec<Particle>,
    pub speed: f32,
    pub last_sample: Option<PitchSample>,
    pub smoothed_cents: Option<f32>,
    pub last_written: Option<i32>,
    pub tolerance_cents: f32,
    pub listening: bool,
    pub mic_error: Option<String>,
    pub settings_error: Option<String>,
    pub best_score: Option<u64>,
    pub cue: Option<SoundCue>,
}

/// The share-link field of the session picker and the result of the last
/// lookup.
#[derive(Debug, Clone, Default)]
pub struct SessionLookup {
    pub link: String,
    pub not_found: Option<String>,
}

struct TrainerApp {
    tab: Tab,
    settings_path: PathBuf,
    engine: GameEngine,
    listener: PitchListener,
    smoother: CentsSmoother,
    stabilizer: NoteStabilizer,
    last_sample: Option<PitchSample>,
    last_written: Option<i32>,
    mic_error: Option<String>,
    settings_error: Option<String>,
    highscores: Option<JsonHighscoreStore>,
    cue: Option<(SoundCue, Instant)>,
    library: SessionLibrary,
    lookup: SessionLookup,
    player: Option<SessionPlayer>,
}

impl TrainerApp {
    /// Loads settings, highscores and sessions. Broken files are logged and
    /// replaced by defaults so the app still opens.
    fn load() -> anyhow::Result<Self> {
        let settings_path = PathBuf::from(SETTINGS_FILE);
        let settings = settings::load_settings(&settings_path).unwrap_or_else(|e| {
            warn!("could not load settings, using defaults: {}", e);
            GameSettings::default()
        });
        let engine = GameEngine::new(settings.clone(), GameTuning::default())
            .context("creating the game engine")?;

        let highscores = match JsonHighscoreStore::open(HIGHSCORE_FILE) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("highscores unavailable: {}", e);
                None
            }
        };
        let library = SessionLibrary::load(SESSIONS_FILE).unwrap_or_else(|e| {
            warn!("could not load sessions from {}: {}", SESSIONS_FILE, e);
            SessionLibrary::default()
        });
        info!(sessions = library.sessions().len(), "session library loaded");

        Ok(Self {
            tab: Tab::Game,
            settings_path,
            stabilizer: NoteStabilizer::new(settings.tolerance_cents(), settings.transposition),
            engine,
            listener: PitchListener::new(),
            smoother: CentsSmoother::default(),
            last_sample: None,
            last_written: None,
            mic_error: None,
            settings_error: None,
            highscores,
            cue: None,
            library,
            lookup: SessionLookup::default(),
            player: None,
        })
    }

    fn update(&mut self, message: Message) {
        debug!(?message, "update");

        match message {
            Message::SelectTab(tab) => {
                if tab == Tab::Session {
                    self.engine.pause();
                }
                self.tab = tab;
            }
            Message::StartGame | Message::RestartGame => {
                if self.ensure_listening() {
                    self.reset_pitch_tracking();
                    self.engine.start_game();
                }
            }
            Message::PauseGame => self.engine.pause(),
            Message::ResumeGame => {
                if self.ensure_listening() {
                    self.engine.resume();
                }
            }
            Message::StopGame => {
                self.engine.stop();
                self.stop_listening();
            }
            Message::RetryMicrophone => {
                self.ensure_listening();
            }

            Message::KeySelected(key) => self.change_settings(|s| s.key = key),
            Message::ScaleSelected(scale_type) => self.change_settings(|s| s.scale_type = scale_type),
            Message::AccidentalsSelected(mode) => self.change_settings(|s| s.accidental_mode = mode),
            Message::StartSpeedChanged(speed) => self.change_settings(|s| s.start_speed = speed),
            Message::ConfidenceChanged(threshold) => {
                self.change_settings(|s| s.confidence_threshold = threshold)
            }
            Message::RangeMinChanged(midi) => self.change_settings(|s| s.range_min_midi = midi),
            Message::RangeMaxChanged(midi) => self.change_settings(|s| s.range_max_midi = midi),
            Message::SfxToggled(enabled) => self.change_settings(|s| s.sfx_enabled = enabled),

            Message::OpenSession(id) => self.open_session(&id),
            Message::SessionLinkChanged(link) => {
                self.lookup.link = link;
                self.lookup.not_found = None;
            }
            Message::OpenSessionLink => {
                let link = self.lookup.link.clone();
                self.open_session(&link);
            }
            Message::CloseSession => self.player = None,
            Message::SessionTick(id) => self.with_player(|p| p.on_timer_tick(id)),
            Message::VideoEnded => self.with_player(SessionPlayer::video_ended),
            Message::TogglePdfTimer => self.with_player(SessionPlayer::toggle_pdf_timer),
            Message::ExtendCountdown => self.with_player(SessionPlayer::extend),
            Message::SkipBreak => self.with_player(SessionPlayer::skip_break),
            Message::NextItem => self.with_player(SessionPlayer::go_next),
            Message::PrevItem => self.with_player(SessionPlayer::go_prev),
            Message::JumpTo(index) => self.with_player(|p| p.jump_to(index)),
            Message::ReplayItem => self.with_player(SessionPlayer::replay),
            Message::RestartSession => self.with_player(SessionPlayer::restart),

            Message::WindowUnfocused => {
                self.listener.suspend();
                self.engine.pause();
            }
            Message::WindowFocused => self.listener.resume(),
            Message::Frame(now) => self.on_frame(now),
        }
    }

    fn with_player(&mut self, f: impl FnOnce(&mut SessionPlayer)) {
        if let Some(player) = self.player.as_mut() {
            f(player);
        }
    }

    /// Starts the microphone if needed. On failure the game stays stopped
    /// and the error is shown inline with a retry button.
    fn open_session(&mut self, reference: &str) {
        match self.library.resolve(reference) {
            Ok(session) => {
                info!(session = %session.name, "opening practice session");
                self.player = Some(SessionPlayer::new(session));
                self.lookup = SessionLookup::default();
            }
            Err(e) => {
                warn!("{}", e);
                self.lookup.not_found = Some(e.to_string());
            }
        }
    }

    fn ensure_listening(&mut self) -> bool {
        if self.listener.is_listening() {
            return true;
        }
        match self.listener.start_default(A4_FREQUENCY) {
            Ok(()) => {
                self.mic_error = None;
                true
            }
            Err(e) => {
                warn!("microphone unavailable: {}", e);
                self.mic_error = Some(e.user_message());
                false
            }
        }
    }

    fn stop_listening(&mut self) {
        self.listener.stop();
        self.reset_pitch_tracking();
    }

    fn reset_pitch_tracking(&mut self) {
        self.smoother.reset();
        self.stabilizer.reset();
        self.last_sample = None;
        self.last_written = None;
    }

    fn change_settings(&mut self, edit: impl FnOnce(&mut GameSettings)) {
        let mut settings = self.engine.settings().clone();
        edit(&mut settings);
        if let Err(e) = self.engine.update_settings(settings.clone()) {
            self.settings_error = Some(e.to_string());
            return;
        }
        self.settings_error = None;
        self.stabilizer = NoteStabilizer::new(settings.tolerance_cents(), settings.transposition);
        if let Err(e) = settings::save_settings(&settings, &self.settings_path) {
            warn!("could not save settings: {}", e);
        }
    }

    fn on_frame(&mut self, now: Instant) {
        // Pitch updates are applied between frames, never inside a tick.
        for result in self.listener.drain() {
            self.process_analysis_result(result);
        }

        if let Some(fault) = self.listener.take_fault() {
            warn!("microphone input failed: {}", fault);
            self.mic_error = Some(fault.user_message());
        }
        if self.engine.state().is_running() && !self.listener.is_listening() {
            warn!("microphone input stopped during a game");
            self.engine.pause();
            self.mic_error
                .get_or_insert_with(|| "Microphone input stopped. Try again.".to_string());
        }

        self.engine.tick(now);

        if let Some(cue) = self.engine.drain_cues().pop() {
            self.cue = Some((cue, now));
        }
        if self.cue.is_some_and(|(_, at)| now.saturating_duration_since(at) > CUE_FLASH) {
            self.cue = None;
        }

        if let Some(record) = self.engine.take_game_over_record() {
            if let Some(store) = self.highscores.as_mut() {
                if let Err(e) = store.record(&record) {
                    warn!("could not save highscore: {}", e);
                }
            }
            self.stop_listening();
        }
    }

    /// Feeds one analysis frame through smoothing and stabilisation, and
    /// resolves stable notes against the game.
    fn process_analysis_result(&mut self, result: AnalysisResult) {
        let update = self.stabilizer.push(result.sample.as_ref());
        match result.sample {
            Some(sample) => {
                self.smoother.update(&sample);
                self.last_sample = Some(sample);
            }
            None => {
                self.smoother.reset();
                self.last_sample = None;
            }
        }

        if let Some(update) = update {
            self.last_written = Some(update.written_midi);
            if let Some(hit) = self.engine.check_hit(update.written_midi) {
                debug!(note = hit.note_id, score = hit.points, "hit");
            }
        }
    }

    fn display(&self) -> GameDisplay {
        let settings = self.engine.settings().clone();
        let best_score = self
            .highscores
            .as_ref()
            .and_then(|store| store.best_for(&settings.key.to_string(), settings.scale_type))
            .map(|record| record.score);
        GameDisplay {
            tolerance_cents: self.stabilizer.tolerance(),
            settings,
            state: self.engine.state().clone(),
            notes: self.engine.notes().to_vec(),
            particles: self.engine.particles().to_vec(),
            speed: self.engine.speed(),
            last_sample: self.last_sample,
            smoothed_cents: self.smoother.value(),
            last_written: self.last_written,
            listening: self.listener.is_listening(),
            mic_error: self.mic_error.clone(),
            settings_error: self.settings_error.clone(),
            best_score,
            cue: self.cue.map(|(cue, _)| cue),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(
            self.tab,
            self.display(),
            &self.library,
            &self.lookup,
            self.player.as_ref(),
        )
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen_with(window_focus)];

        if self.engine.state().is_running() || self.listener.is_listening() {
            subscriptions.push(iced::time::every(Duration::from_millis(16)).map(Message::Frame));
        }

        if let Some(id) = self.player.as_ref().and_then(SessionPlayer::active_timer) {
            subscriptions.push(
                iced::time::every(Duration::from_secs(1))
                    .with(id)
                    .map(|(id, _)| Message::SessionTick(id)),
            );
        }

        Subscription::batch(subscriptions)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn window_focus(event: Event, _status: event::Status, _id: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::Focused) => Some(Message::WindowFocused),
        Event::Window(window::Event::Unfocused) => Some(Message::WindowUnfocused),
        _ => None,
    }
}
