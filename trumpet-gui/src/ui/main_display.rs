//! # Main Display Module
//!
//! Layout of the trainer window: a tab bar, the game tab (stats, note track,
//! tuner read-out and settings sidebar) and the session tab.

use iced::widget::{
    Space, button, checkbox, column, container, horizontal_space, pick_list, row, slider, text,
};
use iced::{Alignment, Color, Element, Length};
use trumpet_core::game::GamePhase;
use trumpet_core::scale::{Key, ScaleType};
use trumpet_core::session::{SessionLibrary, SessionPlayer};
use trumpet_core::settings::START_SPEED_RANGE;
use trumpet_core::tuning::{self, AccidentalMode};

use super::{cent_meter, note_track, session_view};
use crate::{GameDisplay, Message, SessionLookup, Tab};

/// Written range the range sliders offer: F#3 to C6.
const RANGE_SLIDER: std::ops::RangeInclusive<i32> = 54..=84;

const ERROR_COLOR: Color = Color::from_rgb(1.0, 0.4, 0.4);

/// Creates the complete main application view
pub fn create_main_view<'a>(
    tab: Tab,
    game: GameDisplay,
    library: &'a SessionLibrary,
    lookup: &'a SessionLookup,
    player: Option<&'a SessionPlayer>,
) -> Element<'a, Message> {
    let content: Element<'a, Message> = match tab {
        Tab::Game => create_game_tab(game),
        Tab::Session => session_view::create_session_tab(library, lookup, player),
    };

    container(
        column![create_tab_bar(tab), Space::with_height(10), content]
            .spacing(5)
            .padding(20),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

fn create_tab_bar(active: Tab) -> Element<'static, Message> {
    let tab_button = |label: &'static str, tab: Tab| {
        let tab_button = button(text(label).size(16)).padding([6, 16]);
        if tab == active {
            tab_button
        } else {
            tab_button
                .style(button::secondary)
                .on_press(Message::SelectTab(tab))
        }
    };

    row![
        text("Trumpet Trainer").size(28),
        horizontal_space(),
        tab_button("Game", Tab::Game),
        tab_button("Practice sessions", Tab::Session),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

fn create_game_tab(game: GameDisplay) -> Element<'static, Message> {
    let stats = create_stats_row(&game);
    let controls = create_controls(&game);
    let tuner = create_tuner_panel(&game);
    let sidebar = create_sidebar(&game);

    let prefer_flats = game.settings.prefers_flats();
    let range = (game.settings.range_min_midi, game.settings.range_max_midi);
    let track = container(
        note_track::NoteTrack::new(game.notes, game.particles, range, prefer_flats, game.cue)
            .view(),
    )
    .width(Length::Fill)
    .height(Length::Fill);

    let mut main_column = column![stats, Space::with_height(10), track, tuner, controls]
        .width(Length::Fill)
        .spacing(10);

    if let Some(error) = game.mic_error {
        main_column = main_column.push(
            row![
                text(error).size(16).color(ERROR_COLOR),
                horizontal_space(),
                button(text("Retry")).on_press(Message::RetryMicrophone),
            ]
            .align_y(Alignment::Center),
        );
    }

    row![main_column, Space::with_width(10), sidebar]
        .align_y(Alignment::Start)
        .into()
}

fn stat(label: &'static str, value: String) -> Element<'static, Message> {
    column![text(label).size(14), text(value).size(24)]
        .spacing(2)
        .into()
}

fn create_stats_row(game: &GameDisplay) -> Element<'static, Message> {
    let state = &game.state;
    let lives = "♥ ".repeat(state.lives as usize);
    let best = game
        .best_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "--".to_string());

    row![
        stat("Score", state.score.to_string()),
        stat("Streak", format!("{} (best {})", state.streak, state.best_streak)),
        stat("Lives", if lives.is_empty() { "-".to_string() } else { lives }),
        stat("Level", state.level.to_string()),
        stat("Accuracy", format!("{:.0}%", state.accuracy() * 100.0)),
        stat("Speed", format!("{:.0}", game.speed)),
        horizontal_space(),
        stat("Best", best),
    ]
    .spacing(30)
    .align_y(Alignment::Start)
    .into()
}

fn create_controls(game: &GameDisplay) -> Element<'static, Message> {
    let primary = match game.state.phase {
        GamePhase::Idle => button(text("Start")).on_press(Message::StartGame),
        GamePhase::Running => button(text("Pause")).on_press(Message::PauseGame),
        GamePhase::Paused => button(text("Resume")).on_press(Message::ResumeGame),
        GamePhase::GameOver => button(text("Play again")).on_press(Message::RestartGame),
    };

    let mut controls = row![primary.padding([8, 20])].spacing(10).align_y(Alignment::Center);

    if matches!(game.state.phase, GamePhase::Running | GamePhase::Paused) {
        controls = controls
            .push(button(text("Restart")).style(button::secondary).on_press(Message::RestartGame))
            .push(button(text("Stop")).style(button::secondary).on_press(Message::StopGame));
    }
    if game.state.phase == GamePhase::GameOver {
        controls = controls.push(
            text(format!(
                "Game over: {} points, level {}",
                game.state.score, game.state.level
            ))
            .size(18),
        );
    }
    let listening = if game.listening { "Listening" } else { "Microphone off" };
    controls
        .push(horizontal_space())
        .push(text(listening).size(14))
        .into()
}

/// Detected note, frequency and the cent meter.
fn create_tuner_panel(game: &GameDisplay) -> Element<'static, Message> {
    let prefer_flats = game.settings.prefers_flats();
    let (note_text, freq_text) = match &game.last_sample {
        Some(sample) => {
            let written = tuning::concert_to_written(sample.concert_midi(), game.settings.transposition);
            (
                tuning::midi_note_name(written, prefer_flats),
                format!("{:.1} Hz", sample.frequency),
            )
        }
        None => ("--".to_string(), "-- Hz".to_string()),
    };
    let played = game
        .last_written
        .map(|midi| format!("Last note: {}", tuning::midi_note_name(midi, prefer_flats)))
        .unwrap_or_default();
    let cents = game
        .smoothed_cents
        .map(|c| format!("{:+.0} cents", c))
        .unwrap_or_default();

    column![
        row![
            text(note_text).size(24),
            Space::with_width(10),
            text(freq_text).size(18),
            Space::with_width(10),
            text(cents).size(16),
            horizontal_space(),
            text(played).size(14),
        ]
        .align_y(Alignment::Center),
        cent_meter::CentMeter::new(game.smoothed_cents, game.tolerance_cents).view(),
    ]
    .spacing(5)
    .into()
}

fn labelled<'a>(label: String, control: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    column![text(label).size(14), control.into()].spacing(4).into()
}

/// Settings sidebar. Changes apply from the next spawned note.
fn create_sidebar(game: &GameDisplay) -> Element<'static, Message> {
    let settings = &game.settings;
    let prefer_flats = settings.prefers_flats();

    let mut sections = column![
        text("Settings").size(18),
        Space::with_height(5),
        labelled(
            "Key".to_string(),
            pick_list(Key::ALL, Some(settings.key), Message::KeySelected)
        ),
        labelled(
            "Scale".to_string(),
            pick_list(ScaleType::ALL, Some(settings.scale_type), Message::ScaleSelected)
        ),
        labelled(
            "Accidentals".to_string(),
            pick_list(
                AccidentalMode::ALL,
                Some(settings.accidental_mode),
                Message::AccidentalsSelected
            )
        ),
        labelled(
            format!("Start speed: {}", settings.start_speed),
            slider(
                START_SPEED_RANGE,
                settings.start_speed,
                Message::StartSpeedChanged
            )
        ),
        labelled(
            format!(
                "Pitch strictness: {:.2} (±{:.0} cents)",
                settings.confidence_threshold, game.tolerance_cents
            ),
            slider(
                0.0..=1.0,
                settings.confidence_threshold,
                Message::ConfidenceChanged
            )
            .step(0.05)
        ),
        labelled(
            format!(
                "Lowest note: {}",
                tuning::midi_note_name(settings.range_min_midi, prefer_flats)
            ),
            slider(RANGE_SLIDER, settings.range_min_midi, Message::RangeMinChanged)
        ),
        labelled(
            format!(
                "Highest note: {}",
                tuning::midi_note_name(settings.range_max_midi, prefer_flats)
            ),
            slider(RANGE_SLIDER, settings.range_max_midi, Message::RangeMaxChanged)
        ),
        checkbox("Sound effects", settings.sfx_enabled).on_toggle(Message::SfxToggled),
    ]
    .spacing(10);

    if let Some(error) = &game.settings_error {
        sections = sections.push(text(error.clone()).size(14).color(ERROR_COLOR));
    }

    container(sections.padding(15))
        .width(Length::Fixed(260.0))
        .height(Length::Fill)
        .into()
}
