//! # Session View
//!
//! Practice-session tab: a session picker, or the player for the open session.
//! Videos are played by an external embed; the "Video finished" button stands
//! in for its playback-ended event.

use iced::widget::{
    Space, button, column, container, horizontal_space, progress_bar, row, scrollable, text,
    text_input,
};
use iced::{Alignment, Color, Element, Length};
use trumpet_core::session::{Countdown, ItemKind, PlayerPhase, SessionLibrary, SessionPlayer};

use crate::{Message, SessionLookup};

const NOT_FOUND_COLOR: Color = Color::from_rgb(1.0, 0.4, 0.4);

pub fn create_session_tab<'a>(
    library: &'a SessionLibrary,
    lookup: &'a SessionLookup,
    player: Option<&'a SessionPlayer>,
) -> Element<'a, Message> {
    match player {
        Some(player) => create_player(player),
        None => column![create_link_entry(lookup), create_session_list(library)]
            .spacing(20)
            .into(),
    }
}

/// Opens a shared session by its link or slug.
fn create_link_entry(lookup: &SessionLookup) -> Element<'_, Message> {
    let mut entry = column![
        row![
            text_input("Paste a share link", &lookup.link)
                .on_input(Message::SessionLinkChanged)
                .on_submit(Message::OpenSessionLink)
                .padding(8),
            button(text("Open")).on_press_maybe(
                (!lookup.link.trim().is_empty()).then_some(Message::OpenSessionLink)
            ),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    ]
    .spacing(6);

    if let Some(message) = &lookup.not_found {
        entry = entry.push(text(message).size(16).color(NOT_FOUND_COLOR));
    }
    entry.into()
}

fn create_session_list(library: &SessionLibrary) -> Element<'_, Message> {
    if library.sessions().is_empty() {
        return container(text("No practice sessions found.").size(20))
            .center_x(Length::Fill)
            .padding(40)
            .into();
    }

    let list = library.sessions().iter().fold(column![].spacing(8), |col, session| {
        let items: usize = session.sections.iter().map(|s| s.items.len()).sum();
        col.push(
            button(
                row![
                    text(&session.name).size(18),
                    horizontal_space(),
                    text(format!("{items} items")).size(14),
                ]
                .align_y(Alignment::Center),
            )
            .width(Length::Fill)
            .padding([10, 16])
            .on_press(Message::OpenSession(session.id.clone())),
        )
    });

    column![text("Practice sessions").size(22), Space::with_height(10), scrollable(list)]
        .spacing(5)
        .into()
}

fn format_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn countdown_view(label: &str, countdown: &Countdown) -> Element<'static, Message> {
    column![
        row![
            text(label.to_string()).size(16),
            horizontal_space(),
            text(format_seconds(countdown.remaining())).size(32),
        ]
        .align_y(Alignment::Center),
        progress_bar(0.0..=1.0, countdown.progress()).height(8),
    ]
    .spacing(6)
    .into()
}

fn create_player(player: &SessionPlayer) -> Element<'_, Message> {
    let (position, total) = player.progress();
    let header = row![
        text(player.session_name()).size(22),
        horizontal_space(),
        text(format!("{position} / {total}")).size(16),
        button(text("Close"))
            .style(button::secondary)
            .on_press(Message::CloseSession),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let overall = progress_bar(0.0..=total.max(1) as f32, position as f32).height(6);

    let body = match player.phase() {
        PlayerPhase::Finished => column![
            text("Session complete").size(28),
            button(text("Start again")).on_press(Message::RestartSession),
        ]
        .spacing(15),
        PlayerPhase::AutoPause { .. } => {
            let mut body = column![text("Break").size(28)].spacing(15);
            if let Some(countdown) = player.countdown() {
                body = body.push(countdown_view("Next item starts in", countdown));
            }
            if let Some(next) = player.upcoming() {
                body = body.push(text(format!("Up next: {}", next.item.title)).size(16));
            }
            body.push(
                row![
                    button(text("+30 s")).on_press(Message::ExtendCountdown),
                    button(text("Skip break")).on_press(Message::SkipBreak),
                ]
                .spacing(10),
            )
        }
        PlayerPhase::Playing => create_current_item(player),
    };

    let navigation = row![
        button(text("Previous")).on_press(Message::PrevItem),
        button(text("Replay")).on_press_maybe((!player.is_finished()).then_some(Message::ReplayItem)),
        button(text("Next")).on_press_maybe((!player.is_finished()).then_some(Message::NextItem)),
        horizontal_space(),
        button(text("Restart session"))
            .style(button::secondary)
            .on_press(Message::RestartSession),
    ]
    .spacing(10);

    row![
        column![header, overall, Space::with_height(10), body, navigation]
            .spacing(15)
            .width(Length::Fill),
        Space::with_width(10),
        create_queue_list(player),
    ]
    .into()
}

fn create_current_item(player: &SessionPlayer) -> iced::widget::Column<'_, Message> {
    let Some(entry) = player.current() else {
        return column![];
    };
    let mut body = column![
        text(&entry.section_title).size(14),
        text(&entry.item.title).size(28),
    ]
    .spacing(10);

    match &entry.item.kind {
        ItemKind::VimeoVideo { video_ref } => {
            body = body
                .push(text(format!("Video {video_ref}")).size(16))
                .push(button(text("Video finished")).on_press(Message::VideoEnded));
        }
        ItemKind::Pdf { pdf_ref, .. } => {
            body = body.push(text(format!("Sheet music: {pdf_ref}")).size(16));
            if let Some(countdown) = player.countdown() {
                let label = if countdown.is_running() { "Stop timer" } else { "Start timer" };
                body = body
                    .push(countdown_view("Practice time", countdown))
                    .push(button(text(label)).on_press(Message::TogglePdfTimer));
            }
        }
        ItemKind::Pause { .. } => {
            if let Some(countdown) = player.countdown() {
                body = body
                    .push(countdown_view("Rest", countdown))
                    .push(button(text("+30 s")).on_press(Message::ExtendCountdown));
            }
        }
    }
    body
}

/// The whole queue; the current entry is highlighted, any entry can be
/// jumped to.
fn create_queue_list(player: &SessionPlayer) -> Element<'_, Message> {
    let current = (!player.is_finished()).then(|| player.current_index());
    let list = player
        .queue()
        .iter()
        .enumerate()
        .fold(column![].spacing(4), |col, (index, entry)| {
            let label = format!("{}. {} ({})", index + 1, entry.item.title, entry.item.kind.label());
            let entry_button = button(text(label).size(14))
                .width(Length::Fill)
                .on_press(Message::JumpTo(index));
            col.push(if Some(index) == current {
                entry_button
            } else {
                entry_button.style(button::text)
            })
        });

    container(scrollable(list))
        .width(Length::Fixed(280.0))
        .height(Length::Fill)
        .into()
}
