//! # Session Player
//!
//! Steps through a practice session flattened into one queue. Videos advance
//! on the embed's "ended" event, sheet music and pauses run one-second
//! countdowns, and an optional break is inserted between items.
//!
//! At most one countdown exists at a time. Each countdown is tagged with a
//! [`TimerId`]; every phase change issues a new id, so a tick addressed to a
//! countdown that was left behind is ignored.

use tracing::debug;

use super::model::{ItemKind, PracticeSession, SessionItem};

pub const DEFAULT_PDF_SECONDS: u32 = 120;
pub const DEFAULT_PAUSE_SECONDS: u32 = 60;
pub const DEFAULT_BREAK_SECONDS: u32 = 30;
pub const EXTEND_SECONDS: u32 = 30;

/// One playable entry of the flattened queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub item: SessionItem,
    pub section_title: String,
}

/// Flattens sections and items in their order-index order.
pub fn build_queue(session: &PracticeSession) -> Vec<QueueEntry> {
    let mut sections: Vec<_> = session.sections.iter().collect();
    sections.sort_by_key(|s| s.order_index);

    let mut queue = Vec::new();
    for section in sections {
        let mut items: Vec<_> = section.items.iter().collect();
        items.sort_by_key(|i| i.order_index);
        queue.extend(items.into_iter().map(|item| QueueEntry {
            item: item.clone(),
            section_title: section.title.clone(),
        }));
    }
    queue
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Playing,
    /// Break before `next_index` starts.
    AutoPause { next_index: usize },
    Finished,
}

/// Identifies the countdown a one-second tick is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    total_seconds: u32,
    remaining_seconds: u32,
    running: bool,
}

impl Countdown {
    pub fn new(seconds: u32, running: bool) -> Self {
        Self {
            total_seconds: seconds,
            remaining_seconds: seconds,
            running,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total(&self) -> u32 {
        self.total_seconds
    }

    pub fn elapsed(&self) -> u32 {
        self.total_seconds - self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 0.0 at the start, 1.0 when done.
    pub fn progress(&self) -> f32 {
        if self.total_seconds == 0 {
            1.0
        } else {
            self.elapsed() as f32 / self.total_seconds as f32
        }
    }

    /// Counts one second down. Returns `true` once zero is reached.
    fn tick(&mut self) -> bool {
        if self.running {
            self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        }
        self.remaining_seconds == 0
    }

    /// Adds time without touching the elapsed part.
    fn extend(&mut self, seconds: u32) {
        self.total_seconds += seconds;
        self.remaining_seconds += seconds;
    }
}

#[derive(Debug, Clone)]
pub struct SessionPlayer {
    session_name: String,
    break_enabled: bool,
    break_seconds: u32,
    queue: Vec<QueueEntry>,
    index: usize,
    phase: PlayerPhase,
    countdown: Option<Countdown>,
    timer_generation: u64,
}

impl SessionPlayer {
    /// Builds the queue and enters the first item. An empty session is
    /// finished immediately.
    pub fn new(session: &PracticeSession) -> Self {
        let mut player = Self {
            session_name: session.name.clone(),
            break_enabled: session.break_enabled,
            break_seconds: session.break_seconds.unwrap_or(DEFAULT_BREAK_SECONDS),
            queue: build_queue(session),
            index: 0,
            phase: PlayerPhase::Finished,
            countdown: None,
            timer_generation: 0,
        };
        player.enter(0);
        player
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The item on screen, `None` once finished.
    pub fn current(&self) -> Option<&QueueEntry> {
        match self.phase {
            PlayerPhase::Finished => None,
            _ => self.queue.get(self.index),
        }
    }

    /// The item that follows the running break.
    pub fn upcoming(&self) -> Option<&QueueEntry> {
        match self.phase {
            PlayerPhase::AutoPause { next_index } => self.queue.get(next_index),
            _ => None,
        }
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PlayerPhase::Finished
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    /// Id of the countdown that currently wants one-second ticks.
    pub fn active_timer(&self) -> Option<TimerId> {
        self.countdown
            .filter(|c| c.is_running())
            .map(|_| TimerId(self.timer_generation))
    }

    /// Position in the queue as (1-based item, total).
    pub fn progress(&self) -> (usize, usize) {
        let position = if self.is_finished() {
            self.queue.len()
        } else {
            self.index + 1
        };
        (position, self.queue.len())
    }

    /// One second has passed for timer `id`.
    pub fn on_timer_tick(&mut self, id: TimerId) {
        if self.active_timer() != Some(id) {
            debug!(?id, "stale timer tick ignored");
            return;
        }
        let done = self.countdown.as_mut().is_some_and(Countdown::tick);
        if done {
            match self.phase {
                PlayerPhase::AutoPause { next_index } => self.enter(next_index),
                PlayerPhase::Playing => self.complete_current(),
                PlayerPhase::Finished => {}
            }
        }
    }

    /// The video embed finished playback.
    pub fn video_ended(&mut self) {
        let is_video = matches!(
            self.current().map(|e| &e.item.kind),
            Some(ItemKind::VimeoVideo { .. })
        );
        if self.phase == PlayerPhase::Playing && is_video {
            self.complete_current();
        }
    }

    /// Starts or stops the sheet-music countdown.
    pub fn toggle_pdf_timer(&mut self) {
        let is_pdf = matches!(
            self.current().map(|e| &e.item.kind),
            Some(ItemKind::Pdf { .. })
        );
        if self.phase != PlayerPhase::Playing || !is_pdf {
            return;
        }
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.running = !countdown.running;
            self.timer_generation += 1;
        }
    }

    /// Adds [`EXTEND_SECONDS`] to a break or pause item.
    pub fn extend(&mut self) {
        let extendable = match self.phase {
            PlayerPhase::AutoPause { .. } => true,
            PlayerPhase::Playing => matches!(
                self.current().map(|e| &e.item.kind),
                Some(ItemKind::Pause { .. })
            ),
            PlayerPhase::Finished => false,
        };
        if let (true, Some(countdown)) = (extendable, self.countdown.as_mut()) {
            countdown.extend(EXTEND_SECONDS);
        }
    }

    /// Ends the break early.
    pub fn skip_break(&mut self) {
        if let PlayerPhase::AutoPause { next_index } = self.phase {
            self.enter(next_index);
        }
    }

    /// Finishes the current item (or break) and moves on.
    pub fn go_next(&mut self) {
        match self.phase {
            PlayerPhase::Playing => self.complete_current(),
            PlayerPhase::AutoPause { next_index } => self.enter(next_index),
            PlayerPhase::Finished => {}
        }
    }

    pub fn go_prev(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let target = match self.phase {
            PlayerPhase::Finished => self.queue.len() - 1,
            // Back from a break to the item that just ended.
            PlayerPhase::AutoPause { .. } => self.index,
            PlayerPhase::Playing => self.index.saturating_sub(1),
        };
        self.enter(target);
    }

    /// Jumps to queue position `index`; out-of-range jumps are ignored.
    pub fn jump_to(&mut self, index: usize) {
        if index < self.queue.len() {
            self.enter(index);
        }
    }

    /// Starts the current item again from the beginning.
    pub fn replay(&mut self) {
        if !self.is_finished() {
            self.enter(self.index);
        }
    }

    pub fn restart(&mut self) {
        self.enter(0);
    }

    fn complete_current(&mut self) {
        let next = self.index + 1;
        if next >= self.queue.len() {
            self.finish();
        } else if self.break_enabled {
            self.timer_generation += 1;
            self.phase = PlayerPhase::AutoPause { next_index: next };
            self.countdown = Some(Countdown::new(self.break_seconds, true));
            debug!(next, seconds = self.break_seconds, "auto-pause");
        } else {
            self.enter(next);
        }
    }

    fn enter(&mut self, index: usize) {
        self.timer_generation += 1;
        let Some(entry) = self.queue.get(index) else {
            self.finish();
            return;
        };
        self.countdown = match &entry.item.kind {
            ItemKind::VimeoVideo { .. } => None,
            ItemKind::Pdf {
                duration_seconds, ..
            } => Some(Countdown::new(
                duration_seconds.unwrap_or(DEFAULT_PDF_SECONDS),
                false,
            )),
            ItemKind::Pause { duration_seconds } => Some(Countdown::new(
                duration_seconds.unwrap_or(DEFAULT_PAUSE_SECONDS),
                true,
            )),
        };
        debug!(index, item = %entry.item.id, section = %entry.section_title, "entering item");
        self.index = index;
        self.phase = PlayerPhase::Playing;
    }

    fn finish(&mut self) {
        self.timer_generation += 1;
        self.countdown = None;
        self.phase = PlayerPhase::Finished;
        debug!(session = %self.session_name, "session finished");
    }
}
