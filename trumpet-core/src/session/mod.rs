//! # Session Module
//!
//! Practice sessions and the queue player that walks through them.

pub mod model;
pub mod player;

pub use model::{ItemKind, PracticeSession, Section, SessionItem, SessionLibrary};
pub use player::{
    Countdown, PlayerPhase, QueueEntry, SessionPlayer, TimerId, build_queue,
};
