//! # Game Module
//!
//! The pitch-matching note game: notes approach a hit-line and are resolved
//! by playing their pitch before they reach it.

pub mod engine;
pub mod notes;
pub mod particles;
pub mod state;

pub use engine::{FrameClock, GameEngine, HitResult, SoundCue};
pub use notes::{GameNote, NotePicker, NoteStream};
pub use particles::{Particle, ParticleSystem};
pub use state::{GamePhase, GameState};
