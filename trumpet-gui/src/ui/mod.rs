//! # UI Module
//!
//! All UI components of the trumpet trainer.

pub mod cent_meter;
pub mod main_display;
pub mod note_track;
pub mod session_view;
