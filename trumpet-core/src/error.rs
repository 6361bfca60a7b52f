//! # Error Types
//!
//! Typed errors for the trumpet trainer core. Audio failures are converted into
//! an `AudioError` at the boundary where the platform API is called and never
//! travel into the frame loop; callers keep the `user_message()` string as an
//! inline error field.

use std::io;
use thiserror::Error;

/// Failures of the microphone / audio-device layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("no audio input device available")]
    NoDevice,
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),
    #[error("audio input device is busy: {0}")]
    DeviceBusy(String),
    #[error("no supported input format: {0}")]
    UnsupportedFormat(String),
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("audio worker did not report back in time")]
    StartTimeout,
}

impl AudioError {
    /// Classifies a backend error message. Backends only report permission and
    /// busy conditions as free text, so the message is inspected.
    pub fn from_backend(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
            AudioError::PermissionDenied(message)
        } else if lower.contains("busy") || lower.contains("in use") {
            AudioError::DeviceBusy(message)
        } else {
            AudioError::Stream(message)
        }
    }

    /// The single inline message shown next to the retry control.
    pub fn user_message(&self) -> String {
        match self {
            AudioError::NoDevice => "No microphone found. Connect one and try again.".to_string(),
            AudioError::PermissionDenied(_) => {
                "Microphone access was denied. Allow access and try again.".to_string()
            }
            AudioError::DeviceBusy(_) => {
                "The microphone is used by another application. Close it and try again.".to_string()
            }
            AudioError::UnsupportedFormat(_) => {
                "The microphone does not offer a supported audio format.".to_string()
            }
            AudioError::Stream(detail) => format!("Audio input failed: {detail}"),
            AudioError::StartTimeout => "The microphone did not respond. Try again.".to_string(),
        }
    }
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => AudioError::NoDevice,
            cpal::BuildStreamError::StreamConfigNotSupported => {
                AudioError::UnsupportedFormat(err.to_string())
            }
            other => AudioError::from_backend(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        match err {
            cpal::PlayStreamError::DeviceNotAvailable => AudioError::NoDevice,
            other => AudioError::from_backend(other.to_string()),
        }
    }
}

impl From<cpal::StreamError> for AudioError {
    fn from(err: cpal::StreamError) -> Self {
        match err {
            cpal::StreamError::DeviceNotAvailable => AudioError::NoDevice,
            other => AudioError::from_backend(other.to_string()),
        }
    }
}

impl From<cpal::SupportedStreamConfigsError> for AudioError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        match err {
            cpal::SupportedStreamConfigsError::DeviceNotAvailable => AudioError::NoDevice,
            other => AudioError::from_backend(other.to_string()),
        }
    }
}

/// Invalid or unreadable game settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid note range {min}..={max} (must be ascending MIDI notes 0-127)")]
    InvalidRange { min: i32, max: i32 },
    #[error("the selected key and scale have no notes between {min} and {max}")]
    EmptyScale { min: i32, max: i32 },
    #[error("start speed {0} is outside 1..=10")]
    StartSpeedOutOfRange(u32),
    #[error("confidence threshold {0} is outside 0.0..=1.0")]
    ConfidenceOutOfRange(f32),
    #[error("settings file error: {0}")]
    Io(#[from] io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the JSON-backed stores (highscores, session library).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file error: {0}")]
    Io(#[from] io::Error),
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("practice session '{0}' not found")]
    SessionNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_messages_are_classified() {
        assert!(matches!(
            AudioError::from_backend("Permission denied by user"),
            AudioError::PermissionDenied(_)
        ));
        assert!(matches!(
            AudioError::from_backend("Device or resource busy"),
            AudioError::DeviceBusy(_)
        ));
        assert!(matches!(AudioError::from_backend("underrun"), AudioError::Stream(_)));
    }

    #[test]
    fn user_message_hides_backend_detail_for_permission() {
        let err = AudioError::PermissionDenied("kAudioHardwareIllegalOperationError".into());
        assert!(!err.user_message().contains("kAudio"));
    }

    #[test]
    fn unplugged_device_maps_to_no_device() {
        assert_eq!(
            AudioError::from(cpal::StreamError::DeviceNotAvailable),
            AudioError::NoDevice
        );
    }
}
