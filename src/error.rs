// Error types for the alarm clock
//
// Nothing here is retried: errors are logged where they happen and shown to
// the user as a one-shot alert.

use std::path::PathBuf;

use thiserror::Error;

use crate::alarm::AlarmId;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Please select or record a sound first")]
    NoSoundSelected,

    #[error("Invalid alarm time {hour}:{minute:02}")]
    InvalidTime { hour: u8, minute: u8 },

    #[error("The alarm scheduler is not running")]
    SchedulerStopped,
}

impl Error {
    /// Whether the user refused (or the system withheld) microphone access.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Audio(AudioError::PermissionDenied(_)))
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoProjectDirs,
}

/// Key-value storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt stored data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An alarm with id {0} already exists")]
    DuplicateId(AlarmId),
}

/// Recording and playback errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to open audio output: {0}")]
    Output(String),

    #[error("Failed to capture audio: {0}")]
    Capture(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Failed to encode recording: {0}")]
    Encode(#[from] hound::Error),

    #[error("Sound file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read sound file: {0}")]
    Io(#[from] std::io::Error),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,
}

// Convenience type aliases for common Result types
pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type AudioResult<T> = std::result::Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_detected_through_wrapping() {
        let err: Error = AudioError::PermissionDenied("no input device".into()).into();
        assert!(err.is_permission_denied());

        let err: Error = AudioError::NotRecording.into();
        assert!(!err.is_permission_denied());
    }
}
