//! Error types for tomidoro.
//!
//! None of these ever escape the timer engine: settings failures are logged and
//! replaced by defaults, playback failures are logged while the alarm keeps
//! ringing. Only alarm imports report an error back to the user.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing the settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// No platform config directory could be determined
    #[error("couldn't determine a config directory for this platform")]
    NoConfigDir,

    /// Failed to read the settings file
    #[error("couldn't read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file exists but isn't valid
    #[error("couldn't parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings couldn't be turned into toml
    #[error("couldn't serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Failed to write the settings file
    #[error("couldn't write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors importing a custom alarm sound.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Payload is over the size limit, nothing was imported
    #[error("file is too large ({size} bytes), please choose a file under {} MB", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },

    /// The sound file couldn't be read
    #[error("couldn't read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors starting alarm playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The audio thread has exited
    #[error("audio thread is not running")]
    Disconnected,
}

pub type Result<T, E = SettingsError> = std::result::Result<T, E>;
