//! Crate-level error type for the infrastructure around the draw core.
//!
//! Domain outcomes (exhausted pools, invalid settings) are plain values and
//! never surface here; see [`crate::settings::SettingsError`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to open log file at {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logger already initialised: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
