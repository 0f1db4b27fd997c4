//! Error types for frame decoding and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Frame decoding errors.
///
/// Callers feeding a transcript treat every variant as "drop the frame".
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed `{event}` payload: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
