//! Engine error types

use thiserror::Error;

/// Errors raised inside a completion pass
///
/// None of these are fatal: the engine logs them, skips the failing unit
/// (a detector, a source, a pattern) and keeps going.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown completion source: {0}")]
    UnknownSource(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Subscope detector `{detector}` failed: {message}")]
    Detector { detector: String, message: String },

    #[error("Filter `{filter}` failed: {message}")]
    Filter { filter: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine mailbox closed")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
