use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the Q&A backend
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {0}")]
    Status(StatusCode),

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response had no answer, response or message field")]
    MissingAnswer,

    #[error("could not read upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a selected file is rejected before any upload starts
#[derive(Debug, Error)]
pub enum FileError {
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("{name} is {size} bytes, the limit is {limit} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("unsupported file type: .{0}")]
    UnsupportedType(String),

    #[error("could not inspect file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
