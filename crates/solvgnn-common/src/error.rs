//! Error types shared by the SolvGNN crates.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GnnError>;

#[derive(Error, Debug)]
pub enum GnnError {
    /// Any tensor failure, shape mismatches included.
    #[error("Tensor error: {0}")]
    Tensor(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<candle_core::Error> for GnnError {
    fn from(e: candle_core::Error) -> Self {
        GnnError::Tensor(e.to_string())
    }
}
