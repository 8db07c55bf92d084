//! Converter error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read HEIC: {0}")]
    HeicRead(String),

    #[error("Failed to decode HEIC: {0}")]
    HeicDecode(String),

    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronous misuse of the engine, distinct from per-file failures.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("A batch is already running on this engine")]
    BatchInProgress,

    #[error("Refusing to start an empty batch")]
    EmptyBatch,

    #[error("Failed to create worker pool: {0}")]
    PoolBuild(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
