//! Error types for Trailblazer

use thiserror::Error;

/// Main error type for Trailblazer
#[derive(Error, Debug)]
pub enum TrailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid maze: {0}")]
    InvalidMaze(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Trailblazer operations
pub type Result<T> = std::result::Result<T, TrailError>;
