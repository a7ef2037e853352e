//! Worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("PGN error in {source_name}: {error}")]
    Pgn {
        source_name: String,
        error: chess_core::pgn::PgnError,
    },

    #[error("Review error: {0}")]
    Review(#[from] chess_review::ReviewError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
