use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid UCI move '{uci}'")]
    InvalidMove { uci: String },

    #[error("Failed to read opening book: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode opening book: {0}")]
    BookDecode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
