//! Opening book lookup.
//!
//! The book is a bincode-encoded map of normalised FEN -> SAN -> stats,
//! built offline from master games.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

/// Stats for a single book move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMoveStats {
    pub games: i32,
    pub white_wins: i32,
    pub draws: i32,
    pub black_wins: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningBook {
    positions: HashMap<String, HashMap<String, BookMoveStats>>,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the book from a binary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let positions: HashMap<String, HashMap<String, BookMoveStats>> =
            bincode::deserialize_from(reader)?;

        let total_moves: usize = positions.values().map(|m| m.len()).sum();
        tracing::info!(
            positions = positions.len(),
            moves = total_moves,
            "Loaded opening book"
        );
        Ok(Self { positions })
    }

    /// Write the book in the same binary format `load` reads.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(std::io::BufWriter::new(file), &self.positions)?;
        Ok(())
    }

    pub fn insert(&mut self, fen: &str, san: &str, stats: BookMoveStats) {
        self.positions
            .entry(normalize_fen(fen))
            .or_default()
            .insert(san.to_string(), stats);
    }

    /// Returns true if the (fen, move_san) pair exists in the book.
    pub fn contains(&self, fen: &str, san: &str) -> bool {
        self.stats(fen, san).is_some()
    }

    pub fn stats(&self, fen: &str, san: &str) -> Option<&BookMoveStats> {
        self.positions.get(&normalize_fen(fen))?.get(san)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
