use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
}

/// Which side made a ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn is_white(self) -> bool {
        self == Side::White
    }
}

/// One ply as supplied by the game store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlyRecord {
    /// 0-based position of this ply in the game
    pub index: usize,
    pub side: Side,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
}

impl PlyRecord {
    /// 1-based ply number
    pub fn ply(&self) -> usize {
        self.index + 1
    }

    /// Full-move number as printed in PGN ("12." for both 12.Nf3 and 12...Nc6),
    /// read from the FEN counter and falling back to the ply index.
    pub fn move_number(&self) -> u32 {
        self.fen_before
            .split_whitespace()
            .nth(5)
            .and_then(|n| n.parse().ok())
            .unwrap_or((self.index / 2 + 1) as u32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    pub start_fen: String,
    pub plies: Vec<PlyRecord>,
}

impl GameRecord {
    /// Every position of the game in order: the start position, then the
    /// position after each ply. Always `plies.len() + 1` entries.
    pub fn positions(&self) -> Vec<&str> {
        let mut fens = Vec::with_capacity(self.plies.len() + 1);
        fens.push(self.start_fen.as_str());
        fens.extend(self.plies.iter().map(|p| p.fen_after.as_str()));
        fens
    }

    /// The side a named player had in this game, if they played in it.
    pub fn side_of(&self, player: &str) -> Option<Side> {
        if self.metadata.white.eq_ignore_ascii_case(player) {
            Some(Side::White)
        } else if self.metadata.black.eq_ignore_ascii_case(player) {
            Some(Side::Black)
        } else {
            None
        }
    }
}
