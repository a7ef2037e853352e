//! PGN parsing utilities: a lightweight regex-based parser that replays the
//! mainline with shakmaty to produce per-ply FEN/UCI records.

use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use thiserror::Error;

use crate::game_data::{GameMetadata, GameRecord, PlyRecord, Side};

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    Empty,

    #[error("Invalid FEN header: {0}")]
    InvalidFen(String),

    #[error("Invalid SAN '{san}' at ply {ply}")]
    InvalidSan { ply: usize, san: String },

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },
}

/// Parse a single-game PGN string into a GameRecord.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, PgnError> {
    let header_re = Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("static regex");

    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..Default::default()
    };
    let mut fen = None;

    for cap in header_re.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Event" => metadata.event = Some(value),
            "Link" => metadata.link = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    let sans = extract_moves(pgn);
    if sans.is_empty() {
        return Err(PgnError::Empty);
    }

    let start_fen = fen.unwrap_or_else(|| STANDARD_START_FEN.to_string());
    let plies = replay(&start_fen, &sans)?;

    Ok(GameRecord {
        metadata,
        start_fen,
        plies,
    })
}

/// Split a multi-game PGN file into single-game chunks. A new game starts at
/// a header line that follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut seen_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && seen_movetext {
            games.push(std::mem::take(&mut current));
            seen_movetext = false;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('[') {
            seen_movetext = true;
        }
        current.push_str(line);
        current.push('\n');
    }

    if seen_movetext {
        games.push(current);
    }
    games
}

/// Replay SAN moves from a start FEN, recording both positions and the UCI
/// form of every ply.
pub fn replay(start_fen: &str, sans: &[String]) -> Result<Vec<PlyRecord>, PgnError> {
    let mut pos: Chess = start_fen
        .parse::<Fen>()
        .map_err(|e| PgnError::InvalidFen(format!("{start_fen}: {e}")))?
        .into_position(CastlingMode::Standard)
        .map_err(|e| PgnError::InvalidFen(format!("{start_fen}: {e}")))?;

    let mut plies = Vec::with_capacity(sans.len());

    for (index, san_str) in sans.iter().enumerate() {
        let san_plus: SanPlus = san_str.parse().map_err(|_| PgnError::InvalidSan {
            ply: index + 1,
            san: san_str.clone(),
        })?;
        let mv = san_plus
            .san
            .to_move(&pos)
            .map_err(|_| PgnError::IllegalMove {
                ply: index + 1,
                san: san_str.clone(),
            })?;

        let side = match pos.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        };
        let fen_before = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();

        pos = pos.play(mv).map_err(|_| PgnError::IllegalMove {
            ply: index + 1,
            san: san_str.clone(),
        })?;
        let fen_after = Fen::from_position(&pos, EnPassantMode::Legal).to_string();

        plies.push(PlyRecord {
            index,
            side,
            san: san_plus.san.to_string(),
            uci,
            fen_before,
            fen_after,
        });
    }

    Ok(plies)
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    // Remove headers
    let header_re = Regex::new(r"\[[^\]]*\]").expect("static regex");
    let no_headers = header_re.replace_all(pgn, "");

    // Remove comments
    let comment_re = Regex::new(r"\{[^}]*\}").expect("static regex");
    let no_comments = comment_re.replace_all(&no_headers, "");

    // Remove variations
    let variation_re = Regex::new(r"\([^)]*\)").expect("static regex");
    let no_variations = variation_re.replace_all(&no_comments, "");

    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
            .expect("static regex");

    move_re
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]
[TimeControl "600"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.plies.len(), 4);
        assert_eq!(game.plies[0].san, "e4");
        assert_eq!(game.plies[0].uci, "e2e4");
        assert_eq!(game.plies[0].side, Side::White);
        assert_eq!(game.plies[1].side, Side::Black);
        assert_eq!(game.plies[0].fen_before, STANDARD_START_FEN);
        assert_eq!(game.plies[0].fen_after, game.plies[1].fen_before);
        assert_eq!(game.positions().len(), 5);
    }

    #[test]
    fn test_castling_uci_is_standard() {
        let pgn = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O Nf6 *";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.plies[6].uci, "e1g1");
        assert_eq!(game.plies[6].move_number(), 4);
        assert_eq!(game.plies[7].move_number(), 4);
    }

    #[test]
    fn test_illegal_move_is_reported() {
        let pgn = "1. e4 e5 2. Ke3 *";
        match parse_pgn(pgn) {
            Err(PgnError::IllegalMove { ply, .. }) => assert_eq!(ply, 3),
            other => panic!("expected illegal move, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_pgn() {
        assert!(matches!(parse_pgn("[White \"a\"]"), Err(PgnError::Empty)));
    }

    #[test]
    fn test_split_games() {
        let text = "[White \"a\"]\n[Black \"b\"]\n\n1. e4 e5 1-0\n\n[White \"c\"]\n[Black \"d\"]\n\n1. d4 d5 0-1\n";
        let games = split_games(text);
        assert_eq!(games.len(), 2);
        assert_eq!(parse_pgn(&games[1]).unwrap().metadata.white, "c");
    }

    #[test]
    fn test_fen_header_start() {
        let pgn = r#"[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 40"]

40. e4 Kd7 *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.plies.len(), 2);
        assert_eq!(game.plies[0].move_number(), 40);
    }
}
