//! Shared builders for integration tests.

#![allow(dead_code)]

use chess_core::game_data::Side;
use chess_review::accuracy::accuracy;
use chess_review::analysis::{AnalyzedMove, ClassificationCounts, EvaluationSource, GameAnalysis};
use chess_review::board_delta::Motif;
use chess_review::classification::Classification;
use chrono::{DateTime, TimeZone, Utc};

const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A classified move at 0-based `index`; even indices are White's.
pub fn analyzed_move(index: usize, classification: Classification, motifs: Vec<Motif>) -> AnalyzedMove {
    let side = if index % 2 == 0 { Side::White } else { Side::Black };
    AnalyzedMove {
        index,
        move_number: (index / 2 + 1) as u32,
        side,
        san: "e4".to_string(),
        uci: "e2e4".to_string(),
        fen_before: FEN.to_string(),
        fen_after: FEN.to_string(),
        eval_before: Some(0),
        eval_after: Some(0),
        evaluation_loss: Some(0),
        best_move: None,
        best_eval: Some(0),
        second_best_eval: None,
        classification,
        motifs,
    }
}

/// A game where White plays `white` in order and Black always plays best.
pub fn game_from_labels(game_id: &str, white: &[Classification]) -> GameAnalysis {
    let mut moves = Vec::with_capacity(white.len() * 2);
    for (k, label) in white.iter().enumerate() {
        let motifs = if label.is_error() {
            vec![Motif::HangingPiece]
        } else {
            Vec::new()
        };
        moves.push(analyzed_move(2 * k, *label, motifs));
        moves.push(analyzed_move(2 * k + 1, Classification::Best, Vec::new()));
    }
    from_moves(game_id, moves)
}

pub fn from_moves(game_id: &str, moves: Vec<AnalyzedMove>) -> GameAnalysis {
    let labels = |side: Side| {
        moves
            .iter()
            .filter(move |m| m.side == side)
            .map(|m| m.classification)
            .collect::<Vec<_>>()
    };
    let (white, black) = (labels(Side::White), labels(Side::Black));

    GameAnalysis {
        game_id: game_id.to_string(),
        accuracy_white: accuracy(white.iter().copied()),
        accuracy_black: accuracy(black.iter().copied()),
        counts_white: ClassificationCounts::from_labels(white),
        counts_black: ClassificationCounts::from_labels(black),
        moves,
        source: EvaluationSource::Engine,
        depth: Some(18),
    }
}

/// White's labels for a game with opening 85%, middlegame 75% and
/// endgame 40% accuracy. White plies 1-15 are the opening (8 moves),
/// 17-39 the middlegame (12 moves), 41-59 the endgame (10 moves).
pub fn uneven_phases() -> Vec<Classification> {
    use Classification::*;
    let mut labels = Vec::new();
    // 6.8 / 8
    labels.extend([Best, Best, Excellent, Best, Best, Excellent, Best, Blunder]);
    // 9.0 / 12
    labels.extend([Best, Best, Excellent, Best, Mistake, Best, Best, Excellent, Blunder, Best, Best, Blunder]);
    // 4.0 / 10
    labels.extend([Best, Inaccuracy, Blunder, Inaccuracy, Inaccuracy, Best, Blunder, Inaccuracy, Blunder, Inaccuracy]);
    labels
}

/// White's labels for opening 85%, middlegame 75% and endgame 40% where
/// the endgame has fewer flawed moves (3) than there are errors overall (7).
pub fn error_heavy_phases() -> Vec<Classification> {
    use Classification::*;
    let mut labels = Vec::new();
    labels.extend([Best, Best, Best, Best, Best, Excellent, Excellent, Blunder]);
    labels.extend([Best; 9]);
    labels.extend([Blunder; 3]);
    labels.extend([Best, Best, Blunder, Blunder, Blunder]);
    labels
}

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
}
