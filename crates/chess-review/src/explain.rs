//! Plain-language move explanations.
//!
//! Every classified move gets two texts: a one-line `simple` verdict and an
//! `advanced` paragraph. Both are built from the classification, the
//! evaluation loss, the engine's best move and what the move did on the board.

use std::str::FromStr;

use chess::{BitBoard, Board, Color, Piece, Square, EMPTY};
use chess_core::game_data::Side;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{AnalyzedMove, GameAnalysis};
use crate::board_delta::{analyze_boards, Motif, PieceKind};
use crate::board_utils::{attacks, king_square, parse_board, piece_value};
use crate::classification::Classification;
use crate::error::{Result, ReviewError};

// d4, e4, d5, e5
const CENTER: BitBoard = BitBoard(0x0000_0018_1800_0000);
const BACK_RANKS: BitBoard = BitBoard(0xFF00_0000_0000_00FF);

/// Tactical features of the move itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tactic {
    /// Took a piece worth more than the capturer
    WinningExchange,
    /// Took a piece worth less than the capturer, outside the top labels
    LosingExchange,
    Check,
    Checkmate,
    Promotion,
    /// Moved piece lands in, or attacks, the enemy king's zone
    KingAttack,
    Fork,
    /// Moved slider pins an enemy piece to its king
    Pin,
    Sacrifice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalFactor {
    Castling,
    KingsideCastle,
    QueensideCastle,
    CenterControl,
    Development,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveExplanation {
    pub index: usize,
    pub san: String,
    pub classification: Classification,
    pub simple: String,
    pub advanced: String,
    pub tactics: Vec<Tactic>,
    pub positional: Vec<PositionalFactor>,
}

#[derive(Debug, Default)]
struct Features {
    piece: Option<PieceKind>,
    captured: Option<PieceKind>,
    is_castling: bool,
    kingside: bool,
    develops: bool,
    controls_center: bool,
    tactics: Vec<Tactic>,
    positional: Vec<PositionalFactor>,
}

impl Features {
    fn has(&self, tactic: Tactic) -> bool {
        self.tactics.contains(&tactic)
    }

    fn has_factor(&self, factor: PositionalFactor) -> bool {
        self.positional.contains(&factor)
    }

    fn piece_name(&self) -> &'static str {
        self.piece.map_or("piece", piece_name)
    }

    fn captured_name(&self) -> &'static str {
        self.captured.map_or("piece", piece_name)
    }
}

/// Explain one classified move. Moves whose positions cannot be read get a
/// generic text and no features.
pub fn explain_move(mv: &AnalyzedMove) -> MoveExplanation {
    let (simple, advanced, features) = match features(mv) {
        Ok(features) => {
            let (simple, advanced) = describe(mv, &features);
            (simple, advanced, features)
        }
        Err(e) => {
            debug!(index = mv.index, error = %e, "Explaining move without board features");
            (
                format!("Move {} played.", mv.san),
                format!("The move {} was played in this position.", mv.san),
                Features::default(),
            )
        }
    };

    MoveExplanation {
        index: mv.index,
        san: mv.san.clone(),
        classification: mv.classification,
        simple,
        advanced,
        tactics: features.tactics,
        positional: features.positional,
    }
}

/// Explanations for one side's moves, or every move when `side` is `None`.
pub fn explain_game(analysis: &GameAnalysis, side: Option<Side>) -> Vec<MoveExplanation> {
    analysis
        .moves
        .iter()
        .filter(|m| side.map_or(true, |s| m.side == s))
        .map(explain_move)
        .collect()
}

fn parse_uci(uci: &str) -> Result<(Square, Square, Option<Piece>)> {
    let invalid = || ReviewError::InvalidMove {
        uci: uci.to_string(),
    };
    let square = |range: std::ops::Range<usize>| {
        uci.get(range)
            .and_then(|s| Square::from_str(s).ok())
            .ok_or_else(invalid)
    };
    let promotion = match uci.get(4..5) {
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return Err(invalid()),
        None => None,
    };
    Ok((square(0..2)?, square(2..4)?, promotion))
}

fn features(mv: &AnalyzedMove) -> Result<Features> {
    let before = parse_board(&mv.fen_before)?;
    let after = parse_board(&mv.fen_after)?;
    let (from, to, promotion) = parse_uci(&mv.uci)?;
    let delta = analyze_boards(&before, &after);
    let mover = before.side_to_move();

    let moved = before.piece_on(from);
    let captured = if delta.is_en_passant {
        Some(Piece::Pawn)
    } else if before.color_on(to) == Some(!mover) {
        before.piece_on(to)
    } else {
        None
    };

    let mut f = Features {
        piece: moved.map(PieceKind::from),
        captured: captured.map(PieceKind::from),
        ..Features::default()
    };

    if let (Some(taken), Some(piece)) = (captured, moved) {
        let (gained, lost) = (piece_value(taken), piece_value(piece));
        if gained > lost {
            f.tactics.push(Tactic::WinningExchange);
        } else if gained < lost
            && !matches!(
                mv.classification,
                Classification::Brilliant | Classification::Great | Classification::Best
            )
        {
            f.tactics.push(Tactic::LosingExchange);
        }
    }

    if delta.is_check {
        f.tactics.push(Tactic::Check);
    }
    if delta.is_checkmate {
        f.tactics.push(Tactic::Checkmate);
    }

    if delta.is_castling {
        f.is_castling = true;
        f.kingside = to.get_file().to_index() > 4;
        f.positional.push(PositionalFactor::Castling);
        f.positional.push(if f.kingside {
            PositionalFactor::KingsideCastle
        } else {
            PositionalFactor::QueensideCastle
        });
    }

    if promotion.is_some() || delta.is_promotion {
        f.tactics.push(Tactic::Promotion);
    }

    let to_bb = BitBoard::from_square(to);
    if to_bb & CENTER != EMPTY {
        f.controls_center = true;
        f.positional.push(PositionalFactor::CenterControl);
    }

    if matches!(moved, Some(Piece::Knight | Piece::Bishop))
        && BitBoard::from_square(from) & BACK_RANKS != EMPTY
        && to_bb & BACK_RANKS == EMPTY
    {
        f.develops = true;
        f.positional.push(PositionalFactor::Development);
    }

    let enemy_king = king_square(&after, !mover);
    let zone = chess::get_king_moves(enemy_king) | BitBoard::from_square(enemy_king);
    if !delta.is_castling && (to_bb & zone != EMPTY || attacks(&after, to) & zone != EMPTY) {
        f.tactics.push(Tactic::KingAttack);
    }

    if delta.has_motif(Motif::Fork) {
        f.tactics.push(Tactic::Fork);
    }
    if let Some(piece) = moved.filter(|_| !delta.is_castling) {
        if pins_to_king(&after, piece, to, mover) {
            f.tactics.push(Tactic::Pin);
        }
    }

    if mv.classification == Classification::Brilliant {
        f.tactics.push(Tactic::Sacrifice);
    }

    Ok(f)
}

/// Whether the slider now on `square` pins exactly one enemy piece to the
/// enemy king, with none of its own pieces in the way.
fn pins_to_king(after: &Board, piece: Piece, square: Square, mover: Color) -> bool {
    let rays = match piece {
        Piece::Bishop => chess::get_bishop_moves(square, EMPTY),
        Piece::Rook => chess::get_rook_moves(square, EMPTY),
        Piece::Queen => chess::get_bishop_moves(square, EMPTY) | chess::get_rook_moves(square, EMPTY),
        _ => return false,
    };
    let king = king_square(after, !mover);
    if rays & BitBoard::from_square(king) == EMPTY {
        return false;
    }
    let between = chess::between(square, king);
    let enemy = (between & *after.color_combined(!mover)).popcnt();
    let own = (between & *after.color_combined(mover)).popcnt();
    enemy == 1 && own == 0
}

fn piece_name(piece: PieceKind) -> &'static str {
    match piece {
        PieceKind::Pawn => "pawn",
        PieceKind::Knight => "knight",
        PieceKind::Bishop => "bishop",
        PieceKind::Rook => "rook",
        PieceKind::Queen => "queen",
        PieceKind::King => "king",
    }
}

fn describe(mv: &AnalyzedMove, f: &Features) -> (String, String) {
    let san = mv.san.as_str();
    let loss = mv.evaluation_loss.unwrap_or(0).max(0) as f64 / 100.0;
    let best = mv.best_move.as_deref();

    match mv.classification {
        Classification::Brilliant => (brilliant_simple(f, san), brilliant_advanced(f, san)),
        Classification::Great => (great_simple(f, san), great_advanced(f, san)),
        Classification::Best => (best_simple(f, san), best_advanced(f, san)),
        Classification::Excellent => {
            let mut parts = vec![format!("{san} is very strong, nearly matching the engine's top choice.")];
            if f.captured.is_some() {
                parts.push(format!("Taking the {} simplifies favourably.", f.captured_name()));
            }
            if f.controls_center {
                parts.push("It expands central influence.".to_string());
            }
            (
                format!("Excellent {} move, a strong continuation.", f.piece_name()),
                parts.join(" "),
            )
        }
        Classification::Good => (good_simple(f), good_advanced(f, san)),
        Classification::Book => (
            "Standard opening move from established theory.".to_string(),
            "A well-known theoretical move. Knowing the opening saves time in familiar positions."
                .to_string(),
        ),
        Classification::Forced => (
            "The only legal move.".to_string(),
            format!("With a single legal option, {san} was forced."),
        ),
        Classification::Inaccuracy => {
            let simple = match best {
                Some(b) => format!("Small inaccuracy, about {loss:.1} pawns given up. {b} was more accurate."),
                None => format!("A slight inaccuracy costing about {loss:.1} pawns."),
            };
            let mut parts = vec![format!("{san} gives up roughly {loss:.1} pawns of advantage.")];
            if let Some(b) = best {
                parts.push(format!("The engine prefers {b}."));
            }
            parts.push("Not a serious error, but precision matters when converting an advantage.".to_string());
            (simple, parts.join(" "))
        }
        Classification::Mistake => {
            let simple = match best {
                Some(b) => format!("Mistake! This loses about {loss:.1} pawns. {b} was much better."),
                None => format!("A significant mistake losing about {loss:.1} pawns."),
            };
            let mut parts = vec![format!("{san} is a clear mistake, dropping about {loss:.1} pawns.")];
            if let Some(b) = best {
                parts.push(format!("The correct move was {b}."));
            }
            parts.push(error_cause(mv, f).to_string());
            (simple, parts.join(" "))
        }
        Classification::Blunder => {
            let simple = if mv.has_motif(Motif::AllowsMate) {
                format!(
                    "Blunder! This allows a forced mate. {} was necessary.",
                    best.unwrap_or("Another move")
                )
            } else if loss >= 5.0 {
                format!(
                    "Major blunder losing over {loss:.0} pawns! {} was critical.",
                    best.unwrap_or("Another move")
                )
            } else if let Some(b) = best {
                format!("Blunder losing {loss:.1} pawns! {b} was essential to hold the position.")
            } else {
                format!("Serious blunder, about {loss:.1} pawns lost.")
            };
            let mut parts = vec![format!("{san} is a serious error losing about {loss:.1} pawns.")];
            if let Some(b) = best {
                parts.push(format!("The saving move was {b}."));
            }
            parts.push(error_cause(mv, f).to_string());
            parts.push("Errors like this decide games at every level.".to_string());
            (simple, parts.join(" "))
        }
        Classification::Neutral => (
            format!("The {} moves to a new square.", f.piece_name()),
            format!("This {} move changes the position; it could not be evaluated.", f.piece_name()),
        ),
    }
}

fn error_cause(mv: &AnalyzedMove, f: &Features) -> &'static str {
    if mv.has_motif(Motif::AllowsMate) {
        "It walks into a forced mate."
    } else if mv.has_motif(Motif::HangingPiece) {
        "It leaves a piece hanging."
    } else if mv.has_motif(Motif::Pin) {
        "It leaves one of your pieces pinned to the king."
    } else if f.captured.is_some() {
        "This capture loses material or allows a strong reply."
    } else {
        "It overlooks a tactic or creates a weakness."
    }
}

fn brilliant_simple(f: &Features, san: &str) -> String {
    if f.has(Tactic::Sacrifice) {
        format!(
            "Brilliant sacrifice! Giving up the {} creates an attack that is hard to see.",
            f.piece_name()
        )
    } else {
        format!("Brilliant! {san} finds a hidden winning idea.")
    }
}

fn brilliant_advanced(f: &Features, san: &str) -> String {
    let mut parts = vec![format!("{san} shows deep calculation.")];
    if f.has(Tactic::Sacrifice) {
        parts.push("Material is given up for a decisive attack.".to_string());
    }
    if f.has(Tactic::KingAttack) {
        parts.push("The enemy king is exposed to dangerous threats.".to_string());
    }
    if f.has(Tactic::Fork) {
        parts.push("A fork wins the material back with interest.".to_string());
    }
    parts.join(" ")
}

fn great_simple(f: &Features, san: &str) -> String {
    if f.has(Tactic::Check) {
        format!("Great move! {san} gives check while creating strong threats.")
    } else if f.captured.is_some() {
        format!("Great capture! Taking the {} is the best response.", f.captured_name())
    } else {
        format!("Great find! {san} is much stronger than the alternatives.")
    }
}

fn great_advanced(f: &Features, san: &str) -> String {
    let mut parts = vec![format!("{san} is clearly the best move.")];
    if f.has(Tactic::Check) {
        parts.push("The check forces the opponent onto the defensive.".to_string());
    }
    if f.has(Tactic::Fork) {
        parts.push("Several pieces are attacked at once.".to_string());
    }
    if f.has(Tactic::Pin) {
        parts.push("An enemy piece is pinned to its king.".to_string());
    }
    parts.push("Every alternative is significantly weaker.".to_string());
    parts.join(" ")
}

fn best_simple(f: &Features, san: &str) -> String {
    if f.is_castling {
        let wing = if f.kingside { "kingside" } else { "queenside" };
        format!("Castling {wing} protects your king and connects your rooks.")
    } else if f.has(Tactic::Checkmate) {
        format!("Checkmate! {san} ends the game.")
    } else if f.captured.is_some() {
        format!("Best move! Capturing the {} is objectively strongest.", f.captured_name())
    } else if f.develops {
        format!("Perfect development! The {} finds its ideal square.", f.piece_name())
    } else {
        "The engine's top choice, the strongest move in the position.".to_string()
    }
}

fn best_advanced(f: &Features, san: &str) -> String {
    let mut parts = vec![format!("{san} is the objectively strongest continuation.")];
    if f.has_factor(PositionalFactor::CenterControl) {
        parts.push("It establishes central control.".to_string());
    }
    if f.has_factor(PositionalFactor::Development) {
        parts.push("It develops a piece.".to_string());
    }
    if f.has_factor(PositionalFactor::Castling) {
        parts.push("The king is safe and the rook joins the game.".to_string());
    }
    if f.has(Tactic::Check) {
        parts.push("The check disrupts the opponent's coordination.".to_string());
    }
    if f.tactics.is_empty() && f.positional.is_empty() {
        parts.push("It keeps the pieces active and limits counterplay.".to_string());
    }
    parts.join(" ")
}

fn good_simple(f: &Features) -> String {
    if f.develops {
        format!("Good development! The {} moves to an active square.", f.piece_name())
    } else if f.controls_center {
        "Solid move that controls central squares.".to_string()
    } else if f.captured.is_some() {
        format!("Reasonable capture. Taking the {} is sensible.", f.captured_name())
    } else {
        format!("A solid {} move that keeps the position.", f.piece_name())
    }
}

fn good_advanced(f: &Features, san: &str) -> String {
    let mut parts = vec![format!("{san} is reasonable with no significant drawbacks.")];
    if f.controls_center {
        parts.push("Central squares stay under control.".to_string());
    }
    if f.develops {
        parts.push("Piece activity improves.".to_string());
    }
    if f.positional.is_empty() {
        parts.push("The position stays balanced.".to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accuracy::Accuracy;
    use crate::analysis::{ClassificationCounts, EvaluationSource};

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn mv(
        san: &str,
        uci: &str,
        fen_before: &str,
        fen_after: &str,
        classification: Classification,
    ) -> AnalyzedMove {
        AnalyzedMove {
            index: 0,
            move_number: 1,
            side: Side::White,
            san: san.to_string(),
            uci: uci.to_string(),
            fen_before: fen_before.to_string(),
            fen_after: fen_after.to_string(),
            eval_before: Some(30),
            eval_after: Some(30),
            evaluation_loss: Some(0),
            best_move: None,
            best_eval: Some(30),
            second_best_eval: None,
            classification,
            motifs: Vec::new(),
        }
    }

    #[test]
    fn test_central_pawn_push() {
        let e = explain_move(&mv("e4", "e2e4", START, AFTER_E4, Classification::Best));
        assert_eq!(e.positional, vec![PositionalFactor::CenterControl]);
        assert!(e.tactics.is_empty());
        assert_eq!(e.simple, "The engine's top choice, the strongest move in the position.");
        assert!(e.advanced.contains("central control"));
    }

    #[test]
    fn test_knight_development() {
        let after = "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1";
        let e = explain_move(&mv("Nf3", "g1f3", START, after, Classification::Good));
        assert_eq!(e.positional, vec![PositionalFactor::Development]);
        assert_eq!(e.simple, "Good development! The knight moves to an active square.");
    }

    #[test]
    fn test_kingside_castling() {
        let before = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
        let after = "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQ1RK1 b kq - 5 4";
        let e = explain_move(&mv("O-O", "e1g1", before, after, Classification::Best));
        assert_eq!(
            e.positional,
            vec![PositionalFactor::Castling, PositionalFactor::KingsideCastle]
        );
        assert!(e.simple.starts_with("Castling kingside"));
    }

    #[test]
    fn test_checkmate() {
        let before = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
        let after = "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4";
        let e = explain_move(&mv("Qxf7#", "h5f7", before, after, Classification::Best));
        assert!(e.tactics.contains(&Tactic::Check));
        assert!(e.tactics.contains(&Tactic::Checkmate));
        assert!(e.tactics.contains(&Tactic::KingAttack));
        assert!(!e.tactics.contains(&Tactic::LosingExchange));
        assert_eq!(e.simple, "Checkmate! Qxf7# ends the game.");
    }

    #[test]
    fn test_bishop_pin() {
        // Bb5 pins the c6 knight after ...d6
        let before = "r1bqkbnr/pp2pppp/2np4/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 0 4";
        let after = "r1bqkbnr/pp2pppp/2np4/1Bp5/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 1 4";
        let e = explain_move(&mv("Bb5", "f1b5", before, after, Classification::Great));
        assert!(e.tactics.contains(&Tactic::Pin));
        assert!(e.advanced.contains("pinned to its king"));
    }

    #[test]
    fn test_blunder_names_the_best_move() {
        let mut m = mv("e4", "e2e4", START, AFTER_E4, Classification::Blunder);
        m.evaluation_loss = Some(350);
        m.best_move = Some("d2d4".to_string());
        m.motifs = vec![Motif::HangingPiece];
        let e = explain_move(&m);
        assert_eq!(e.simple, "Blunder losing 3.5 pawns! d2d4 was essential to hold the position.");
        assert!(e.advanced.contains("The saving move was d2d4."));
        assert!(e.advanced.contains("leaves a piece hanging"));

        m.evaluation_loss = Some(720);
        assert!(explain_move(&m).simple.starts_with("Major blunder losing over 7 pawns"));

        m.motifs = vec![Motif::AllowsMate];
        assert!(explain_move(&m).simple.contains("allows a forced mate"));
    }

    #[test]
    fn test_inaccuracy_without_best_move() {
        let mut m = mv("e4", "e2e4", START, AFTER_E4, Classification::Inaccuracy);
        m.evaluation_loss = Some(60);
        let e = explain_move(&m);
        assert_eq!(e.simple, "A slight inaccuracy costing about 0.6 pawns.");
    }

    #[test]
    fn test_unreadable_position_gets_generic_text() {
        let e = explain_move(&mv("e4", "e2e4", "garbage", AFTER_E4, Classification::Best));
        assert_eq!(e.simple, "Move e4 played.");
        assert!(e.tactics.is_empty() && e.positional.is_empty());

        let e = explain_move(&mv("e4", "zz", START, AFTER_E4, Classification::Best));
        assert_eq!(e.simple, "Move e4 played.");
    }

    #[test]
    fn test_explain_game_filters_by_side() {
        let white = mv("e4", "e2e4", START, AFTER_E4, Classification::Best);
        let mut black = mv(
            "e5",
            "e7e5",
            AFTER_E4,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
            Classification::Book,
        );
        black.index = 1;
        black.side = Side::Black;
        let analysis = GameAnalysis {
            game_id: "g".to_string(),
            moves: vec![white, black],
            accuracy_white: Accuracy::insufficient(),
            accuracy_black: Accuracy::insufficient(),
            counts_white: ClassificationCounts::default(),
            counts_black: ClassificationCounts::default(),
            source: EvaluationSource::Engine,
            depth: None,
        };

        assert_eq!(explain_game(&analysis, None).len(), 2);
        let for_black = explain_game(&analysis, Some(Side::Black));
        assert_eq!(for_black.len(), 1);
        assert_eq!(for_black[0].index, 1);
        assert!(for_black[0].simple.starts_with("Standard opening move"));
    }
}
