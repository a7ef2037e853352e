//! Board-delta analysis: what a move changed on the board, read purely from
//! the positions before and after it.
//!
//! The hanging-piece test is a one-ply static exchange heuristic. It only has
//! to be good enough to tell a sacrifice from a quiet move.

use chess::{BitBoard, Board, BoardStatus, Color, MoveGen, Piece, Square, EMPTY};
use chess_core::game_data::Side;
use serde::{Deserialize, Serialize};

use crate::board_utils::{
    attackers, attacks, exchange_value, file_distance, is_pinned, king_square, material_diff,
    parse_board, pieces_on, piece_value, side_of,
};
use crate::error::Result;

/// Tactical tags attached to a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motif {
    Check,
    Checkmate,
    Capture,
    Promotion,
    Castling,
    EnPassant,
    /// Mover left one of its own pieces hanging
    HangingPiece,
    /// One of the mover's pieces became pinned to its king
    Pin,
    /// Moved piece attacks two or more of the enemy queen, rooks and king
    Fork,
    /// The position after the move is a forced mate against the mover
    AllowsMate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl From<Piece> for PieceKind {
    fn from(piece: Piece) -> Self {
        match piece {
            Piece::Pawn => PieceKind::Pawn,
            Piece::Knight => PieceKind::Knight,
            Piece::Bishop => PieceKind::Bishop,
            Piece::Rook => PieceKind::Rook,
            Piece::Queen => PieceKind::Queen,
            Piece::King => PieceKind::King,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangingPiece {
    pub square: String,
    pub piece: PieceKind,
}

/// Everything the classifier needs to know about the board around one move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDelta {
    pub mover: Side,
    /// Change in material balance, in pawns, from the mover's point of view
    pub material_delta: i32,
    /// The mover's own pieces that can be won next turn
    pub hanging_after: Vec<HangingPiece>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_capture: bool,
    pub is_castling: bool,
    pub is_en_passant: bool,
    pub is_promotion: bool,
    /// Whether the mover was in check before moving
    pub was_in_check: bool,
    pub legal_moves_before: usize,
    /// Destination square of the moved piece (the king's square for castling)
    pub destination: Option<String>,
    pub motifs: Vec<Motif>,
}

impl BoardDelta {
    /// True when a hanging own piece other than a pawn exists
    pub fn hangs_non_pawn(&self) -> bool {
        self.hanging_after
            .iter()
            .any(|h| !matches!(h.piece, PieceKind::Pawn | PieceKind::King))
    }

    pub fn hangs_any(&self) -> bool {
        !self.hanging_after.is_empty()
    }

    pub fn is_forced(&self) -> bool {
        self.legal_moves_before == 1
    }

    pub fn has_motif(&self, motif: Motif) -> bool {
        self.motifs.contains(&motif)
    }
}

/// Analyse the move that turned `fen_before` into `fen_after`. The mover is
/// the side to move in `fen_before`.
pub fn analyze(fen_before: &str, fen_after: &str) -> Result<BoardDelta> {
    let before = parse_board(fen_before)?;
    let after = parse_board(fen_after)?;
    Ok(analyze_boards(&before, &after))
}

pub fn analyze_boards(before: &Board, after: &Board) -> BoardDelta {
    let mover = before.side_to_move();
    let enemy = !mover;

    let own_before = *before.color_combined(mover);
    let own_after = *after.color_combined(mover);
    let enemy_before = *before.color_combined(enemy);
    let enemy_after = *after.color_combined(enemy);

    let arrived = own_after & !own_before;
    let removed = enemy_before & !enemy_after;

    let king_from = king_square(before, mover);
    let king_to = king_square(after, mover);
    let is_castling = file_distance(king_from, king_to) > 1;

    let is_capture = removed != EMPTY;
    // En passant is the only capture where the mover does not land on the victim
    let is_en_passant = is_capture && (removed & arrived) == EMPTY;

    let own_pawns = |b: &Board| (*b.pieces(Piece::Pawn) & *b.color_combined(mover)).popcnt();
    let is_promotion = own_pawns(after) < own_pawns(before);

    let destination = if is_castling {
        Some(king_to)
    } else if arrived.popcnt() == 1 {
        Some(arrived.to_square())
    } else {
        None
    };

    let hanging_after = hanging_pieces(before, after, mover);
    let is_check = after.checkers().popcnt() > 0;
    let is_checkmate = after.status() == BoardStatus::Checkmate;

    let mut motifs = Vec::new();
    if is_checkmate {
        motifs.push(Motif::Checkmate);
    } else if is_check {
        motifs.push(Motif::Check);
    }
    if is_capture {
        motifs.push(Motif::Capture);
    }
    if is_en_passant {
        motifs.push(Motif::EnPassant);
    }
    if is_promotion {
        motifs.push(Motif::Promotion);
    }
    if is_castling {
        motifs.push(Motif::Castling);
    }
    if !hanging_after.is_empty() {
        motifs.push(Motif::HangingPiece);
    }
    if newly_pinned(before, after, mover) {
        motifs.push(Motif::Pin);
    }
    if let Some(dest) = destination.filter(|_| !is_castling) {
        if is_fork(after, dest, enemy) {
            motifs.push(Motif::Fork);
        }
    }

    BoardDelta {
        mover: side_of(mover),
        material_delta: material_diff(after, mover) - material_diff(before, mover),
        hanging_after,
        is_check,
        is_checkmate,
        is_capture,
        is_castling,
        is_en_passant,
        is_promotion,
        was_in_check: before.checkers().popcnt() > 0,
        legal_moves_before: MoveGen::new_legal(before).len(),
        destination: destination.map(|sq| sq.to_string()),
        motifs,
    }
}

/// Every non-king piece of `mover` that is hanging on the board after the move
fn hanging_pieces(before: &Board, after: &Board, mover: Color) -> Vec<HangingPiece> {
    let own = *after.color_combined(mover) & !*after.pieces(Piece::King);
    own.filter(|&sq| is_piece_hanging(before, after, sq))
        .filter_map(|sq| {
            after.piece_on(sq).map(|piece| HangingPiece {
                square: sq.to_string(),
                piece: piece.into(),
            })
        })
        .collect()
}

/// One-ply exchange check for the piece on `square` after the move.
pub fn is_piece_hanging(before: &Board, after: &Board, square: Square) -> bool {
    let (piece, color) = match (after.piece_on(square), after.color_on(square)) {
        (Some(p), Some(c)) => (p, c),
        _ => return false,
    };
    if piece == Piece::King {
        return false;
    }

    let enemy_attackers = pieces_on(after, attackers(after, !color, square));
    if enemy_attackers.is_empty() {
        return false;
    }
    let defenders = pieces_on(after, attackers(after, color, square));

    // Just captured something worth at least as much on this square
    if before.color_on(square) == Some(!color) {
        if let Some(captured) = before.piece_on(square) {
            if piece_value(captured) >= piece_value(piece) {
                return false;
            }
        }
    }

    let value = piece_value(piece);
    if enemy_attackers.iter().any(|&a| exchange_value(a) < value) {
        return true;
    }

    if enemy_attackers.len() > defenders.len() {
        let cheapest_attacker = enemy_attackers
            .iter()
            .map(|&a| exchange_value(a))
            .min()
            .unwrap_or(i32::MAX);

        // Taking would lose the attacker to a cheaper defender
        if value < cheapest_attacker
            && defenders.iter().any(|&d| exchange_value(d) < cheapest_attacker)
        {
            return false;
        }
        if defenders.contains(&Piece::Pawn) {
            return false;
        }
        return true;
    }

    false
}

fn newly_pinned(before: &Board, after: &Board, mover: Color) -> bool {
    let candidates = *after.color_combined(mover) & !*after.pieces(Piece::King);
    candidates.into_iter().any(|sq| {
        is_pinned(after, mover, sq)
            && !(before.color_on(sq) == Some(mover)
                && before.piece_on(sq) == after.piece_on(sq)
                && is_pinned(before, mover, sq))
    })
}

fn is_fork(after: &Board, square: Square, enemy: Color) -> bool {
    let targets = (*after.pieces(Piece::Queen) | *after.pieces(Piece::Rook) | *after.pieces(Piece::King))
        & *after.color_combined(enemy);
    let hits: BitBoard = attacks(after, square) & targets;
    hits.popcnt() >= 2
}
