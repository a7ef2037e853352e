/// Board helpers shared by the board-delta analyzer.

use std::str::FromStr;

use chess::{BitBoard, Board, Color, File, Piece, Rank, Square, EMPTY};
use chess_core::game_data::Side;

use crate::error::{Result, ReviewError};

// Piece values for material and exchange checks
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 99;

const BB_ALL: BitBoard = BitBoard(0xFFFF_FFFF_FFFF_FFFF);

/// Parse a FEN into a board, reporting the offending string on failure.
pub fn parse_board(fen: &str) -> Result<Board> {
    Board::from_str(fen).map_err(|e| ReviewError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e:?}"),
    })
}

pub fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

/// Piece value (no king)
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Piece value with the king worth more than anything it could take
pub fn exchange_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => KING_VALUE,
        other => piece_value(other),
    }
}

/// Squares attacked by the piece on `square`
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
        (Some(p), Some(c)) => (p, c),
        _ => return EMPTY,
    };

    match piece {
        Piece::Pawn => pawn_attacks(square, color),
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, *board.combined()),
        Piece::Rook => chess::get_rook_moves(square, *board.combined()),
        Piece::Queen => {
            chess::get_bishop_moves(square, *board.combined())
                | chess::get_rook_moves(square, *board.combined())
        }
    }
}

/// Pawn attack squares (just the diagonal attacks, not pushes)
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index();

    let target_rank = match color {
        Color::White if rank < 7 => rank + 1,
        Color::Black if rank > 0 => rank - 1,
        _ => return EMPTY,
    };

    let mut result = EMPTY;
    if file > 0 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(target_rank),
            File::from_index(file - 1),
        ));
    }
    if file < 7 {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(target_rank),
            File::from_index(file + 1),
        ));
    }
    result
}

/// All pieces of `color` that attack `square`
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let color_pieces = *board.color_combined(color);
    let queens = *board.pieces(Piece::Queen);

    let mut result = EMPTY;

    // Pawns: reverse lookup from the target square with the opposite color
    result |= pawn_attacks(square, !color) & *board.pieces(Piece::Pawn) & color_pieces;
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight) & color_pieces;
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King) & color_pieces;
    result |= chess::get_bishop_moves(square, occupied)
        & (*board.pieces(Piece::Bishop) | queens)
        & color_pieces;
    result |= chess::get_rook_moves(square, occupied)
        & (*board.pieces(Piece::Rook) | queens)
        & color_pieces;

    result
}

/// Piece types standing on the squares of a bitboard
pub fn pieces_on(board: &Board, squares: BitBoard) -> Vec<Piece> {
    squares.filter_map(|sq| board.piece_on(sq)).collect()
}

/// Whether the `color` piece on `square` is pinned to its own king.
pub fn is_pinned(board: &Board, color: Color, square: Square) -> bool {
    pin_direction(board, color, square) != BB_ALL
}

/// Get the pin direction for a piece. Returns the ray mask if pinned,
/// or every square if not pinned.
pub fn pin_direction(board: &Board, color: Color, square: Square) -> BitBoard {
    let king_sq = king_square(board, color);
    if king_sq == square {
        return BB_ALL;
    }

    let line = chess::line(king_sq, square);
    if line == EMPTY {
        return BB_ALL;
    }

    let king_file = king_sq.get_file().to_index() as i32;
    let king_rank = king_sq.get_rank().to_index() as i32;
    let sq_file = square.get_file().to_index() as i32;
    let sq_rank = square.get_rank().to_index() as i32;
    let is_diagonal = (king_file - sq_file).abs() == (king_rank - sq_rank).abs();

    let sliders = if is_diagonal {
        *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)
    } else {
        *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)
    };
    let pinners = sliders & *board.color_combined(!color);
    let occupied = *board.combined();

    for pinner_sq in pinners {
        if chess::line(king_sq, pinner_sq) != line {
            continue;
        }
        let blockers = chess::between(king_sq, pinner_sq) & occupied;
        if blockers == BitBoard::from_square(square) {
            return line;
        }
    }

    BB_ALL
}

/// Find the king square for a color
pub fn king_square(board: &Board, color: Color) -> Square {
    (*board.pieces(Piece::King) & *board.color_combined(color)).to_square()
}

/// Count material for one side
pub fn material_count(board: &Board, color: Color) -> i32 {
    let color_bb = *board.color_combined(color);
    [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
    ]
    .iter()
    .map(|&p| (*board.pieces(p) & color_bb).popcnt() as i32 * piece_value(p))
    .sum()
}

/// Material difference (positive = side has more)
pub fn material_diff(board: &Board, side: Color) -> i32 {
    material_count(board, side) - material_count(board, !side)
}

/// Distance between two files
pub fn file_distance(s1: Square, s2: Square) -> u32 {
    let f1 = s1.get_file().to_index() as i32;
    let f2 = s2.get_file().to_index() as i32;
    (f1 - f2).unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_str(s).unwrap()
    }

    #[test]
    fn test_king_square() {
        let board = Board::default();
        assert_eq!(king_square(&board, Color::White), sq("e1"));
        assert_eq!(king_square(&board, Color::Black), sq("e8"));
    }

    #[test]
    fn test_material_count_starting() {
        let board = Board::default();
        // 8 pawns + 2 knights + 2 bishops + 2 rooks + 1 queen = 8+6+6+10+9 = 39
        assert_eq!(material_count(&board, Color::White), 39);
        assert_eq!(material_count(&board, Color::Black), 39);
        assert_eq!(material_diff(&board, Color::White), 0);
    }

    #[test]
    fn test_pawn_attacks() {
        let white_atk = pawn_attacks(sq("e4"), Color::White);
        assert_eq!(white_atk.popcnt(), 2);
        assert_ne!(white_atk & BitBoard::from_square(sq("d5")), EMPTY);
        assert_ne!(white_atk & BitBoard::from_square(sq("f5")), EMPTY);

        assert_eq!(pawn_attacks(sq("a7"), Color::Black).popcnt(), 1);
        assert_eq!(pawn_attacks(sq("h8"), Color::White), EMPTY);
    }

    #[test]
    fn test_attackers_reverse_lookup() {
        let board =
            parse_board("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2").unwrap();
        let white_attackers = attackers(&board, Color::White, sq("e5"));
        assert_eq!(white_attackers, BitBoard::from_square(sq("f3")));
        assert_eq!(pieces_on(&board, white_attackers), vec![Piece::Knight]);
    }

    #[test]
    fn test_pin_detection() {
        // Bb5 pins the c6 knight against the e8 king
        let board =
            parse_board("r1bqkbnr/pp1ppppp/2n5/1Bp5/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3").unwrap();
        assert!(!is_pinned(&board, Color::Black, sq("c6")));

        let board =
            parse_board("r1bqkbnr/pp2pppp/2np4/1B6/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 0 4").unwrap();
        assert!(is_pinned(&board, Color::Black, sq("c6")));
        assert!(!is_pinned(&board, Color::Black, sq("e8")));
    }

    #[test]
    fn test_parse_board_rejects_garbage() {
        assert!(matches!(
            parse_board("not a fen"),
            Err(ReviewError::InvalidFen { .. })
        ));
    }
}
