//! Static evaluation used when no engine is available: material plus a small
//! centralisation bonus. Much weaker than a search, so analyses built on it
//! are tagged as heuristic.

use chess::{BitBoard, Board, BoardStatus, Color, Piece, Square, ALL_SQUARES};
use chess_review::board_utils::parse_board;
use chess_review::eval::{EngineScore, PositionEval};

use crate::error::WorkerError;

const CENTER_BONUS: i32 = 20;
const EXTENDED_CENTER_BONUS: i32 = 10;

/// d4 e4 d5 e5
const CENTER: BitBoard = BitBoard(0x0000_0018_1800_0000);
/// c3-f3, c4 f4, c5 f5, c6-f6
const EXTENDED_CENTER: BitBoard = BitBoard(0x0000_3C24_243C_0000);

fn centipawns(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    }
}

fn square_bonus(square: Square) -> i32 {
    let bb = BitBoard::from_square(square);
    if CENTER & bb != chess::EMPTY {
        CENTER_BONUS
    } else if EXTENDED_CENTER & bb != chess::EMPTY {
        EXTENDED_CENTER_BONUS
    } else {
        0
    }
}

/// Score relative to the side to move, as an engine would report it
pub fn evaluate_board(board: &Board) -> EngineScore {
    match board.status() {
        BoardStatus::Checkmate => return EngineScore::Mate(0),
        BoardStatus::Stalemate => return EngineScore::Centipawns(0),
        BoardStatus::Ongoing => {}
    }

    let white: i32 = ALL_SQUARES
        .iter()
        .filter_map(|&sq| {
            let piece = board.piece_on(sq)?;
            let value = centipawns(piece) + square_bonus(sq);
            match board.color_on(sq)? {
                Color::White => Some(value),
                Color::Black => Some(-value),
            }
        })
        .sum();

    match board.side_to_move() {
        Color::White => EngineScore::Centipawns(white),
        Color::Black => EngineScore::Centipawns(-white),
    }
}

pub fn evaluate(fen: &str) -> Result<PositionEval, WorkerError> {
    let board = parse_board(fen)?;
    Ok(PositionEval::score_only(evaluate_board(&board)))
}
