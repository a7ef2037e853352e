//! Engine score normalisation.
//!
//! Engines report scores relative to the side to move, either in centipawns
//! or as mate-in-N. Everything downstream works on one signed centipawn scale
//! from White's perspective, with mates folded into a fixed band above
//! [`MATE_THRESHOLD`].

use chess_core::game_data::Side;
use serde::{Deserialize, Serialize};

/// Score of a delivered mate
pub const MATE_SCORE: i32 = 10_000;

/// Anything at or beyond this magnitude is a mate score
pub const MATE_THRESHOLD: i32 = 9_000;

/// Centipawn scores are capped here so they never reach the mate band
pub const MAX_CENTIPAWNS: i32 = 5_000;

/// Mate distances beyond this are folded together
const MAX_MATE_DISTANCE: i32 = 99;

/// Raw engine score, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EngineScore {
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated,
    /// zero = side to move is already checkmated)
    Mate(i32),
}

impl EngineScore {
    /// Signed centipawns from the side to move's perspective
    pub fn relative_cp(self) -> i32 {
        match self {
            EngineScore::Centipawns(cp) => cp.clamp(-MAX_CENTIPAWNS, MAX_CENTIPAWNS),
            EngineScore::Mate(0) => -MATE_SCORE,
            EngineScore::Mate(n) if n > 0 => MATE_SCORE - 10 * n.min(MAX_MATE_DISTANCE),
            EngineScore::Mate(n) => -(MATE_SCORE - 10 * (-n).min(MAX_MATE_DISTANCE)),
        }
    }
}

/// Everything the engine said about one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEval {
    /// Score of the best line; `None` when the position was not evaluated
    pub score: Option<EngineScore>,
    /// Best move in UCI notation
    pub best_move: Option<String>,
    /// Score of the second-best line (MultiPV 2)
    pub second_best: Option<EngineScore>,
    pub depth: Option<u32>,
}

impl PositionEval {
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A score-only evaluation, as produced by the heuristic evaluator
    pub fn score_only(score: EngineScore) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }

    pub fn is_available(&self) -> bool {
        self.score.is_some()
    }
}

/// Convert an engine score for a position with `side_to_move` to move into
/// White-perspective centipawns. Missing scores stay missing.
pub fn normalize(score: Option<EngineScore>, side_to_move: Side) -> Option<i32> {
    score.map(|s| {
        let cp = s.relative_cp();
        match side_to_move {
            Side::White => cp,
            Side::Black => -cp,
        }
    })
}

/// Re-express a White-perspective score from the mover's point of view
pub fn to_mover_frame(white_cp: i32, mover: Side) -> i32 {
    match mover {
        Side::White => white_cp,
        Side::Black => -white_cp,
    }
}

pub fn is_mate_score(cp: i32) -> bool {
    cp.abs() >= MATE_THRESHOLD
}

/// Approximate number of moves to mate encoded in a mate score.
/// Zero means the mate has already been delivered.
pub fn mate_distance(cp: i32) -> Option<i32> {
    if !is_mate_score(cp) {
        return None;
    }
    Some((MATE_SCORE - cp.abs()) / 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_flips_for_black() {
        assert_eq!(normalize(Some(EngineScore::Centipawns(35)), Side::White), Some(35));
        assert_eq!(normalize(Some(EngineScore::Centipawns(35)), Side::Black), Some(-35));
        assert_eq!(normalize(None, Side::White), None);
    }

    #[test]
    fn test_mate_scores_sit_above_centipawns() {
        let mate_in_3 = EngineScore::Mate(3).relative_cp();
        let mate_in_1 = EngineScore::Mate(1).relative_cp();
        let huge_cp = EngineScore::Centipawns(20_000).relative_cp();

        assert_eq!(huge_cp, MAX_CENTIPAWNS);
        assert!(mate_in_1 > mate_in_3);
        assert!(mate_in_3 > huge_cp);
        assert!(is_mate_score(mate_in_3));
        assert!(!is_mate_score(huge_cp));

        let mated_in_1 = EngineScore::Mate(-1).relative_cp();
        let mated_in_5 = EngineScore::Mate(-5).relative_cp();
        assert!(mated_in_1 < mated_in_5);
        assert!(mated_in_5 < -MAX_CENTIPAWNS);
        assert_eq!(EngineScore::Mate(0).relative_cp(), -MATE_SCORE);
    }

    #[test]
    fn test_monotonic_over_score_ladder() {
        let ladder = [
            EngineScore::Mate(0),
            EngineScore::Mate(-1),
            EngineScore::Mate(-40),
            EngineScore::Centipawns(-9000),
            EngineScore::Centipawns(-120),
            EngineScore::Centipawns(0),
            EngineScore::Centipawns(300),
            EngineScore::Centipawns(7000),
            EngineScore::Mate(150),
            EngineScore::Mate(12),
            EngineScore::Mate(1),
        ];
        for side in [Side::White, Side::Black] {
            let values: Vec<i32> = ladder
                .iter()
                .map(|s| to_mover_frame(normalize(Some(*s), side).unwrap(), side))
                .collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        }
    }

    #[test]
    fn test_mate_distance() {
        assert_eq!(mate_distance(EngineScore::Mate(4).relative_cp()), Some(4));
        assert_eq!(mate_distance(EngineScore::Mate(-2).relative_cp()), Some(2));
        assert_eq!(mate_distance(MATE_SCORE), Some(0));
        assert_eq!(mate_distance(250), None);
    }
}
