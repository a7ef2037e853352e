//! Move classification.
//!
//! One label per move, decided in a fixed order: forced, book, brilliant,
//! great, best, then the evaluation-loss ladder. The loss ladder uses
//! thresholds that widen as the position gets more decided, so a 100cp slip
//! at +800 costs less than the same slip at 0.

use serde::{Deserialize, Serialize};

use crate::board_delta::BoardDelta;
use crate::eval::{is_mate_score, mate_distance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Book,
    Forced,
    Inaccuracy,
    Mistake,
    Blunder,
    /// No evaluation was available for the move
    Neutral,
}

impl Classification {
    /// All labels, most desirable first
    pub const ALL: [Classification; 11] = [
        Classification::Brilliant,
        Classification::Great,
        Classification::Best,
        Classification::Excellent,
        Classification::Good,
        Classification::Book,
        Classification::Forced,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Blunder,
        Classification::Neutral,
    ];

    /// Accuracy weight in [0, 1]; `None` for moves that are not scored.
    pub fn weight(self) -> Option<f64> {
        match self {
            Classification::Blunder => Some(0.0),
            Classification::Mistake => Some(0.2),
            Classification::Inaccuracy => Some(0.4),
            Classification::Good => Some(0.65),
            Classification::Excellent => Some(0.9),
            Classification::Best
            | Classification::Great
            | Classification::Brilliant
            | Classification::Book
            | Classification::Forced => Some(1.0),
            Classification::Neutral => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::Brilliant => "brilliant",
            Classification::Great => "great",
            Classification::Best => "best",
            Classification::Excellent => "excellent",
            Classification::Good => "good",
            Classification::Book => "book",
            Classification::Forced => "forced",
            Classification::Inaccuracy => "inaccuracy",
            Classification::Mistake => "mistake",
            Classification::Blunder => "blunder",
            Classification::Neutral => "neutral",
        }
    }

    pub fn is_classified(self) -> bool {
        self != Classification::Neutral
    }

    /// Inaccuracy, mistake or blunder
    pub fn is_flawed(self) -> bool {
        matches!(
            self,
            Classification::Inaccuracy | Classification::Mistake | Classification::Blunder
        )
    }

    /// Mistake or blunder
    pub fn is_error(self) -> bool {
        matches!(self, Classification::Mistake | Classification::Blunder)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// `t(x) = max(0, a·x² + b·x + c)` of the absolute previous evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Threshold {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Largest loss (exclusive) tolerated at `prev_eval`
    pub fn at(&self, prev_eval: i32) -> f64 {
        let x = f64::from(prev_eval.unsigned_abs());
        (self.a * x * x + self.b * x + self.c).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub excellent: Threshold,
    pub good: Threshold,
    pub inaccuracy: Threshold,
    pub mistake: Threshold,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            excellent: Threshold::new(0.0002, 0.1231, 27.5455),
            good: Threshold::new(0.0002, 0.2643, 60.5455),
            inaccuracy: Threshold::new(0.0002, 0.3624, 108.0909),
            mistake: Threshold::new(0.0003, 0.4027, 225.8182),
        }
    }
}

/// Softening applied when the game is already decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leniency {
    /// A blunder that still leaves the mover at least this well off is an inaccuracy
    pub winning_blunder: i32,
    /// A blunder from a position at or below this is an inaccuracy
    pub lost_blunder: i32,
    /// An inaccuracy that still leaves the mover at least this well off is good
    pub winning_inaccuracy: i32,
}

impl Default for Leniency {
    fn default() -> Self {
        Self {
            winning_blunder: 600,
            lost_blunder: -600,
            winning_inaccuracy: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub thresholds: Thresholds,
    /// Plies (1-based) up to this number count as book when not blunders
    pub book_ply_threshold: usize,
    /// Brilliancies need the second-best line below this magnitude
    pub brilliant_second_best_limit: i32,
    /// Brilliancies need the position after to stay at least this good
    pub brilliant_min_eval_after: i32,
    /// Gap between best and second-best line that makes a move great
    pub great_margin: i32,
    pub leniency: Option<Leniency>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            book_ply_threshold: 10,
            brilliant_second_best_limit: 700,
            brilliant_min_eval_after: -50,
            great_margin: 150,
            leniency: Some(Leniency::default()),
        }
    }
}

/// Everything known about one move, evaluations in the mover's frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveInput<'a> {
    /// 1-based ply number in the game
    pub ply: usize,
    /// Engine score of the position before the move (the best line)
    pub eval_before: Option<i32>,
    pub eval_after: Option<i32>,
    pub second_best: Option<i32>,
    /// `None` when the engine reported no best move
    pub is_best_move: Option<bool>,
    pub in_book: bool,
    pub delta: Option<&'a BoardDelta>,
}

/// Evaluation loss in the mover's frame, never negative
pub fn evaluation_loss(eval_before: i32, eval_after: i32) -> i32 {
    (eval_before - eval_after).max(0)
}

/// Assign exactly one label to a move.
pub fn classify_move(config: &ClassifierConfig, input: &MoveInput<'_>) -> Classification {
    let (prev, curr) = match (input.eval_before, input.eval_after) {
        (Some(prev), Some(curr)) => (prev, curr),
        _ => return Classification::Neutral,
    };

    if input.delta.is_some_and(BoardDelta::is_forced) {
        return Classification::Forced;
    }

    let loss = evaluation_loss(prev, curr);
    let in_opening = input.ply <= config.book_ply_threshold || input.in_book;
    if in_opening && f64::from(loss) < config.thresholds.mistake.at(prev) {
        return Classification::Book;
    }

    let mate_before = is_mate_score(prev);
    let mate_after = is_mate_score(curr);

    if input.is_best_move == Some(true) {
        if let (Some(second), Some(delta)) = (input.second_best, input.delta) {
            if second.abs() < config.brilliant_second_best_limit
                && delta.hangs_non_pawn()
                && !delta.was_in_check
                && curr >= config.brilliant_min_eval_after
                && !mate_before
            {
                return Classification::Brilliant;
            }

            if prev - second >= config.great_margin
                && !delta.hangs_any()
                && !mate_before
                && !mate_after
            {
                return Classification::Great;
            }
        }
        return Classification::Best;
    }

    let graded = if mate_before || mate_after {
        classify_mate(prev, curr)
    } else {
        classify_loss(&config.thresholds, prev, loss)
    };

    match config.leniency {
        Some(leniency) => apply_leniency(&leniency, graded, prev, curr),
        None => graded,
    }
}

fn classify_loss(thresholds: &Thresholds, prev: i32, loss: i32) -> Classification {
    let loss = f64::from(loss);
    if loss < thresholds.excellent.at(prev) {
        Classification::Excellent
    } else if loss < thresholds.good.at(prev) {
        Classification::Good
    } else if loss < thresholds.inaccuracy.at(prev) {
        Classification::Inaccuracy
    } else if loss < thresholds.mistake.at(prev) {
        Classification::Mistake
    } else {
        Classification::Blunder
    }
}

/// Grading when either side of the move is a forced mate.
fn classify_mate(prev: i32, curr: i32) -> Classification {
    let before = mate_distance(prev);
    let after = mate_distance(curr);

    match (before, after) {
        // Walked into (or found) a mate
        (None, Some(d_after)) => {
            if curr > 0 {
                Classification::Best
            } else if d_after <= 2 {
                Classification::Blunder
            } else if d_after <= 5 {
                Classification::Mistake
            } else {
                Classification::Inaccuracy
            }
        }
        // Mate on the board before, gone after
        (Some(_), None) => {
            if prev < 0 {
                if curr >= 0 {
                    Classification::Best
                } else {
                    Classification::Good
                }
            } else if curr >= 400 {
                Classification::Good
            } else if curr >= 150 {
                Classification::Inaccuracy
            } else if curr >= -100 {
                Classification::Mistake
            } else {
                Classification::Blunder
            }
        }
        (Some(d_before), Some(d_after)) => {
            if prev > 0 {
                if curr < 0 {
                    if d_after <= 3 {
                        Classification::Blunder
                    } else {
                        Classification::Mistake
                    }
                } else if d_after <= d_before {
                    Classification::Best
                } else if d_after <= d_before + 2 {
                    Classification::Excellent
                } else {
                    Classification::Good
                }
            } else if curr > 0 || d_after >= d_before {
                Classification::Best
            } else {
                Classification::Good
            }
        }
        (None, None) => Classification::Good,
    }
}

/// Softens labels in decided positions. The steps chain: a blunder eased to
/// an inaccuracy can be eased again to good.
fn apply_leniency(
    leniency: &Leniency,
    graded: Classification,
    prev: i32,
    curr: i32,
) -> Classification {
    let mut label = graded;
    if label == Classification::Blunder
        && (curr >= leniency.winning_blunder
            || (prev <= leniency.lost_blunder && !is_mate_score(prev) && !is_mate_score(curr)))
    {
        label = Classification::Inaccuracy;
    }
    if label == Classification::Inaccuracy && curr >= leniency.winning_inaccuracy {
        label = Classification::Good;
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_delta::{HangingPiece, PieceKind};
    use crate::eval::EngineScore;
    use chess_core::game_data::Side;

    fn delta(hanging: Vec<HangingPiece>, legal_moves: usize) -> BoardDelta {
        BoardDelta {
            mover: Side::White,
            material_delta: 0,
            hanging_after: hanging,
            is_check: false,
            is_checkmate: false,
            is_capture: false,
            is_castling: false,
            is_en_passant: false,
            is_promotion: false,
            was_in_check: false,
            legal_moves_before: legal_moves,
            destination: None,
            motifs: Vec::new(),
        }
    }

    fn knight_hanging() -> Vec<HangingPiece> {
        vec![HangingPiece {
            square: "f7".to_string(),
            piece: PieceKind::Knight,
        }]
    }

    fn middlegame(prev: i32, curr: i32) -> MoveInput<'static> {
        MoveInput {
            ply: 30,
            eval_before: Some(prev),
            eval_after: Some(curr),
            is_best_move: Some(false),
            ..MoveInput::default()
        }
    }

    #[test]
    fn test_missing_evaluation_is_neutral() {
        let config = ClassifierConfig::default();
        let input = MoveInput {
            ply: 20,
            eval_before: Some(30),
            ..MoveInput::default()
        };
        assert_eq!(classify_move(&config, &input), Classification::Neutral);
    }

    #[test]
    fn test_thresholds_are_ordered_and_monotonic() {
        let t = Thresholds::default();
        let mut last = [0.0; 4];
        for x in (-3000..=3000).step_by(50) {
            let values = [
                t.excellent.at(x),
                t.good.at(x),
                t.inaccuracy.at(x),
                t.mistake.at(x),
            ];
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            if x >= 0 {
                for (v, l) in values.iter().zip(last.iter()) {
                    assert!(v >= l);
                }
                last = values;
            }
        }
    }

    #[test]
    fn test_small_slip_in_level_position() {
        let config = ClassifierConfig::default();
        assert_eq!(classify_move(&config, &middlegame(20, 0)), Classification::Excellent);
        assert_eq!(classify_move(&config, &middlegame(20, -30)), Classification::Good);
        assert_eq!(classify_move(&config, &middlegame(20, -70)), Classification::Inaccuracy);
        assert_eq!(classify_move(&config, &middlegame(20, -200)), Classification::Mistake);
        assert_eq!(classify_move(&config, &middlegame(40, -260)), Classification::Blunder);
    }

    #[test]
    fn test_same_loss_matters_less_when_decided() {
        let config = ClassifierConfig {
            leniency: None,
            ..ClassifierConfig::default()
        };
        let balanced = classify_move(&config, &middlegame(0, -90));
        let decided = classify_move(&config, &middlegame(900, 810));
        assert_eq!(balanced, Classification::Inaccuracy);
        assert_eq!(decided, Classification::Excellent);
    }

    #[test]
    fn test_forced_needs_board_delta() {
        let config = ClassifierConfig::default();
        let only_move = delta(Vec::new(), 1);
        let mut input = middlegame(-50, -400);
        assert_eq!(classify_move(&config, &input), Classification::Blunder);
        input.delta = Some(&only_move);
        assert_eq!(classify_move(&config, &input), Classification::Forced);
    }

    #[test]
    fn test_book_never_hides_a_blunder() {
        let config = ClassifierConfig::default();
        let mut input = middlegame(30, 0);
        input.ply = 6;
        assert_eq!(classify_move(&config, &input), Classification::Book);

        input.eval_after = Some(-400);
        assert_eq!(classify_move(&config, &input), Classification::Blunder);

        let mut late = middlegame(30, 0);
        late.ply = 24;
        late.in_book = true;
        assert_eq!(classify_move(&config, &late), Classification::Book);
    }

    #[test]
    fn test_great_when_only_move_keeps_advantage() {
        let config = ClassifierConfig::default();
        let quiet = delta(Vec::new(), 30);
        let input = MoveInput {
            ply: 25,
            eval_before: Some(150),
            eval_after: Some(150),
            second_best: Some(-750),
            is_best_move: Some(true),
            in_book: false,
            delta: Some(&quiet),
        };
        assert_eq!(classify_move(&config, &input), Classification::Great);
    }

    #[test]
    fn test_brilliant_needs_a_sacrifice() {
        let config = ClassifierConfig::default();
        let sac = delta(knight_hanging(), 30);
        let mut input = MoveInput {
            ply: 25,
            eval_before: Some(250),
            eval_after: Some(240),
            second_best: Some(20),
            is_best_move: Some(true),
            in_book: false,
            delta: Some(&sac),
        };
        assert_eq!(classify_move(&config, &input), Classification::Brilliant);

        // Already winning regardless
        input.second_best = Some(800);
        assert_eq!(classify_move(&config, &input), Classification::Best);

        // No second line, no brilliancy
        input.second_best = None;
        assert_eq!(classify_move(&config, &input), Classification::Best);
    }

    #[test]
    fn test_unknown_best_move_falls_back_to_loss() {
        let config = ClassifierConfig::default();
        let mut input = middlegame(100, 100);
        input.is_best_move = None;
        input.second_best = Some(-500);
        assert_eq!(classify_move(&config, &input), Classification::Excellent);
    }

    #[test]
    fn test_mate_branches() {
        let config = ClassifierConfig::default();
        let mate = |n: i32| EngineScore::Mate(n).relative_cp();

        // Walking into mate in 2
        assert_eq!(classify_move(&config, &middlegame(50, mate(-2))), Classification::Blunder);
        assert_eq!(classify_move(&config, &middlegame(50, mate(-4))), Classification::Mistake);
        assert_eq!(classify_move(&config, &middlegame(50, mate(-9))), Classification::Inaccuracy);

        // Letting a forced mate slip
        assert_eq!(classify_move(&config, &middlegame(mate(3), 450)), Classification::Good);
        assert_eq!(classify_move(&config, &middlegame(mate(3), 200)), Classification::Inaccuracy);
        assert_eq!(classify_move(&config, &middlegame(mate(3), 0)), Classification::Mistake);

        // Escaping a mating attack
        assert_eq!(classify_move(&config, &middlegame(mate(-3), 20)), Classification::Best);
        assert_eq!(classify_move(&config, &middlegame(mate(-3), -300)), Classification::Good);

        // Keeping the mate
        assert_eq!(classify_move(&config, &middlegame(mate(4), mate(3))), Classification::Best);
        assert_eq!(classify_move(&config, &middlegame(mate(4), mate(6))), Classification::Excellent);
        assert_eq!(classify_move(&config, &middlegame(mate(4), mate(9))), Classification::Good);

        // Turning a mate around
        assert_eq!(classify_move(&config, &middlegame(mate(2), mate(-1))), Classification::Blunder);
        assert_eq!(classify_move(&config, &middlegame(mate(2), mate(-6))), Classification::Mistake);
    }

    #[test]
    fn test_leniency_in_decided_positions() {
        let leniency = Leniency::default();
        assert_eq!(
            apply_leniency(&leniency, Classification::Blunder, 1500, 650),
            Classification::Good
        );
        assert_eq!(
            apply_leniency(&leniency, Classification::Blunder, -900, -1200),
            Classification::Inaccuracy
        );
        assert_eq!(
            apply_leniency(&leniency, Classification::Inaccuracy, 900, 550),
            Classification::Good
        );
        assert_eq!(
            apply_leniency(&leniency, Classification::Mistake, 900, 550),
            Classification::Mistake
        );

        let config = ClassifierConfig::default();
        // Already lost
        assert_eq!(classify_move(&config, &middlegame(-700, -1500)), Classification::Inaccuracy);

        let strict = ClassifierConfig {
            leniency: None,
            ..ClassifierConfig::default()
        };
        assert_eq!(classify_move(&strict, &middlegame(-700, -1500)), Classification::Blunder);
    }

    #[test]
    fn test_label_tables() {
        assert_eq!(Classification::ALL.len(), 11);
        assert_eq!(Classification::Neutral.weight(), None);
        assert_eq!(Classification::Good.weight(), Some(0.65));
        assert_eq!(Classification::Blunder.to_string(), "blunder");
    }
}
