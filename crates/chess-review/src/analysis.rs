//! Whole-game classification: turns a game's plies and the engine's view of
//! every position into a [`GameAnalysis`].

use std::sync::Arc;

use chess_core::game_data::{PlyRecord, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::accuracy::{accuracy, Accuracy};
use crate::board_delta::{self, Motif};
use crate::classification::{
    classify_move, evaluation_loss, Classification, ClassifierConfig, MoveInput,
};
use crate::eval::{is_mate_score, normalize, to_mover_frame, PositionEval};
use crate::opening_book::OpeningBook;

/// Where the evaluations behind an analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationSource {
    /// Every position was searched by the engine
    Engine,
    /// Lower-confidence fallback evaluator
    Heuristic,
    /// Some positions have no evaluation at all
    Partial,
}

impl EvaluationSource {
    /// `Engine` when every position has a score, `Partial` otherwise
    pub fn infer(plies: &[PlyRecord], evaluations: &[PositionEval]) -> Self {
        let complete = evaluations.len() > plies.len()
            && evaluations[..=plies.len()].iter().all(PositionEval::is_available);
        if complete {
            EvaluationSource::Engine
        } else {
            EvaluationSource::Partial
        }
    }
}

/// One classified ply. Evaluations are in the mover's frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedMove {
    pub index: usize,
    pub move_number: u32,
    pub side: Side,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
    pub eval_before: Option<i32>,
    pub eval_after: Option<i32>,
    /// `None` only for neutral moves
    pub evaluation_loss: Option<i32>,
    pub best_move: Option<String>,
    pub best_eval: Option<i32>,
    pub second_best_eval: Option<i32>,
    pub classification: Classification,
    pub motifs: Vec<Motif>,
}

impl AnalyzedMove {
    /// 1-based ply number
    pub fn ply(&self) -> usize {
        self.index + 1
    }

    pub fn has_motif(&self, motif: Motif) -> bool {
        self.motifs.contains(&motif)
    }
}

/// Per-side label tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub book: u32,
    pub forced: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub neutral: u32,
}

impl ClassificationCounts {
    pub fn from_labels<I: IntoIterator<Item = Classification>>(labels: I) -> Self {
        let mut counts = Self::default();
        for label in labels {
            counts.add(label);
        }
        counts
    }

    pub fn add(&mut self, label: Classification) {
        *self.slot(label) += 1;
    }

    pub fn get(&self, label: Classification) -> u32 {
        match label {
            Classification::Brilliant => self.brilliant,
            Classification::Great => self.great,
            Classification::Best => self.best,
            Classification::Excellent => self.excellent,
            Classification::Good => self.good,
            Classification::Book => self.book,
            Classification::Forced => self.forced,
            Classification::Inaccuracy => self.inaccuracy,
            Classification::Mistake => self.mistake,
            Classification::Blunder => self.blunder,
            Classification::Neutral => self.neutral,
        }
    }

    /// Moves that count towards accuracy
    pub fn classified(&self) -> u32 {
        Classification::ALL
            .iter()
            .filter(|c| c.is_classified())
            .map(|c| self.get(*c))
            .sum()
    }

    fn slot(&mut self, label: Classification) -> &mut u32 {
        match label {
            Classification::Brilliant => &mut self.brilliant,
            Classification::Great => &mut self.great,
            Classification::Best => &mut self.best,
            Classification::Excellent => &mut self.excellent,
            Classification::Good => &mut self.good,
            Classification::Book => &mut self.book,
            Classification::Forced => &mut self.forced,
            Classification::Inaccuracy => &mut self.inaccuracy,
            Classification::Mistake => &mut self.mistake,
            Classification::Blunder => &mut self.blunder,
            Classification::Neutral => &mut self.neutral,
        }
    }
}

/// The result of analysing one game. Re-analysis produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub game_id: String,
    pub moves: Vec<AnalyzedMove>,
    pub accuracy_white: Accuracy,
    pub accuracy_black: Accuracy,
    pub counts_white: ClassificationCounts,
    pub counts_black: ClassificationCounts,
    pub source: EvaluationSource,
    pub depth: Option<u32>,
}

impl GameAnalysis {
    pub fn moves_by(&self, side: Side) -> impl Iterator<Item = &AnalyzedMove> {
        self.moves.iter().filter(move |m| m.side == side)
    }

    pub fn accuracy(&self, side: Side) -> &Accuracy {
        match side {
            Side::White => &self.accuracy_white,
            Side::Black => &self.accuracy_black,
        }
    }

    pub fn counts(&self, side: Side) -> &ClassificationCounts {
        match side {
            Side::White => &self.counts_white,
            Side::Black => &self.counts_black,
        }
    }
}

/// Owns the classification configuration and optional opening book.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
    book: Option<Arc<OpeningBook>>,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config, book: None }
    }

    pub fn with_book(mut self, book: Arc<OpeningBook>) -> Self {
        self.book = Some(book);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify every ply in order.
    ///
    /// `evaluations[i]` describes the position before ply `i`; the last entry
    /// describes the final position. Missing entries count as unavailable.
    pub fn classify_game(
        &self,
        game_id: &str,
        plies: &[PlyRecord],
        evaluations: &[PositionEval],
        source: EvaluationSource,
    ) -> GameAnalysis {
        let unavailable = PositionEval::unavailable();
        let mut moves = Vec::with_capacity(plies.len());

        for ply in plies {
            let before = evaluations.get(ply.index).unwrap_or(&unavailable);
            let after = evaluations.get(ply.index + 1).unwrap_or(&unavailable);
            moves.push(self.classify_ply(game_id, ply, before, after));
        }

        let depth = evaluations.iter().filter_map(|e| e.depth).max();
        let side_labels =
            |side: Side| moves.iter().filter(move |m: &&AnalyzedMove| m.side == side).map(|m| m.classification);

        let analysis = GameAnalysis {
            game_id: game_id.to_string(),
            accuracy_white: accuracy(side_labels(Side::White)),
            accuracy_black: accuracy(side_labels(Side::Black)),
            counts_white: ClassificationCounts::from_labels(side_labels(Side::White)),
            counts_black: ClassificationCounts::from_labels(side_labels(Side::Black)),
            moves,
            source,
            depth,
        };

        debug!(
            game_id,
            plies = plies.len(),
            accuracy_white = analysis.accuracy_white.value,
            accuracy_black = analysis.accuracy_black.value,
            "Classified game"
        );
        analysis
    }

    fn classify_ply(
        &self,
        game_id: &str,
        ply: &PlyRecord,
        before: &PositionEval,
        after: &PositionEval,
    ) -> AnalyzedMove {
        let mover = ply.side;
        let eval_before =
            normalize(before.score, mover).map(|cp| to_mover_frame(cp, mover));
        let eval_after = normalize(after.score, mover.opponent()).map(|cp| to_mover_frame(cp, mover));
        let second_best =
            normalize(before.second_best, mover).map(|cp| to_mover_frame(cp, mover));
        let is_best_move = before.best_move.as_ref().map(|best| *best == ply.uci);

        let delta = match board_delta::analyze(&ply.fen_before, &ply.fen_after) {
            Ok(delta) => Some(delta),
            Err(e) => {
                warn!(game_id, ply = ply.ply(), error = %e, "Board delta unavailable");
                None
            }
        };
        let in_book = self
            .book
            .as_ref()
            .is_some_and(|book| book.contains(&ply.fen_before, &ply.san));

        let input = MoveInput {
            ply: ply.ply(),
            eval_before,
            eval_after,
            second_best,
            is_best_move,
            in_book,
            delta: delta.as_ref(),
        };
        let classification = classify_move(&self.config, &input);

        let evaluation_loss = match (classification, eval_before, eval_after) {
            (Classification::Neutral, _, _) => None,
            _ if is_best_move == Some(true) => Some(0),
            (_, Some(prev), Some(curr)) => Some(evaluation_loss(prev, curr)),
            _ => None,
        };

        let mut motifs = delta.map(|d| d.motifs).unwrap_or_default();
        if eval_after.is_some_and(|cp| cp < 0 && is_mate_score(cp)) {
            motifs.push(Motif::AllowsMate);
        }

        AnalyzedMove {
            index: ply.index,
            move_number: ply.move_number(),
            side: mover,
            san: ply.san.clone(),
            uci: ply.uci.clone(),
            fen_before: ply.fen_before.clone(),
            fen_after: ply.fen_after.clone(),
            eval_before,
            eval_after,
            evaluation_loss,
            best_move: before.best_move.clone(),
            best_eval: eval_before,
            second_best_eval: second_best,
            classification,
            motifs,
        }
    }
}

/// Classify a game with the default configuration and no opening book.
pub fn classify(plies: &[PlyRecord], evaluations: &[PositionEval]) -> GameAnalysis {
    let source = EvaluationSource::infer(plies, evaluations);
    Classifier::default().classify_game("", plies, evaluations, source)
}
