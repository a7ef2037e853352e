//! Game review: move classification, accuracy, skill profiles and the
//! weakness-to-puzzle matcher.
//!
//! Everything here is synchronous and engine-agnostic. Callers supply the
//! plies of a game and one [`PositionEval`] per position; the engine plumbing
//! lives in the `analysis-worker` crate.

pub mod accuracy;
pub mod analysis;
pub mod board_delta;
pub mod board_utils;
pub mod classification;
pub mod error;
pub mod eval;
pub mod explain;
pub mod insights;
pub mod opening_book;
pub mod puzzles;
pub mod skill;
pub mod weakness;

pub use accuracy::{accuracy, Accuracy};
pub use analysis::{
    classify, AnalyzedMove, ClassificationCounts, Classifier, EvaluationSource, GameAnalysis,
};
pub use board_delta::{BoardDelta, Motif};
pub use classification::{classify_move, Classification, ClassifierConfig, MoveInput};
pub use error::{Result, ReviewError};
pub use eval::{EngineScore, PositionEval};
pub use explain::{explain_game, explain_move, MoveExplanation};
pub use insights::{build_insights, InsightGame, PlayerInsights};
pub use opening_book::OpeningBook;
pub use puzzles::{recommend_puzzles, InMemoryCorpus, Puzzle, PuzzleCorpus, Recommendation};
pub use skill::{build_skill_profile, Phase, PlayerGame, Skill, SkillProfile, SkillProfileBuilder};
pub use weakness::{match_weaknesses, ThemeQuery, WeaknessMatcher, WeaknessPattern, WeaknessSource};
