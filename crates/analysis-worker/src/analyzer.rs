//! Per-game analysis: evaluate every position, then classify.
//!
//! Games run concurrently, bounded by a semaphore sized to the engine pool.
//! A game's analysis only becomes visible once its task has finished.

use std::sync::Arc;

use chess_review::analysis::{Classifier, GameAnalysis};
use tokio::sync::Semaphore;
use tracing::info;

use crate::engine_pool::EnginePool;
use crate::error::WorkerError;
use crate::input::GameInput;

#[derive(Clone)]
pub struct Analyzer {
    pool: Arc<EnginePool>,
    classifier: Arc<Classifier>,
    semaphore: Arc<Semaphore>,
}

impl Analyzer {
    pub fn new(pool: Arc<EnginePool>, classifier: Classifier, max_concurrent: usize) -> Self {
        Self {
            pool,
            classifier: Arc::new(classifier),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Analyze one game
    pub async fn analyze_game(&self, game: &GameInput) -> GameAnalysis {
        info!(game_id = %game.game_id, plies = game.record.plies.len(), "Starting analysis");

        let positions = game.record.positions();
        let (evaluations, source) = self.pool.evaluate_positions(&positions).await;

        let analysis =
            self.classifier
                .classify_game(&game.game_id, &game.record.plies, &evaluations, source);

        info!(
            game_id = %game.game_id,
            source = ?analysis.source,
            accuracy_white = analysis.accuracy_white.value,
            accuracy_black = analysis.accuracy_black.value,
            "Analysis complete"
        );
        analysis
    }

    /// Analyze every game, at most `max_concurrent` at a time. Results come
    /// back in input order.
    pub async fn analyze_all(
        &self,
        games: Vec<GameInput>,
    ) -> Result<Vec<(GameInput, GameAnalysis)>, WorkerError> {
        let mut handles = Vec::with_capacity(games.len());

        for game in games {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::Config(format!("Analysis semaphore closed: {e}")))?;
            let analyzer = self.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit; // Hold until done
                let analysis = analyzer.analyze_game(&game).await;
                (game, analysis)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use crate::input::parse_games;
    use chess_review::analysis::EvaluationSource;
    use chess_review::classification::Classification;

    fn analyzer(heuristic_fallback: bool) -> Analyzer {
        let config = WorkerConfig {
            heuristic_fallback,
            ..WorkerConfig::default()
        };
        let pool = Arc::new(EnginePool::without_engines(&config));
        Analyzer::new(pool, Classifier::default(), 2)
    }

    fn games(pgn: &str) -> Vec<GameInput> {
        parse_games("test", pgn)
            .into_iter()
            .map(|g| g.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let pgn = "[White \"a\"]\n\n1. e4 e5 *\n\n[White \"b\"]\n\n1. d4 d5 2. c4 *\n\n[White \"c\"]\n\n1. Nf3 *\n";
        let results = analyzer(true).analyze_all(games(pgn)).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|(g, _)| g.game_id.as_str()).collect();
        assert_eq!(ids, vec!["test#1", "test#2", "test#3"]);
        assert_eq!(results[1].1.moves.len(), 3);
        assert!(results
            .iter()
            .all(|(_, a)| a.source == EvaluationSource::Heuristic));
    }

    #[tokio::test]
    async fn test_heuristic_scores_every_move() {
        let pgn = "1. e4 e5 2. Qg4 d5 3. Qxg7 *\n";
        let results = analyzer(true).analyze_all(games(pgn)).await.unwrap();
        let analysis = &results[0].1;
        assert_eq!(analysis.moves.len(), 5);
        assert!(analysis
            .moves
            .iter()
            .all(|m| m.classification != Classification::Neutral));
    }

    #[tokio::test]
    async fn test_without_evaluations_every_move_is_neutral() {
        let results = analyzer(false)
            .analyze_all(games("1. e4 e5 2. Nf3 *\n"))
            .await
            .unwrap();
        let analysis = &results[0].1;
        assert_eq!(analysis.source, EvaluationSource::Partial);
        assert!(analysis
            .moves
            .iter()
            .all(|m| m.classification == Classification::Neutral));
        assert!(analysis.accuracy_white.insufficient_data);
    }
}
