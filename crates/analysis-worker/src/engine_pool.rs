//! Pool of Stockfish processes with a shared evaluation cache and a static
//! fallback when the engine is missing or dies mid-game.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chess_review::analysis::EvaluationSource;
use chess_review::eval::PositionEval;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::EvalCache;
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::heuristic;
use crate::stockfish::StockfishEngine;

pub struct EnginePool {
    engines: Vec<Arc<Mutex<StockfishEngine>>>,
    next: AtomicUsize,
    cache: EvalCache,
    depth: u32,
    heuristic_fallback: bool,
}

impl EnginePool {
    /// Spawn one Stockfish process per worker. If the binary cannot be
    /// started and the heuristic fallback is enabled, the pool runs with
    /// whatever engines did start (possibly none).
    pub async fn start(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let mut engines = Vec::with_capacity(config.num_workers);
        for engine_id in 0..config.num_workers {
            match StockfishEngine::new(&config.stockfish_path).await {
                Ok(engine) => {
                    info!(engine_id, "Stockfish engine ready");
                    engines.push(Arc::new(Mutex::new(engine)));
                }
                Err(e) if config.heuristic_fallback => {
                    warn!(engine_id, error = %e, "Stockfish unavailable, continuing with heuristic fallback");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self::with_engines(engines, config))
    }

    /// A pool with no engine processes at all
    pub fn without_engines(config: &WorkerConfig) -> Self {
        Self::with_engines(Vec::new(), config)
    }

    fn with_engines(engines: Vec<Arc<Mutex<StockfishEngine>>>, config: &WorkerConfig) -> Self {
        Self {
            engines,
            next: AtomicUsize::new(0),
            cache: EvalCache::new(config.eval_cache_capacity),
            depth: config.analysis_depth,
            heuristic_fallback: config.heuristic_fallback,
        }
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    /// Evaluate every position of one game, in order. One engine is held
    /// for the whole game. Never fails: positions that cannot be evaluated
    /// come back unavailable and the returned source says so.
    pub async fn evaluate_positions(&self, fens: &[&str]) -> (Vec<PositionEval>, EvaluationSource) {
        let mut engine = match self.checkout() {
            Some(engine) => Some(engine.lock_owned().await),
            None => None,
        };

        let mut evals = Vec::with_capacity(fens.len());
        let mut used_heuristic = false;
        let mut missing = false;

        for fen in fens {
            if let Some(hit) = self.cache.get(fen, self.depth) {
                evals.push(hit);
                continue;
            }

            let searched = match engine.as_mut() {
                Some(sf) => Some(sf.evaluate(fen, self.depth).await),
                None => None,
            };
            match searched {
                Some(Ok(eval)) => {
                    self.cache.insert(fen, self.depth, eval.clone());
                    evals.push(eval);
                    continue;
                }
                Some(Err(e)) => {
                    warn!(fen, error = %e, "Engine failed, evaluating rest of game without it");
                    engine = None;
                }
                None => {}
            }

            if !self.heuristic_fallback {
                missing = true;
                evals.push(PositionEval::unavailable());
                continue;
            }
            match heuristic::evaluate(fen) {
                Ok(eval) => {
                    used_heuristic = true;
                    evals.push(eval);
                }
                Err(e) => {
                    warn!(fen, error = %e, "Position could not be evaluated");
                    missing = true;
                    evals.push(PositionEval::unavailable());
                }
            }
        }

        let source = if missing {
            EvaluationSource::Partial
        } else if used_heuristic {
            EvaluationSource::Heuristic
        } else {
            EvaluationSource::Engine
        };
        (evals, source)
    }

    fn checkout(&self) -> Option<Arc<Mutex<StockfishEngine>>> {
        if self.engines.is_empty() {
            return None;
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.engines.len();
        Some(self.engines[i].clone())
    }

    /// Quit every engine process
    pub async fn shutdown(&self) {
        info!(engines = self.engines.len(), "Shutting down Stockfish engines");
        for engine in &self.engines {
            engine.lock().await.quit().await;
        }
    }
}
