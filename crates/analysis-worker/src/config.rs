//! Worker configuration from environment variables

use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Search depth per position
    pub analysis_depth: u32,

    /// Games analyzed concurrently, one Stockfish process each
    pub num_workers: usize,

    /// Entries in the shared position evaluation cache
    pub eval_cache_capacity: usize,

    /// Use the static evaluator when Stockfish is unavailable
    pub heuristic_fallback: bool,

    /// Bincode opening book; classification runs without book moves if unset
    pub opening_book_path: Option<String>,

    /// Plies after which a move can no longer be a book move
    pub book_ply_threshold: usize,

    /// Most recent games held out for the improvement trend
    pub improvement_window: usize,

    /// Rating used to pick puzzles
    pub player_rating: u32,

    /// Puzzle ratings accepted around `player_rating`
    pub puzzle_rating_band: u32,

    /// JSON puzzle corpus; recommendations are placeholders if unset
    pub puzzle_file: Option<String>,

    pub recommendation_limit: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            analysis_depth: 18,
            num_workers: num_cpus::get(),
            eval_cache_capacity: 10_000,
            heuristic_fallback: true,
            opening_book_path: None,
            book_ply_threshold: 10,
            improvement_window: 5,
            player_rating: 1500,
            puzzle_rating_band: 200,
            puzzle_file: None,
            recommendation_limit: 5,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset. Values that are set but malformed are
    /// rejected.
    pub fn load() -> Result<Self, WorkerError> {
        let defaults = Self::default();

        let config = Self {
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            analysis_depth: parse_var("ANALYSIS_DEPTH", defaults.analysis_depth)?,
            num_workers: parse_var("NUM_WORKERS", defaults.num_workers)?.max(1),
            eval_cache_capacity: parse_var("EVAL_CACHE_CAPACITY", defaults.eval_cache_capacity)?,
            heuristic_fallback: parse_var("HEURISTIC_FALLBACK", defaults.heuristic_fallback)?,
            opening_book_path: env::var("OPENING_BOOK_PATH").ok(),
            book_ply_threshold: parse_var("BOOK_PLY_THRESHOLD", defaults.book_ply_threshold)?,
            improvement_window: parse_var("IMPROVEMENT_WINDOW", defaults.improvement_window)?,
            player_rating: parse_var("PLAYER_RATING", defaults.player_rating)?,
            puzzle_rating_band: parse_var("PUZZLE_RATING_BAND", defaults.puzzle_rating_band)?,
            puzzle_file: env::var("PUZZLE_FILE").ok(),
            recommendation_limit: parse_var("RECOMMENDATION_LIMIT", defaults.recommendation_limit)?,
        };

        info!(
            stockfish_path = %config.stockfish_path,
            depth = config.analysis_depth,
            workers = config.num_workers,
            heuristic_fallback = config.heuristic_fallback,
            "Worker config loaded"
        );
        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, WorkerError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, WorkerError> {
    raw.trim()
        .parse()
        .map_err(|_| WorkerError::Config(format!("{name} has invalid value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.analysis_depth, 18);
        assert_eq!(config.eval_cache_capacity, 10_000);
        assert!(config.heuristic_fallback);
        assert_eq!(config.book_ply_threshold, 10);
        assert_eq!(config.improvement_window, 5);
        assert_eq!(config.recommendation_limit, 5);
        assert!(config.num_workers >= 1);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u32>("ANALYSIS_DEPTH", " 22 ").unwrap(), 22);
        assert!(parse_value::<bool>("HEURISTIC_FALLBACK", "false").is_ok_and(|v| !v));
        assert!(matches!(
            parse_value::<u32>("ANALYSIS_DEPTH", "deep"),
            Err(WorkerError::Config(_))
        ));
    }
}
