pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine_pool;
pub mod error;
pub mod heuristic;
pub mod input;
pub mod report;
pub mod stockfish;
