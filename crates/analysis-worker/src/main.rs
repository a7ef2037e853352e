//! Game review worker
//!
//! Analyzes a player's PGN games with a pool of local Stockfish processes,
//! then prints one JSON report (analyses, skill profile, weaknesses and
//! puzzle recommendations) to stdout. Logs go to stderr.

use std::sync::Arc;

use analysis_worker::analyzer::Analyzer;
use analysis_worker::cli::CliArgs;
use analysis_worker::config::WorkerConfig;
use analysis_worker::engine_pool::EnginePool;
use analysis_worker::input;
use analysis_worker::report::build_report;
use chess_review::analysis::Classifier;
use chess_review::classification::ClassifierConfig;
use chess_review::opening_book::OpeningBook;
use chess_review::puzzles::InMemoryCorpus;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = WorkerConfig::load()?;

    let games = input::load_games(&args.patterns)?;
    if games.is_empty() {
        anyhow::bail!("No games found in {:?}", args.patterns);
    }

    let mut classifier = Classifier::new(ClassifierConfig {
        book_ply_threshold: config.book_ply_threshold,
        ..ClassifierConfig::default()
    });
    match &config.opening_book_path {
        Some(path) => {
            let book = OpeningBook::load(path)?;
            classifier = classifier.with_book(Arc::new(book));
        }
        None => warn!("OPENING_BOOK_PATH not set, no moves will be classified as book"),
    }

    let corpus = match &config.puzzle_file {
        Some(path) => InMemoryCorpus::from_json(&std::fs::read_to_string(path)?)?,
        None => InMemoryCorpus::default(),
    };
    info!(puzzles = corpus.len(), "Puzzle corpus ready");

    let pool = Arc::new(EnginePool::start(&config).await?);
    info!(engines = pool.engine_count(), games = games.len(), "Starting analysis");

    let analyzer = Analyzer::new(pool.clone(), classifier, config.num_workers);
    let analyzed = analyzer.analyze_all(games).await;
    pool.shutdown().await;
    let analyzed = analyzed?;

    let report = build_report(&args.player, &analyzed, &config, &corpus);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
