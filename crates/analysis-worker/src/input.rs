//! Loading games from PGN files.

use std::path::Path;

use chess_core::game_data::GameRecord;
use chess_core::pgn::{parse_pgn, split_games};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::WorkerError;

/// A parsed game ready for analysis.
#[derive(Debug, Clone)]
pub struct GameInput {
    pub game_id: String,
    pub record: GameRecord,
    pub played_at: Option<DateTime<Utc>>,
}

impl GameInput {
    pub fn new(game_id: impl Into<String>, record: GameRecord) -> Self {
        let played_at = record.metadata.date.as_deref().and_then(parse_pgn_date);
        Self {
            game_id: game_id.into(),
            record,
            played_at,
        }
    }
}

/// PGN `Date` tag ("2024.03.17") as midnight UTC. Partial dates with `??`
/// components are treated as unknown.
pub fn parse_pgn_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(date.trim(), "%Y.%m.%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Parse every game in a PGN text. Games are identified by their `Link`
/// tag when present, else by `<source_name>#<n>`.
pub fn parse_games(source_name: &str, text: &str) -> Vec<Result<GameInput, WorkerError>> {
    split_games(text)
        .iter()
        .enumerate()
        .map(|(n, chunk)| {
            let record = parse_pgn(chunk).map_err(|error| WorkerError::Pgn {
                source_name: format!("{source_name}#{}", n + 1),
                error,
            })?;
            let game_id = record
                .metadata
                .link
                .clone()
                .unwrap_or_else(|| format!("{source_name}#{}", n + 1));
            Ok(GameInput::new(game_id, record))
        })
        .collect()
}

/// Expand glob patterns and load every game they match. Unreadable files
/// and unparseable games are logged and skipped.
pub fn load_games(patterns: &[String]) -> Result<Vec<GameInput>, WorkerError> {
    let mut games = Vec::new();

    for pattern in patterns {
        let paths = glob::glob(pattern)
            .map_err(|e| WorkerError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    continue;
                }
            };
            games.extend(load_file(&path));
        }
    }

    info!(games = games.len(), "Loaded games");
    Ok(games)
}

fn load_file(path: &Path) -> Vec<GameInput> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read PGN file");
            return Vec::new();
        }
    };
    let source_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_games(&source_name, &text)
        .into_iter()
        .filter_map(|game| match game {
            Ok(game) => Some(game),
            Err(e) => {
                warn!(error = %e, "Skipping game");
                None
            }
        })
        .collect()
}
