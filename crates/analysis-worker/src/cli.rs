//! Command-line arguments: `--player <name> <pgn glob>...`

use crate::error::WorkerError;

pub const USAGE: &str = "usage: analysis-worker --player <name> <pgn glob>...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub player: String,
    pub patterns: Vec<String>,
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Result<Self, WorkerError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut player = None;
        let mut patterns = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            if arg == "--player" {
                player = args.next();
                if player.is_none() {
                    return Err(WorkerError::Config(format!("--player needs a value\n{USAGE}")));
                }
            } else {
                patterns.push(arg);
            }
        }

        let player = player.ok_or_else(|| WorkerError::Config(format!("missing --player\n{USAGE}")))?;
        if patterns.is_empty() {
            return Err(WorkerError::Config(format!("no PGN files given\n{USAGE}")));
        }
        Ok(Self { player, patterns })
    }
}
