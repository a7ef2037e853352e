//! Stockfish engine wrapper using UCI protocol (async I/O)

use chess_review::eval::{EngineScore, PositionEval};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::error::WorkerError;

/// Principal variations requested per search: best and second-best line
const MULTI_PV: u32 = 2;

/// Latest score seen for one multipv slot
#[derive(Debug, Clone, Default)]
struct PvSlot {
    score: Option<EngineScore>,
    depth: Option<u32>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine
            .send(&format!("setoption name MultiPV value {MULTI_PV}"))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Next output line, trimmed. EOF means the process died.
    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        let trimmed_len = line.trim_end().len();
        line.truncate(trimmed_len);
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            debug!(line = line.as_str(), "SF >");
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` to `depth`, returning the best move, its score and the
    /// second-best line's score, all relative to the side to move.
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<PositionEval, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut slots = [PvSlot::default(), PvSlot::default()];
        let mut line = String::new();

        let best_move = loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                let idx = parse_multipv_index(trimmed).unwrap_or(1).saturating_sub(1) as usize;
                if let Some(slot) = slots.get_mut(idx) {
                    if let Some(score) = parse_score(trimmed) {
                        slot.score = Some(score);
                        slot.depth = parse_depth(trimmed);
                    }
                }
            } else if trimmed.starts_with("bestmove") {
                break parse_bestmove(trimmed);
            }
        };

        let [first, second] = slots;
        Ok(PositionEval {
            score: first.score,
            best_move,
            second_best: second.score,
            depth: first.depth,
        })
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

/// Value following `key` in a whitespace-separated info line
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next();
        }
    }
    None
}

/// `score cp N` or `score mate N`. Lines carrying a bound marker
/// (lowerbound/upperbound) are not exact scores and yield `None`.
fn parse_score(line: &str) -> Option<EngineScore> {
    let mut parts = line.split_whitespace().skip_while(|p| *p != "score").skip(1);
    let score = match (parts.next()?, parts.next()?.parse().ok()?) {
        ("cp", v) => EngineScore::Centipawns(v),
        ("mate", v) => EngineScore::Mate(v),
        _ => return None,
    };
    match parts.next() {
        Some("lowerbound" | "upperbound") => None,
        _ => Some(score),
    }
}

fn parse_depth(line: &str) -> Option<u32> {
    field(line, "depth")?.parse().ok()
}

fn parse_multipv_index(line: &str) -> Option<u32> {
    field(line, "multipv")?.parse().ok()
}

/// `bestmove e2e4 ponder e7e5`; `(none)` when the side to move has no moves
fn parse_bestmove(line: &str) -> Option<String> {
    field(line, "bestmove")
        .filter(|mv| *mv != "(none)")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_score(line), Some(EngineScore::Centipawns(35)));
        assert_eq!(parse_depth(line), Some(20));
        assert_eq!(parse_multipv_index(line), Some(1));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_score(line), Some(EngineScore::Mate(-3)));
        assert_eq!(parse_multipv_index(line), None);
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_bestmove("bestmove e2e4 ponder e7e5"),
            Some("e2e4".to_string())
        );
        assert_eq!(parse_bestmove("bestmove (none)"), None);
    }

    #[test]
    fn test_second_pv_line() {
        let line = "info depth 18 seldepth 22 multipv 2 score cp -120 nodes 5 pv d2d4";
        assert_eq!(parse_multipv_index(line), Some(2));
        assert_eq!(parse_score(line), Some(EngineScore::Centipawns(-120)));
    }

    #[test]
    fn test_bound_scores_are_skipped() {
        let lower = "info depth 17 multipv 1 score cp 48 lowerbound nodes 9 pv e2e4";
        let upper = "info depth 17 multipv 1 score mate 3 upperbound nodes 9 pv e2e4";
        assert_eq!(parse_score(lower), None);
        assert_eq!(parse_score(upper), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let result = StockfishEngine::new("/nonexistent/stockfish-binary").await;
        assert!(matches!(result, Err(WorkerError::Stockfish(_))));
    }
}
