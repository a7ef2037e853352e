//! Weakness extraction and the weakness -> puzzle theme lookup.
//!
//! Theme selection is a static table lookup: the weakest phase contributes
//! its theme set and every motif seen on the player's mistakes and blunders
//! contributes one theme. The weakest phase's themes always lead; motif
//! themes follow by frequency. Output order depends only on the input.

use std::collections::BTreeMap;

use chess_core::game_data::Side;
use serde::{Deserialize, Serialize};

use crate::accuracy::{accuracy, Accuracy};
use crate::analysis::GameAnalysis;
use crate::board_delta::Motif;
use crate::classification::Classification;
use crate::skill::{Phase, PhaseBoundaries, PlayerGame};

/// One puzzle-theme query, most important first in a matcher's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeQuery {
    pub theme: String,
    pub rationale: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWeakness {
    pub phase: Phase,
    pub accuracy: Accuracy,
    /// Inaccuracies, mistakes and blunders in this phase
    pub flawed_moves: usize,
    pub blunders: usize,
    /// Share of all the player's blunders that fell in this phase, 0-100
    pub blunder_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifCount {
    pub motif: Motif,
    pub count: usize,
}

/// What went wrong across one or more of a player's games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessPattern {
    pub player_id: String,
    pub games_analyzed: usize,
    pub weakest_phase: Option<Phase>,
    pub phases: Vec<PhaseWeakness>,
    /// Full-move number with the most blunders
    pub most_blunder_prone_move: Option<u32>,
    pub blunders_by_move_number: BTreeMap<u32, usize>,
    /// Motifs on mistakes and blunders, in order of first appearance
    pub error_motifs: Vec<MotifCount>,
    pub classified_moves: usize,
    pub blunder_rate: f64,
    pub mistake_rate: f64,
    pub inaccuracy_rate: f64,
    pub improvement_priority: String,
    /// Ranked puzzle themes
    pub themes: Vec<String>,
}

impl WeaknessPattern {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseWeakness> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn total_flawed(&self) -> usize {
        self.phases.iter().map(|p| p.flawed_moves).sum()
    }
}

/// Theme lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeTable {
    pub opening: Vec<String>,
    pub middlegame: Vec<String>,
    pub endgame: Vec<String>,
    /// Motif -> (theme, phrase used in the rationale)
    pub motifs: Vec<(Motif, String, String)>,
    /// Returned when there is nothing to work on
    pub defaults: Vec<String>,
}

impl Default for ThemeTable {
    fn default() -> Self {
        let themes = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let motif = |m: Motif, theme: &str, phrase: &str| (m, theme.to_string(), phrase.to_string());
        Self {
            opening: themes(&["opening", "development", "center control"]),
            middlegame: themes(&["middlegame", "tactics", "positional play"]),
            endgame: themes(&["endgame", "king activity", "passed pawns"]),
            motifs: vec![
                motif(Motif::HangingPiece, "hanging pieces", "leaving a piece hanging"),
                motif(Motif::Pin, "pins", "walking into a pin"),
                motif(Motif::Fork, "forks", "a forking move"),
                motif(Motif::AllowsMate, "mating nets", "allowing a forced mate"),
                motif(Motif::Check, "defense", "a careless check"),
                motif(Motif::Capture, "exchanges", "a bad exchange"),
                motif(Motif::Promotion, "promotion", "a promotion"),
            ],
            defaults: themes(&["tactics", "endgame"]),
        }
    }
}

impl ThemeTable {
    pub fn phase_themes(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Opening => &self.opening,
            Phase::Middlegame => &self.middlegame,
            Phase::Endgame => &self.endgame,
        }
    }

    pub fn motif_theme(&self, motif: Motif) -> Option<(&str, &str)> {
        self.motifs
            .iter()
            .find(|(m, _, _)| *m == motif)
            .map(|(_, theme, phrase)| (theme.as_str(), phrase.as_str()))
    }
}

/// What to match against.
#[derive(Debug, Clone, Copy)]
pub enum WeaknessSource<'a> {
    Game {
        analysis: &'a GameAnalysis,
        side: Side,
    },
    Pattern(&'a WeaknessPattern),
}

#[derive(Debug, Clone, Default)]
pub struct WeaknessMatcher {
    table: ThemeTable,
    phases: PhaseBoundaries,
}

impl WeaknessMatcher {
    pub fn new(table: ThemeTable, phases: PhaseBoundaries) -> Self {
        Self { table, phases }
    }

    pub fn table(&self) -> &ThemeTable {
        &self.table
    }

    pub fn match_source(&self, source: &WeaknessSource<'_>) -> Vec<ThemeQuery> {
        match source {
            WeaknessSource::Game { analysis, side } => {
                let game = PlayerGame::new(analysis, *side);
                let pattern = self.extract_pattern(&analysis.game_id, &[game]);
                self.match_pattern(&pattern)
            }
            WeaknessSource::Pattern(pattern) => self.match_pattern(pattern),
        }
    }

    /// Ranked theme queries for an extracted pattern.
    pub fn match_pattern(&self, pattern: &WeaknessPattern) -> Vec<ThemeQuery> {
        if pattern.total_flawed() == 0 {
            return self
                .table
                .defaults
                .iter()
                .map(|theme| ThemeQuery {
                    theme: theme.clone(),
                    rationale: "No recurring weakness found, general practice".to_string(),
                    frequency: 0,
                })
                .collect();
        }

        let mut phase_queries: Vec<ThemeQuery> = Vec::new();
        let mut motif_queries: Vec<ThemeQuery> = Vec::new();

        if let Some(weak) = pattern.weakest_phase.and_then(|p| pattern.phase(p)) {
            for theme in self.table.phase_themes(weak.phase) {
                phase_queries.push(ThemeQuery {
                    theme: theme.clone(),
                    rationale: format!(
                        "Weakest phase is the {} ({:.0}% accuracy, {} inaccuracies or worse)",
                        weak.phase, weak.accuracy.value, weak.flawed_moves
                    ),
                    frequency: weak.flawed_moves,
                });
            }
        }

        for MotifCount { motif, count } in &pattern.error_motifs {
            if let Some((theme, phrase)) = self.table.motif_theme(*motif) {
                motif_queries.push(ThemeQuery {
                    theme: theme.to_string(),
                    rationale: format!("{count} mistakes or blunders involved {phrase}"),
                    frequency: *count,
                });
            }
        }

        rank(phase_queries, motif_queries)
    }

    /// Summarise a player's weaknesses over their games.
    pub fn extract_pattern(&self, player_id: &str, games: &[PlayerGame<'_>]) -> WeaknessPattern {
        let moves: Vec<_> = games
            .iter()
            .flat_map(|g| g.moves())
            .filter(|m| m.classification.is_classified())
            .collect();

        let count = |c: Classification| moves.iter().filter(|m| m.classification == c).count();
        let blunders = count(Classification::Blunder);
        let rate = |n: usize| {
            if moves.is_empty() {
                0.0
            } else {
                n as f64 / moves.len() as f64 * 100.0
            }
        };

        let phases: Vec<PhaseWeakness> = Phase::ALL
            .iter()
            .map(|&phase| {
                let in_phase: Vec<_> = moves
                    .iter()
                    .filter(|m| self.phases.phase_of(m.ply()) == phase)
                    .collect();
                let phase_blunders = in_phase
                    .iter()
                    .filter(|m| m.classification == Classification::Blunder)
                    .count();
                PhaseWeakness {
                    phase,
                    accuracy: accuracy(in_phase.iter().map(|m| m.classification)),
                    flawed_moves: in_phase.iter().filter(|m| m.classification.is_flawed()).count(),
                    blunders: phase_blunders,
                    blunder_percentage: if blunders == 0 {
                        0.0
                    } else {
                        phase_blunders as f64 / blunders as f64 * 100.0
                    },
                }
            })
            .collect();

        let weakest_phase = phases
            .iter()
            .filter(|p| !p.accuracy.insufficient_data)
            .fold(None, |worst: Option<&PhaseWeakness>, p| match worst {
                Some(w) if w.accuracy.value <= p.accuracy.value => worst,
                _ => Some(p),
            })
            .map(|p| p.phase);

        let mut blunders_by_move_number = BTreeMap::new();
        for m in moves.iter().filter(|m| m.classification == Classification::Blunder) {
            *blunders_by_move_number.entry(m.move_number).or_insert(0) += 1;
        }
        let most_blunder_prone_move = blunders_by_move_number
            .iter()
            .fold(None, |best: Option<(u32, usize)>, (&n, &c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((n, c)),
            })
            .map(|(n, _)| n);

        let mut error_motifs: Vec<MotifCount> = Vec::new();
        for m in moves.iter().filter(|m| m.classification.is_error()) {
            for motif in &m.motifs {
                match error_motifs.iter_mut().find(|mc| mc.motif == *motif) {
                    Some(mc) => mc.count += 1,
                    None => error_motifs.push(MotifCount {
                        motif: *motif,
                        count: 1,
                    }),
                }
            }
        }

        let blunder_rate = rate(blunders);
        let mistake_rate = rate(count(Classification::Mistake));
        let improvement_priority = improvement_priority(
            blunder_rate,
            mistake_rate,
            weakest_phase,
            most_blunder_prone_move,
        );

        let mut pattern = WeaknessPattern {
            player_id: player_id.to_string(),
            games_analyzed: games.len(),
            weakest_phase,
            phases,
            most_blunder_prone_move,
            blunders_by_move_number,
            error_motifs,
            classified_moves: moves.len(),
            blunder_rate,
            mistake_rate,
            inaccuracy_rate: rate(count(Classification::Inaccuracy)),
            improvement_priority,
            themes: Vec::new(),
        };
        pattern.themes = self
            .match_pattern(&pattern)
            .into_iter()
            .map(|q| q.theme)
            .collect();
        pattern
    }
}

/// Merge duplicate themes (summing frequency, keeping the first rationale).
/// Weakest-phase themes come first, then motif themes; each block is ordered
/// by frequency with ties kept in insertion order.
fn rank(phase_queries: Vec<ThemeQuery>, motif_queries: Vec<ThemeQuery>) -> Vec<ThemeQuery> {
    let mut leading = merge(phase_queries);
    let mut rest = Vec::new();
    for query in motif_queries {
        match leading.iter_mut().find(|q| q.theme == query.theme) {
            Some(existing) => existing.frequency += query.frequency,
            None => rest.push(query),
        }
    }
    let mut trailing = merge(rest);
    leading.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    trailing.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    leading.extend(trailing);
    leading
}

fn merge(queries: Vec<ThemeQuery>) -> Vec<ThemeQuery> {
    let mut merged: Vec<ThemeQuery> = Vec::with_capacity(queries.len());
    for query in queries {
        match merged.iter_mut().find(|q| q.theme == query.theme) {
            Some(existing) => existing.frequency += query.frequency,
            None => merged.push(query),
        }
    }
    merged
}

/// One-line coaching priority.
pub fn improvement_priority(
    blunder_rate: f64,
    mistake_rate: f64,
    weakest_phase: Option<Phase>,
    most_blunder_prone_move: Option<u32>,
) -> String {
    let phase = weakest_phase.unwrap_or(Phase::Middlegame);
    if blunder_rate > 5.0 {
        format!("Critical: Reduce blunders in {phase} (currently {blunder_rate:.1}% blunder rate)")
    } else if mistake_rate > 10.0 {
        format!("High: Focus on {phase} decision-making")
    } else if most_blunder_prone_move.is_some_and(|n| n > 30) {
        "Medium: Improve endgame technique".to_string()
    } else {
        "Low: Refine positional understanding".to_string()
    }
}

/// Match with the default theme table and phase boundaries.
pub fn match_weaknesses(source: &WeaknessSource<'_>) -> Vec<ThemeQuery> {
    WeaknessMatcher::default().match_source(source)
}
