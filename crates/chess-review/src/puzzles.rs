//! Puzzle recommendations for ranked weakness themes.
//!
//! The corpus itself lives outside this crate; anything that can answer a
//! theme + rating-band query implements [`PuzzleCorpus`].

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::weakness::ThemeQuery;

const TRAINING_BASE_URL: &str = "https://lichess.org/training";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    /// Solution line in UCI
    pub solution: Vec<String>,
    pub rating: u32,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleQuery {
    pub theme: String,
    pub min_rating: u32,
    pub max_rating: u32,
}

impl PuzzleQuery {
    /// Query for `theme` within `band` rating points of `rating`
    pub fn around(theme: &str, rating: u32, band: u32) -> Self {
        Self {
            theme: theme.to_string(),
            min_rating: rating.saturating_sub(band),
            max_rating: rating.saturating_add(band),
        }
    }

    pub fn accepts(&self, puzzle: &Puzzle) -> bool {
        let wanted = normalize_theme(&self.theme);
        (self.min_rating..=self.max_rating).contains(&puzzle.rating)
            && puzzle.themes.iter().any(|t| normalize_theme(t) == wanted)
    }
}

pub trait PuzzleCorpus {
    /// Up to `limit` puzzles matching the query, in a stable order.
    fn find(&self, query: &PuzzleQuery, limit: usize) -> Vec<Puzzle>;
}

/// A corpus held in memory, typically loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    puzzles: Vec<Puzzle>,
}

impl InMemoryCorpus {
    pub fn new(puzzles: Vec<Puzzle>) -> Self {
        Self { puzzles }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

impl PuzzleCorpus for InMemoryCorpus {
    fn find(&self, query: &PuzzleQuery, limit: usize) -> Vec<Puzzle> {
        self.puzzles
            .iter()
            .filter(|p| query.accepts(p))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub theme: String,
    pub rationale: String,
    /// `None` when the corpus had nothing for this theme
    pub puzzle: Option<Puzzle>,
    pub training_url: String,
}

/// Pick up to `limit` puzzles, one per theme per round in rank order.
///
/// A theme the corpus cannot serve still gets one placeholder entry pointing
/// at the generic training page for that theme.
pub fn recommend_puzzles(
    corpus: &dyn PuzzleCorpus,
    themes: &[ThemeQuery],
    rating: u32,
    band: u32,
    limit: usize,
) -> Vec<Recommendation> {
    let mut queues: Vec<VecDeque<Puzzle>> = themes
        .iter()
        .map(|t| corpus.find(&PuzzleQuery::around(&t.theme, rating, band), limit).into())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Recommendation> = Vec::new();
    let mut first_round = true;

    while out.len() < limit {
        let mut served_any = false;
        for (theme, queue) in themes.iter().zip(queues.iter_mut()) {
            if out.len() >= limit {
                break;
            }
            let next = std::iter::from_fn(|| queue.pop_front()).find(|p| seen.insert(p.id.clone()));
            match next {
                Some(puzzle) => {
                    served_any = true;
                    out.push(Recommendation {
                        theme: theme.theme.clone(),
                        rationale: theme.rationale.clone(),
                        training_url: format!("{TRAINING_BASE_URL}/{}", puzzle.id),
                        puzzle: Some(puzzle),
                    });
                }
                None if first_round => out.push(Recommendation {
                    theme: theme.theme.clone(),
                    rationale: theme.rationale.clone(),
                    puzzle: None,
                    training_url: training_url(&theme.theme),
                }),
                None => {}
            }
        }
        first_round = false;
        if !served_any {
            break;
        }
    }

    debug!(
        themes = themes.len(),
        recommendations = out.len(),
        with_puzzle = out.iter().filter(|r| r.puzzle.is_some()).count(),
        "Recommended puzzles"
    );
    out
}

/// Theme training page, e.g. "king activity" -> ".../training/kingActivity"
pub fn training_url(theme: &str) -> String {
    let mut slug = String::with_capacity(theme.len());
    for (i, word) in theme.split_whitespace().enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                slug.extend(first.to_lowercase());
            } else {
                slug.extend(first.to_uppercase());
            }
            slug.push_str(&chars.as_str().to_lowercase());
        }
    }
    format!("{TRAINING_BASE_URL}/{slug}")
}

/// Lowercase, alphanumeric only, trailing plural dropped:
/// "Hanging Pieces", "hangingPiece" and "hanging_piece" all compare equal.
fn normalize_theme(theme: &str) -> String {
    let mut key: String = theme
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if key.ends_with('s') {
        key.pop();
    }
    key
}
