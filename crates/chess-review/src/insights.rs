//! Per-player result breakdowns: how a player does by opening, time control
//! and colour, and how often they blunder per game.

use std::collections::BTreeMap;

use chess_core::game_data::{GameMetadata, Side};
use serde::{Deserialize, Serialize};

use crate::classification::Classification;
use crate::skill::PlayerGame;

const UNKNOWN: &str = "unknown";

/// One of the player's games together with its PGN headers.
#[derive(Debug, Clone, Copy)]
pub struct InsightGame<'a> {
    pub game: PlayerGame<'a>,
    pub metadata: &'a GameMetadata,
}

impl<'a> InsightGame<'a> {
    pub fn new(game: PlayerGame<'a>, metadata: &'a GameMetadata) -> Self {
        Self { game, metadata }
    }
}

/// Game result from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    Unfinished,
}

pub fn outcome(result: &str, side: Side) -> Outcome {
    match (result.trim(), side) {
        ("1-0", Side::White) | ("0-1", Side::Black) => Outcome::Win,
        ("1-0", Side::Black) | ("0-1", Side::White) => Outcome::Loss,
        ("1/2-1/2", _) => Outcome::Draw,
        _ => Outcome::Unfinished,
    }
}

/// Results for one opening, time control or colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub key: String,
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub blunders: usize,
    pub blunders_per_game: f64,
    /// Points scored over finished games, 0-100 (a draw is half a point)
    pub score_percentage: f64,
}

impl GroupRecord {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            blunders: 0,
            blunders_per_game: 0.0,
            score_percentage: 0.0,
        }
    }

    fn add(&mut self, outcome: Outcome, blunders: usize) {
        self.games += 1;
        self.blunders += blunders;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Unfinished => {}
        }
    }

    fn finish(mut self) -> Self {
        self.blunders_per_game = ratio(self.blunders, self.games);
        let finished = self.wins + self.losses + self.draws;
        if finished > 0 {
            self.score_percentage = (self.wins as f64 + self.draws as f64 * 0.5) / finished as f64 * 100.0;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInsights {
    pub player_id: String,
    pub total_games: usize,
    /// The player's classified moves
    pub total_moves: usize,
    pub blunders: usize,
    pub mistakes: usize,
    pub inaccuracies: usize,
    pub blunder_rate: f64,
    pub mistake_rate: f64,
    pub inaccuracy_rate: f64,
    pub blunders_per_game: f64,
    /// Keyed by ECO code, sorted by key
    pub by_opening: Vec<GroupRecord>,
    /// Keyed by the PGN TimeControl header, sorted by key
    pub by_time_control: Vec<GroupRecord>,
    pub by_color: Vec<GroupRecord>,
    /// Opening with the most blunders per game, if any opening had a blunder
    pub worst_opening: Option<String>,
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

/// Aggregate a player's games into result breakdowns.
pub fn build_insights(player_id: &str, games: &[InsightGame<'_>]) -> PlayerInsights {
    let mut openings: BTreeMap<String, GroupRecord> = BTreeMap::new();
    let mut time_controls: BTreeMap<String, GroupRecord> = BTreeMap::new();
    let mut colors = [GroupRecord::new("white"), GroupRecord::new("black")];
    let (mut total_moves, mut blunders, mut mistakes, mut inaccuracies) = (0, 0, 0, 0);

    for InsightGame { game, metadata } in games {
        let mut game_blunders = 0;
        for m in game.moves().filter(|m| m.classification.is_classified()) {
            total_moves += 1;
            match m.classification {
                Classification::Blunder => game_blunders += 1,
                Classification::Mistake => mistakes += 1,
                Classification::Inaccuracy => inaccuracies += 1,
                _ => {}
            }
        }
        blunders += game_blunders;

        let result = outcome(&metadata.result, game.side);
        let key = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != "?")
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        let opening = key(&metadata.eco);
        openings
            .entry(opening.clone())
            .or_insert_with(|| GroupRecord::new(&opening))
            .add(result, game_blunders);
        let time_control = key(&metadata.time_control);
        time_controls
            .entry(time_control.clone())
            .or_insert_with(|| GroupRecord::new(&time_control))
            .add(result, game_blunders);
        let color = if game.side.is_white() { 0 } else { 1 };
        colors[color].add(result, game_blunders);
    }

    let by_opening: Vec<GroupRecord> = openings.into_values().map(GroupRecord::finish).collect();
    let worst_opening = by_opening
        .iter()
        .filter(|g| g.blunders > 0)
        .fold(None, |worst: Option<&GroupRecord>, g| match worst {
            Some(w) if w.blunders_per_game >= g.blunders_per_game => worst,
            _ => Some(g),
        })
        .map(|g| g.key.clone());

    let rate = |n: usize| ratio(n, total_moves) * 100.0;
    PlayerInsights {
        player_id: player_id.to_string(),
        total_games: games.len(),
        total_moves,
        blunders,
        mistakes,
        inaccuracies,
        blunder_rate: rate(blunders),
        mistake_rate: rate(mistakes),
        inaccuracy_rate: rate(inaccuracies),
        blunders_per_game: ratio(blunders, games.len()),
        by_opening,
        by_time_control: time_controls.into_values().map(GroupRecord::finish).collect(),
        by_color: colors.into_iter().map(GroupRecord::finish).collect(),
        worst_opening,
    }
}
