//! Player skill profile.
//!
//! A profile is always rebuilt from the player's full set of analysed games.
//! Improvement is the difference between the profile over every game and the
//! same profile with the most recent games held out.

use chrono::{DateTime, Utc};
use chess_core::game_data::Side;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accuracy::{accuracy, mean_weight, Accuracy};
use crate::analysis::{AnalyzedMove, GameAnalysis};
use crate::classification::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Opening,
    Middlegame,
    Endgame,
    Tactics,
    #[serde(rename = "Time Management")]
    TimeManagement,
}

impl Skill {
    pub const ALL: [Skill; 5] = [
        Skill::Opening,
        Skill::Middlegame,
        Skill::Endgame,
        Skill::Tactics,
        Skill::TimeManagement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Skill::Opening => "Opening",
            Skill::Middlegame => "Middlegame",
            Skill::Endgame => "Endgame",
            Skill::Tactics => "Tactics",
            Skill::TimeManagement => "Time Management",
        }
    }

    /// Coaching sentence for a score
    pub fn describe(self, score: f64) -> &'static str {
        let (high, medium, low) = match self {
            Skill::Opening => (
                "Excellent theoretical knowledge, strong repertoire",
                "Good theoretical knowledge, could explore more variations",
                "Consider studying opening principles and main lines",
            ),
            Skill::Middlegame => (
                "Strong positional understanding and piece coordination",
                "Piece coordination needs work, especially in complex positions",
                "Focus on piece activity and central control",
            ),
            Skill::Endgame => (
                "Excellent technique, converts advantages well",
                "Improving! Focus on king activity and passed pawns",
                "Study basic endgame principles and king activity",
            ),
            Skill::Tactics => (
                "Sharp tactical vision, finds combinations",
                "Solid tactical vision, practice deeper calculations",
                "Practice tactical puzzles daily to improve pattern recognition",
            ),
            Skill::TimeManagement => (
                "Efficient use of clock, consistent performance",
                "Generally good, avoid rushing in critical positions",
                "Spending too much time in familiar positions",
            ),
        };
        if score >= 75.0 {
            high
        } else if score >= 55.0 {
            medium
        } else {
            low
        }
    }
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Opening, Phase::Middlegame, Phase::Endgame];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Middlegame => "middlegame",
            Phase::Endgame => "endgame",
        }
    }

    pub fn skill(self) -> Skill {
        match self {
            Phase::Opening => Skill::Opening,
            Phase::Middlegame => Skill::Middlegame,
            Phase::Endgame => Skill::Endgame,
        }
    }

    fn slot(self) -> usize {
        match self {
            Phase::Opening => 0,
            Phase::Middlegame => 1,
            Phase::Endgame => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Last ply (1-based, inclusive) of the opening and of the middlegame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseBoundaries {
    pub opening_last_ply: usize,
    pub middlegame_last_ply: usize,
}

impl Default for PhaseBoundaries {
    fn default() -> Self {
        Self {
            opening_last_ply: 15,
            middlegame_last_ply: 40,
        }
    }
}

impl PhaseBoundaries {
    pub fn phase_of(&self, ply: usize) -> Phase {
        if ply <= self.opening_last_ply {
            Phase::Opening
        } else if ply <= self.middlegame_last_ply {
            Phase::Middlegame
        } else {
            Phase::Endgame
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub phases: PhaseBoundaries,
    /// Number of most recent games held out when computing improvement
    pub improvement_window: usize,
    pub time_baseline: f64,
    /// Fraction of a game's moves that count as "early"
    pub time_split: f64,
    /// Games with fewer classified player moves are not assessed for time
    pub time_min_moves: usize,
    pub severe_drop: f64,
    pub severe_penalty: f64,
    pub moderate_drop: f64,
    pub moderate_penalty: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            phases: PhaseBoundaries::default(),
            improvement_window: 5,
            time_baseline: 70.0,
            time_split: 0.75,
            time_min_moves: 20,
            severe_drop: 0.20,
            severe_penalty: 25.0,
            moderate_drop: 0.10,
            moderate_penalty: 15.0,
        }
    }
}

/// One analysed game seen from one player's side.
#[derive(Debug, Clone, Copy)]
pub struct PlayerGame<'a> {
    pub analysis: &'a GameAnalysis,
    pub side: Side,
    pub played_at: Option<DateTime<Utc>>,
}

impl<'a> PlayerGame<'a> {
    pub fn new(analysis: &'a GameAnalysis, side: Side) -> Self {
        Self {
            analysis,
            side,
            played_at: None,
        }
    }

    pub fn with_played_at(mut self, at: DateTime<Utc>) -> Self {
        self.played_at = Some(at);
        self
    }

    pub fn game_id(&self) -> &'a str {
        &self.analysis.game_id
    }

    /// The player's own moves, in game order
    pub fn moves(&self) -> impl Iterator<Item = &'a AnalyzedMove> + 'a {
        let side = self.side;
        self.analysis.moves.iter().filter(move |m| m.side == side)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: Skill,
    /// Clamped to 0-100
    pub score: f64,
    /// Unclamped value (tactics can leave the 0-100 range)
    pub raw: f64,
    pub improvement: f64,
    pub insufficient_data: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub player_id: String,
    pub games_analyzed: usize,
    /// Games folded in, oldest first
    pub game_ids: Vec<String>,
    pub skills: Vec<SkillScore>,
}

impl SkillProfile {
    pub fn get(&self, skill: Skill) -> Option<&SkillScore> {
        self.skills.iter().find(|s| s.skill == skill)
    }

    pub fn score(&self, skill: Skill) -> f64 {
        self.get(skill).map(|s| s.score).unwrap_or(0.0)
    }

    /// Lowest-scoring phase among those with data
    pub fn weakest_phase(&self) -> Option<Phase> {
        Phase::ALL
            .iter()
            .filter_map(|p| self.get(p.skill()).filter(|s| !s.insufficient_data).map(|s| (*p, s.score)))
            .fold(None, |worst: Option<(Phase, f64)>, (p, score)| match worst {
                Some((_, w)) if w <= score => worst,
                _ => Some((p, score)),
            })
            .map(|(p, _)| p)
    }
}

/// Raw aggregate of one set of games, before clamping and descriptions.
#[derive(Debug, Clone, Copy)]
struct Aggregate {
    phases: [Accuracy; 3],
    tactics: Option<f64>,
    time: Option<f64>,
}

impl Aggregate {
    fn value(&self, skill: Skill, baseline: f64) -> (f64, bool) {
        match skill {
            Skill::Opening => phase_value(&self.phases[Phase::Opening.slot()]),
            Skill::Middlegame => phase_value(&self.phases[Phase::Middlegame.slot()]),
            Skill::Endgame => phase_value(&self.phases[Phase::Endgame.slot()]),
            Skill::Tactics => self.tactics.map_or((0.0, true), |t| (t, false)),
            Skill::TimeManagement => self.time.map_or((baseline, true), |t| (t, false)),
        }
    }
}

fn phase_value(acc: &Accuracy) -> (f64, bool) {
    (acc.value, acc.insufficient_data)
}

pub struct SkillProfileBuilder {
    config: ProfileConfig,
}

impl SkillProfileBuilder {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Rebuild a player's profile from all their analysed games.
    pub fn build(&self, player_id: &str, games: &[PlayerGame<'_>]) -> SkillProfile {
        let mut ordered: Vec<&PlayerGame<'_>> = games.iter().collect();
        ordered.sort_by_key(|g| g.played_at);

        let current = self.aggregate(&ordered);
        let held_out = ordered.len().saturating_sub(self.config.improvement_window);
        let previous = (held_out > 0 && held_out < ordered.len())
            .then(|| self.aggregate(&ordered[..held_out]));

        let skills = Skill::ALL
            .iter()
            .map(|&skill| {
                let (raw, insufficient_data) = current.value(skill, self.config.time_baseline);
                let score = raw.clamp(0.0, 100.0);
                let improvement = match previous.map(|p| p.value(skill, self.config.time_baseline)) {
                    Some((old, false)) if !insufficient_data => score - old.clamp(0.0, 100.0),
                    _ => 0.0,
                };
                SkillScore {
                    skill,
                    score,
                    raw,
                    improvement,
                    insufficient_data,
                    description: skill.describe(score).to_string(),
                }
            })
            .collect();

        debug!(player_id, games = ordered.len(), "Built skill profile");

        SkillProfile {
            player_id: player_id.to_string(),
            games_analyzed: ordered.len(),
            game_ids: ordered.iter().map(|g| g.game_id().to_string()).collect(),
            skills,
        }
    }

    fn aggregate(&self, games: &[&PlayerGame<'_>]) -> Aggregate {
        let phases = Phase::ALL.map(|phase| {
            accuracy(
                games
                    .iter()
                    .flat_map(|g| g.moves())
                    .filter(|m| self.config.phases.phase_of(m.ply()) == phase)
                    .map(|m| m.classification),
            )
        });

        let tactics = tactics_score(games.iter().flat_map(|g| g.moves()).map(|m| m.classification));

        let assessed: Vec<f64> = games
            .iter()
            .filter_map(|g| self.time_management(g))
            .collect();
        let time = (!assessed.is_empty()).then(|| assessed.iter().sum::<f64>() / assessed.len() as f64);

        Aggregate {
            phases,
            tactics,
            time,
        }
    }

    /// Baseline minus a penalty when late-game quality drops. `None` when the
    /// game is too short to judge.
    pub fn time_management(&self, game: &PlayerGame<'_>) -> Option<f64> {
        let labels: Vec<Classification> = game
            .moves()
            .map(|m| m.classification)
            .filter(|c| c.is_classified())
            .collect();
        if labels.len() < self.config.time_min_moves {
            return None;
        }

        let split = (labels.len() as f64 * self.config.time_split) as usize;
        let (early, late) = labels.split_at(split);
        let (early_mean, _) = mean_weight(early.iter().copied())?;
        let (late_mean, _) = mean_weight(late.iter().copied())?;

        let drop = early_mean - late_mean;
        let penalty = if drop > self.config.severe_drop {
            self.config.severe_penalty
        } else if drop > self.config.moderate_drop {
            self.config.moderate_penalty
        } else {
            0.0
        };
        Some(self.config.time_baseline - penalty)
    }
}

impl Default for SkillProfileBuilder {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}

/// `base + bonus - penalty` over a pooled move set, unclamped.
pub fn tactics_score<I>(labels: I) -> Option<f64>
where
    I: IntoIterator<Item = Classification>,
{
    let labels: Vec<Classification> = labels.into_iter().filter(|c| c.is_classified()).collect();
    let (base, n) = mean_weight(labels.iter().copied())?;
    let count = |c: Classification| labels.iter().filter(|l| **l == c).count() as f64;
    let n = n as f64;

    let bonus = (5.0 * count(Classification::Brilliant)
        + 3.0 * count(Classification::Great)
        + count(Classification::Best))
        / n
        * 100.0;
    let penalty = (3.0 * count(Classification::Blunder) + count(Classification::Mistake)) / n * 50.0;

    Some(base * 100.0 + bonus - penalty)
}

/// Build a profile with the default configuration.
pub fn build_skill_profile(player_id: &str, games: &[PlayerGame<'_>]) -> SkillProfile {
    SkillProfileBuilder::default().build(player_id, games)
}
