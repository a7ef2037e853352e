//! The JSON report printed by the CLI: per-game analyses with explanations of
//! the player's moves, plus the player's skill profile, result breakdowns,
//! weakness pattern and puzzle recommendations.

use chess_core::game_data::Side;
use chess_review::analysis::GameAnalysis;
use chess_review::explain::{explain_game, MoveExplanation};
use chess_review::insights::{build_insights, InsightGame, PlayerInsights};
use chess_review::puzzles::{recommend_puzzles, PuzzleCorpus, Recommendation};
use chess_review::skill::{PlayerGame, ProfileConfig, SkillProfile, SkillProfileBuilder};
use chess_review::weakness::{WeaknessMatcher, WeaknessPattern};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::WorkerConfig;
use crate::input::GameInput;

#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    pub game_id: String,
    pub white: String,
    pub black: String,
    pub result: String,
    pub played_at: Option<DateTime<Utc>>,
    /// The reviewed player's side, `None` if they did not play this game
    pub side: Option<Side>,
    pub analysis: GameAnalysis,
    /// The reviewed player's moves, explained
    pub explanations: Vec<MoveExplanation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub player: String,
    pub games: Vec<GameReport>,
    pub profile: SkillProfile,
    pub insights: PlayerInsights,
    pub weaknesses: WeaknessPattern,
    pub recommendations: Vec<Recommendation>,
}

pub fn build_report(
    player: &str,
    analyzed: &[(GameInput, GameAnalysis)],
    config: &WorkerConfig,
    corpus: &dyn PuzzleCorpus,
) -> ReviewReport {
    let mut player_games = Vec::with_capacity(analyzed.len());
    let mut insight_games = Vec::with_capacity(analyzed.len());
    for (input, analysis) in analyzed {
        match input.record.side_of(player) {
            Some(side) => {
                let game = PlayerGame::new(analysis, side);
                let game = match input.played_at {
                    Some(at) => game.with_played_at(at),
                    None => game,
                };
                player_games.push(game);
                insight_games.push(InsightGame::new(game, &input.record.metadata));
            }
            None => warn!(game_id = %input.game_id, player, "Player not in game, excluded from profile"),
        }
    }

    let builder = SkillProfileBuilder::new(ProfileConfig {
        improvement_window: config.improvement_window,
        ..ProfileConfig::default()
    });
    let profile = builder.build(player, &player_games);
    let insights = build_insights(player, &insight_games);

    let matcher = WeaknessMatcher::default();
    let weaknesses = matcher.extract_pattern(player, &player_games);
    let themes = matcher.match_pattern(&weaknesses);
    let recommendations = recommend_puzzles(
        corpus,
        &themes,
        config.player_rating,
        config.puzzle_rating_band,
        config.recommendation_limit,
    );

    info!(
        player,
        games = player_games.len(),
        weakest_phase = ?weaknesses.weakest_phase,
        recommendations = recommendations.len(),
        "Report built"
    );

    let games = analyzed
        .iter()
        .map(|(input, analysis)| {
            let side = input.record.side_of(player);
            GameReport {
                game_id: input.game_id.clone(),
                white: input.record.metadata.white.clone(),
                black: input.record.metadata.black.clone(),
                result: input.record.metadata.result.clone(),
                played_at: input.played_at,
                side,
                analysis: analysis.clone(),
                explanations: side.map_or_else(Vec::new, |s| explain_game(analysis, Some(s))),
            }
        })
        .collect();

    ReviewReport {
        player: player.to_string(),
        games,
        profile,
        insights,
        weaknesses,
        recommendations,
    }
}
