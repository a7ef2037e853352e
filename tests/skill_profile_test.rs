//! Integration tests: skill profiles built from several analysed games.

mod common;

use chess_core::game_data::Side;
use chess_review::classification::Classification;
use chess_review::skill::{build_skill_profile, Phase, PlayerGame, ProfileConfig, Skill, SkillProfileBuilder};
use common::{day, game_from_labels, uneven_phases};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_ten_games_weakest_phase_is_endgame() {
    let analyses: Vec<_> = (1..=10)
        .map(|n| game_from_labels(&format!("g{n}"), &uneven_phases()))
        .collect();
    let games: Vec<PlayerGame> = analyses
        .iter()
        .enumerate()
        .map(|(i, a)| PlayerGame::new(a, Side::White).with_played_at(day(i as u32 + 1)))
        .collect();

    let profile = build_skill_profile("alice", &games);

    assert_eq!(profile.games_analyzed, 10);
    assert!(close(profile.score(Skill::Opening), 85.0));
    assert!(close(profile.score(Skill::Middlegame), 75.0));
    assert!(close(profile.score(Skill::Endgame), 40.0));
    assert_eq!(profile.weakest_phase(), Some(Phase::Endgame));

    // Identical games: no trend
    for skill in Skill::ALL {
        assert!(close(profile.get(skill).unwrap().improvement, 0.0));
    }
}

#[test]
fn test_games_are_ordered_by_date() {
    let a = game_from_labels("late", &[Classification::Best]);
    let b = game_from_labels("early", &[Classification::Best]);
    let games = [
        PlayerGame::new(&a, Side::White).with_played_at(day(20)),
        PlayerGame::new(&b, Side::White).with_played_at(day(2)),
    ];
    let profile = build_skill_profile("p", &games);
    assert_eq!(profile.game_ids, vec!["early", "late"]);
}

#[test]
fn test_improvement_against_older_games() {
    use Classification::*;
    let weak = game_from_labels("old", &[Blunder, Mistake, Best, Inaccuracy]);
    let strong = game_from_labels("new", &[Best, Best, Best, Best]);
    let games = [
        PlayerGame::new(&weak, Side::White).with_played_at(day(1)),
        PlayerGame::new(&strong, Side::White).with_played_at(day(2)),
    ];

    let builder = SkillProfileBuilder::new(ProfileConfig {
        improvement_window: 1,
        ..ProfileConfig::default()
    });
    let profile = builder.build("p", &games);

    // Pooled opening accuracy (1.6 + 4) / 8 = 70; older games alone 40
    let opening = profile.get(Skill::Opening).unwrap();
    assert!(close(opening.score, 70.0));
    assert!(close(opening.improvement, 30.0));
    // No middlegame moves at all
    assert!(profile.get(Skill::Middlegame).unwrap().insufficient_data);
}

#[test]
fn test_only_the_players_side_counts() {
    let analysis = game_from_labels("g", &[Classification::Blunder; 4]);
    let as_black = build_skill_profile("p", &[PlayerGame::new(&analysis, Side::Black)]);
    assert!(close(as_black.score(Skill::Opening), 100.0));

    let as_white = build_skill_profile("p", &[PlayerGame::new(&analysis, Side::White)]);
    assert!(close(as_white.score(Skill::Opening), 0.0));
}

#[test]
fn test_empty_profile_is_flagged() {
    let profile = build_skill_profile("nobody", &[]);
    assert_eq!(profile.games_analyzed, 0);
    assert_eq!(profile.weakest_phase(), None);
    assert!(profile.skills.iter().all(|s| s.insufficient_data));
}
