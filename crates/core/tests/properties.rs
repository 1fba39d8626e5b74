use std::collections::HashSet;

use adapt_core::feedback::FeedbackCategory;
use adapt_core::graph::SkillGraph;
use adapt_core::model::{
    Difficulty, Percentage, ProgressRecord, QuizDefinition, QuizId, QuizQuestion, Skill, SkillId,
    SkillStatus, UserId,
};
use adapt_core::quiz::{CountdownTick, QuizSession, SessionPhase, draw_sample};
use adapt_core::recommend::{
    DEFAULT_WEAK_SPOT_THRESHOLD, LabeledScore, Recommendation, detect_weak_spot, recommend_next,
    skill_averages,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const USER: UserId = UserId::new(1);

fn skill(id: u64, prereqs: impl IntoIterator<Item = u64>) -> Skill {
    Skill::new(
        SkillId::new(id),
        format!("Skill {id}"),
        None,
        Difficulty::new(1).unwrap(),
        prereqs.into_iter().map(SkillId::new),
    )
    .unwrap()
}

/// Skills `1..=n` where each may only depend on lower ids, so the graph is acyclic.
fn dag(edges: &[Vec<bool>]) -> Vec<Skill> {
    edges
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let prereqs = row
                .iter()
                .take(i)
                .enumerate()
                .filter(|(_, on)| **on)
                .map(|(j, _)| j as u64 + 1);
            skill(i as u64 + 1, prereqs)
        })
        .collect()
}

fn status(code: u8) -> SkillStatus {
    match code % 3 {
        0 => SkillStatus::Locked,
        1 => SkillStatus::InProgress,
        _ => SkillStatus::Completed,
    }
}

fn quiz(pool: usize) -> QuizDefinition {
    let questions = (0..pool)
        .map(|n| {
            QuizQuestion::new(
                format!("Q{n}"),
                vec!["yes".into(), "no".into(), "maybe".into()],
                n % 3,
            )
            .unwrap()
        })
        .collect();
    QuizDefinition::new(QuizId::new(1), "Generated", questions).unwrap()
}

fn scored(label: &str, score: f64) -> LabeledScore {
    LabeledScore::new(Some(label.to_owned()), Percentage::new(score).unwrap())
}

//
// ─── PROPERTIES ────────────────────────────────────────────────────────────────
//

proptest! {
    #[test]
    fn recommendation_never_skips_a_prerequisite(
        rows in prop::collection::vec((prop::collection::vec(any::<bool>(), 8), any::<u8>()), 1..8)
    ) {
        let edges: Vec<Vec<bool>> = rows.iter().map(|(row, _)| row.clone()).collect();
        let graph = SkillGraph::new(dag(&edges)).unwrap();
        let progress: Vec<ProgressRecord> = graph
            .iter()
            .zip(&rows)
            .map(|(s, (_, code))| ProgressRecord::from_persisted(USER, s.id(), 0.0, status(*code)).unwrap())
            .collect();
        let completed: HashSet<SkillId> = progress
            .iter()
            .filter(|r| r.is_completed())
            .map(ProgressRecord::skill_id)
            .collect();

        if let Recommendation::Skill(id) = recommend_next(&graph, &progress).unwrap() {
            let prereqs = graph.prerequisites(id).unwrap();
            prop_assert!(prereqs.iter().all(|p| completed.contains(p)));
            prop_assert!(!completed.contains(&id));
        }
    }

    #[test]
    fn fully_completed_ledger_is_mastered(
        rows in prop::collection::vec(prop::collection::vec(any::<bool>(), 8), 0..8)
    ) {
        let graph = SkillGraph::new(dag(&rows)).unwrap();
        let progress: Vec<ProgressRecord> = graph
            .iter()
            .map(|s| ProgressRecord::from_persisted(USER, s.id(), 100.0, SkillStatus::Completed).unwrap())
            .collect();
        prop_assert_eq!(recommend_next(&graph, &progress).unwrap(), Recommendation::MasteryAchieved);
    }

    #[test]
    fn reported_weak_spot_is_below_threshold(
        entries in prop::collection::vec((prop::option::of(0usize..4), 0.0f64..=100.0), 0..24)
    ) {
        let labels = ["Algebra", "Geometry", "Calculus", "Statistics"];
        let scores: Vec<LabeledScore> = entries
            .iter()
            .map(|(label, score)| LabeledScore::new(
                label.map(|i| labels[i].to_owned()),
                Percentage::new(*score).unwrap(),
            ))
            .collect();

        if let Some(weak) = detect_weak_spot(&scores, DEFAULT_WEAK_SPOT_THRESHOLD) {
            let averages = skill_averages(&scores);
            let avg = averages.iter().find(|a| a.label == weak).unwrap();
            prop_assert!(avg.mean < DEFAULT_WEAK_SPOT_THRESHOLD);
            prop_assert!(averages.iter().all(|a| a.mean >= avg.mean));
        }
    }

    #[test]
    fn session_score_and_log_stay_in_bounds(
        pool in 1usize..8,
        sample in 1usize..8,
        budget in 1u32..6,
        seed in any::<u64>(),
        actions in prop::collection::vec(0u8..4, 0..30),
    ) {
        let sample = sample.min(pool);
        let quiz = quiz(pool).with_sample_size(sample).unwrap();
        let mut session = QuizSession::new(USER, &quiz, budget);
        session.start(&mut StdRng::seed_from_u64(seed)).unwrap();

        let mut expiries = 0;
        for action in actions {
            match action {
                0 => {
                    if session.tick() == CountdownTick::Expired {
                        expiries += 1;
                    }
                }
                1 => {
                    let _ = session.select_option(0);
                }
                2 => {
                    if let Some(q) = session.current_question() {
                        let correct = q.correct_option();
                        let _ = session.select_option(correct);
                    }
                }
                _ => {
                    let _ = session.advance();
                }
            }
            prop_assert!(session.answer_log().len() <= sample);
        }

        prop_assert!(expiries <= 1);
        if let Some(result) = session.result() {
            let score = result.score_percentage.value();
            prop_assert!((0.0..=100.0).contains(&score));
            prop_assert_eq!(result.feedback, FeedbackCategory::classify(result.score_percentage));
            prop_assert!(result.answer_log.len() <= sample);
        } else {
            prop_assert_eq!(expiries, 0);
        }
    }
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[test]
fn unlock_chain_progresses_one_skill_at_a_time() {
    let graph = SkillGraph::new(vec![skill(1, []), skill(2, [1]), skill(3, [2])]).unwrap();
    let mut progress = graph.initialize_progress(USER);
    assert_eq!(progress[0].status(), SkillStatus::InProgress);
    assert_eq!(progress[1].status(), SkillStatus::Locked);
    assert_eq!(progress[2].status(), SkillStatus::Locked);

    let mut seen = Vec::new();
    for index in 0..3 {
        progress[index].advance_to(SkillStatus::Completed).unwrap();
        seen.push(recommend_next(&graph, &progress).unwrap());
    }
    assert_eq!(
        seen,
        vec![
            Recommendation::Skill(SkillId::new(2)),
            Recommendation::Skill(SkillId::new(3)),
            Recommendation::MasteryAchieved,
        ]
    );
}

#[test]
fn strong_average_hides_single_low_score() {
    let scores = [
        scored("Algebra", 40.0),
        scored("Algebra", 80.0),
        scored("Geometry", 90.0),
    ];
    assert_eq!(detect_weak_spot(&scores, 60.0), None);
}

#[test]
fn weak_average_is_reported() {
    let scores = [
        scored("Algebra", 30.0),
        scored("Algebra", 50.0),
        scored("Geometry", 90.0),
    ];
    assert_eq!(detect_weak_spot(&scores, 60.0).as_deref(), Some("Algebra"));
}

#[test]
fn sample_of_three_from_five_is_distinct() {
    let quiz = quiz(5).with_sample_size(3).unwrap();
    for seed in 0..50 {
        let mut session = QuizSession::new(USER, &quiz, 300);
        assert_eq!(
            session.start(&mut StdRng::seed_from_u64(seed)).unwrap(),
            SessionPhase::Active
        );
        let texts: HashSet<&str> = session.questions().iter().map(QuizQuestion::text).collect();
        assert_eq!(texts.len(), 3);
    }
}

#[test]
fn shuffle_places_every_item_uniformly() {
    const RUNS: usize = 20_000;
    let pool: Vec<usize> = (0..5).collect();
    let mut rng = StdRng::seed_from_u64(2024);
    let mut counts = [[0usize; 5]; 5];

    for _ in 0..RUNS {
        for (position, item) in draw_sample(&pool, 5, &mut rng).into_iter().enumerate() {
            counts[item][position] += 1;
        }
    }

    let expected = RUNS / 5;
    for row in counts {
        for count in row {
            assert!(
                count.abs_diff(expected) < expected / 10,
                "count {count} too far from {expected}"
            );
        }
    }
}

#[test]
fn sampled_selection_frequency_is_uniform() {
    const RUNS: usize = 20_000;
    let pool: Vec<usize> = (0..5).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let mut picked = [0usize; 5];

    for _ in 0..RUNS {
        for item in draw_sample(&pool, 3, &mut rng) {
            picked[item] += 1;
        }
    }

    let expected = RUNS * 3 / 5;
    for count in picked {
        assert!(count.abs_diff(expected) < expected / 20);
    }
}
