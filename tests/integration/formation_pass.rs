//! End-to-end formation passes through the Matchmaker

use crate::fixtures::{
    assert_disjoint, queue_request, sample_requests, test_clock, waiting_participant,
};

use chrono::{DateTime, Utc};
use squad_room::clock::Clock;
use squad_room::formation::{Combinations, TeamFormationEngine, TeamScorer, WeightedTeamScorer};
use squad_room::metrics::MetricsCollector;
use squad_room::queue::WaitingPool;
use squad_room::types::Participant;
use squad_room::{FormationConfig, Matchmaker, MatchmakingError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_sample_scenario_pairs_greedily() {
    let clock = test_clock();
    let matchmaker =
        Matchmaker::with_clock(FormationConfig::with_team_size(2), clock.clone()).unwrap();

    for request in sample_requests() {
        assert!(matchmaker.handle_queue_request(request));
    }
    clock.advance(Duration::from_secs(2));

    let outcome = matchmaker.run_pass().unwrap();
    assert_disjoint(&outcome);

    // {B,C} has the lowest score of all six pairs, so it is extracted first
    let teams: Vec<Vec<&str>> = outcome.teams.iter().map(|t| t.member_ids()).collect();
    assert_eq!(teams, vec![vec!["B", "C"], vec!["A", "D"]]);
    assert!(outcome.residual.is_empty());
    assert!(matchmaker.pool().is_empty());

    let wait_bonus = 0.2 * (2.0 / 60.0);
    let first = outcome.teams[0].score.unwrap();
    assert!((first - (0.5 * 0.04 - wait_bonus)).abs() < 1e-9);
}

#[test]
fn test_each_team_is_minimum_of_remaining_candidates() {
    let clock = test_clock();
    let snapshot: Vec<Participant> = (0..8)
        .map(|i| {
            waiting_participant(
                &clock,
                &format!("p{}", i),
                900 + (i * 211) % 700,
                15 + (i * 47) % 120,
                Duration::from_secs((i as u64 * 13) % 90),
            )
        })
        .collect();

    let engine =
        TeamFormationEngine::new(FormationConfig::with_team_size(2), clock.clone()).unwrap();
    let outcome = engine.form_teams(snapshot.clone()).unwrap();
    assert_eq!(outcome.teams.len(), 4);

    let scorer = WeightedTeamScorer::default();
    let now = clock.now();
    let mut remaining = snapshot;
    for team in &outcome.teams {
        let best = Combinations::new(remaining.len(), 2)
            .map(|c| {
                let members: Vec<_> = c.iter().map(|&i| &remaining[i]).collect();
                scorer.score(&members, now)
            })
            .fold(f64::INFINITY, f64::min);

        assert!((team.score.unwrap() - best).abs() < 1e-12);
        remaining.retain(|p| !team.contains(&p.id));
    }
    assert!(remaining.is_empty());
}

#[test]
fn test_singleton_teams_follow_waiting_time() {
    let clock = test_clock();
    let matchmaker =
        Matchmaker::with_clock(FormationConfig::with_team_size(1), clock.clone()).unwrap();

    matchmaker.enqueue(waiting_participant(&clock, "w1", 1500, 50, Duration::from_secs(1)));
    matchmaker.enqueue(waiting_participant(&clock, "w5", 1500, 50, Duration::from_secs(5)));
    matchmaker.enqueue(waiting_participant(&clock, "w10", 1500, 50, Duration::from_secs(10)));

    let outcome = matchmaker.run_pass().unwrap();
    let order: Vec<_> = outcome.teams.iter().map(|t| t.members[0].id.as_str()).collect();
    assert_eq!(order, vec!["w10", "w5", "w1"]);
}

#[test]
fn test_residual_stays_for_next_pass() {
    let clock = test_clock();
    let matchmaker =
        Matchmaker::with_clock(FormationConfig::with_team_size(3), clock.clone()).unwrap();

    for i in 0..4 {
        matchmaker.handle_queue_request(queue_request(format!("first-{}", i), 1500 + i * 5, 40));
    }
    let outcome = matchmaker.run_pass().unwrap();
    assert_eq!(outcome.teams.len(), 1);
    assert_eq!(outcome.residual.len(), 1);
    let leftover = outcome.residual[0].id.clone();
    assert!(matchmaker.pool().contains(&leftover));

    clock.advance(Duration::from_secs(30));
    matchmaker.handle_queue_request(queue_request("second-0", 1510, 40));
    matchmaker.handle_queue_request(queue_request("second-1", 1515, 45));

    let outcome = matchmaker.run_pass().unwrap();
    assert_eq!(outcome.teams.len(), 1);
    assert!(outcome.teams[0].contains(&leftover));
    assert!(matchmaker.pool().is_empty());
}

#[test]
fn test_insufficient_pool_is_not_an_error() {
    let matchmaker = Matchmaker::new(FormationConfig::with_team_size(5)).unwrap();
    for i in 0..4 {
        matchmaker.handle_queue_request(queue_request(format!("p{}", i), 1500, 50));
    }

    let outcome = matchmaker.run_pass().unwrap();
    assert!(outcome.teams.is_empty());
    assert_eq!(outcome.residual.len(), 4);
    assert_eq!(matchmaker.pool().len(), 4);
}

#[test]
fn test_invalid_configuration_surfaces_before_work() {
    let error = match Matchmaker::new(FormationConfig::with_team_size(2).with_max_candidates(0)) {
        Ok(_) => panic!("zero candidate budget accepted"),
        Err(e) => e,
    };
    assert!(matches!(
        error.downcast_ref::<MatchmakingError>(),
        Some(MatchmakingError::InvalidConfiguration { .. })
    ));
}

/// Scorer that enqueues a late arrival into the pool while a pass is running
struct EnqueueDuringPass {
    pool: Arc<WaitingPool>,
    late: Participant,
    injected: AtomicBool,
    inner: WeightedTeamScorer,
}

impl TeamScorer for EnqueueDuringPass {
    fn score(&self, members: &[&Participant], now: DateTime<Utc>) -> f64 {
        if !self.injected.swap(true, Ordering::SeqCst) {
            self.pool.enqueue(self.late.clone());
        }
        self.inner.score(members, now)
    }
}

#[test]
fn test_enqueue_during_pass_is_not_removed() {
    let clock = test_clock();
    let pool = Arc::new(WaitingPool::new());
    let late = Participant::new("late", 1500, 50, clock.now());

    let scorer = Arc::new(EnqueueDuringPass {
        pool: Arc::clone(&pool),
        late,
        injected: AtomicBool::new(false),
        inner: WeightedTeamScorer::default(),
    });
    let engine =
        TeamFormationEngine::with_scorer(FormationConfig::with_team_size(2), clock.clone(), scorer)
            .unwrap();
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let matchmaker = Matchmaker::with_components(Arc::clone(&pool), engine, metrics);

    for i in 0..4 {
        let participant = Participant::new(format!("p{}", i), 1500 + i * 10, 50, clock.now());
        matchmaker.enqueue(participant);
    }

    let outcome = matchmaker.run_pass().unwrap();
    assert_eq!(outcome.teams.len(), 2);
    assert!(!outcome.matched_ids().contains(&"late".to_string()));
    assert_eq!(pool.len(), 1);
    assert!(pool.contains("late"));
}

/// Scorer that takes a participant out of the pool and re-queues it mid-pass
struct RejoinDuringPass {
    pool: Arc<WaitingPool>,
    rejoined: Participant,
    injected: AtomicBool,
    inner: WeightedTeamScorer,
}

impl TeamScorer for RejoinDuringPass {
    fn score(&self, members: &[&Participant], now: DateTime<Utc>) -> f64 {
        if !self.injected.swap(true, Ordering::SeqCst) {
            self.pool.remove(&self.rejoined.id);
            self.pool.enqueue(self.rejoined.clone());
        }
        self.inner.score(members, now)
    }
}

#[test]
fn test_rejoin_during_pass_keeps_new_entry() {
    let clock = test_clock();
    let pool = Arc::new(WaitingPool::new());
    let rejoined = Participant::new("p0", 1900, 80, clock.now() + chrono::Duration::seconds(1));

    let scorer = Arc::new(RejoinDuringPass {
        pool: Arc::clone(&pool),
        rejoined,
        injected: AtomicBool::new(false),
        inner: WeightedTeamScorer::default(),
    });
    let engine =
        TeamFormationEngine::with_scorer(FormationConfig::with_team_size(2), clock.clone(), scorer)
            .unwrap();
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let matchmaker = Matchmaker::with_components(Arc::clone(&pool), engine, metrics);

    matchmaker.enqueue(Participant::new("p0", 1500, 50, clock.now()));
    matchmaker.enqueue(Participant::new("p1", 1510, 50, clock.now()));

    let outcome = matchmaker.run_pass().unwrap();
    assert_eq!(outcome.teams.len(), 1);
    assert_eq!(outcome.teams[0].member_ids(), vec!["p0", "p1"]);
    assert_eq!(outcome.teams[0].members[0].skill, 1500);

    let remaining = pool.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "p0");
    assert_eq!(remaining[0].skill, 1900);
}

/// Scorer counting calls so the candidate budget can be observed from outside
#[derive(Default)]
struct CountingScorer {
    inner: WeightedTeamScorer,
    calls: AtomicUsize,
}

impl TeamScorer for CountingScorer {
    fn score(&self, members: &[&Participant], now: DateTime<Utc>) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.score(members, now)
    }
}

#[test]
fn test_budget_respected_on_large_pool() {
    let clock = test_clock();
    let snapshot: Vec<Participant> = (0..40)
        .map(|i| {
            let skill = 1000 + (i * 37) % 600;
            Participant::new(format!("p{}", i), skill, 20 + i % 80, clock.now())
        })
        .collect();

    let scorer = Arc::new(CountingScorer::default());
    let config = FormationConfig::with_team_size(4).with_max_candidates(200);
    let engine = TeamFormationEngine::with_scorer(config, clock.clone(), scorer.clone()).unwrap();

    let outcome = engine.form_teams(snapshot).unwrap();
    assert_eq!(outcome.teams.len(), 10);
    assert_disjoint(&outcome);

    for team in &outcome.teams {
        assert!(team.candidates_evaluated <= 200);
        assert_eq!(team.len(), 4);
    }
    let total: usize = outcome.teams.iter().map(|t| t.candidates_evaluated).sum();
    assert_eq!(scorer.calls.load(Ordering::SeqCst), total);
    // C(40,4) far exceeds the cap, so the first team used the full budget
    assert_eq!(outcome.teams[0].candidates_evaluated, 200);
}
