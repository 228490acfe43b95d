//! High concurrency tests for the waiting pool
//!
//! These tests validate that concurrent producers never lose or duplicate
//! participants, including while formation passes are running.

use crate::fixtures::{assert_disjoint, queue_request};
use squad_room::{FormationConfig, Matchmaker};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_1000_concurrent_enqueues() {
    let matchmaker = Arc::new(Matchmaker::new(FormationConfig::default()).unwrap());
    let total = 1000;
    let start_time = Instant::now();

    let handles: Vec<_> = (0..total)
        .map(|i| {
            let matchmaker = Arc::clone(&matchmaker);
            tokio::spawn(async move {
                matchmaker.handle_queue_request(queue_request(
                    format!("load_test_participant_{}", i),
                    1400 + (i as i64 % 400),
                    20 + (i as i64 % 150),
                ))
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let duration = start_time.elapsed();

    let accepted = results.into_iter().filter(|r| matches!(r, Ok(true))).count();
    assert_eq!(accepted, total, "every unique enqueue should be accepted");

    let snapshot = matchmaker.pool().snapshot();
    let unique: HashSet<_> = snapshot.iter().map(|p| p.id.clone()).collect();
    assert_eq!(snapshot.len(), total);
    assert_eq!(unique.len(), total);

    assert!(
        duration < Duration::from_secs(10),
        "1000 enqueues should complete within 10 seconds, took: {:?}",
        duration
    );
    assert_eq!(
        matchmaker.metrics().pool().participants_enqueued_total.get(),
        total as u64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_enqueues_keep_one() {
    let matchmaker = Arc::new(Matchmaker::new(FormationConfig::default()).unwrap());

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let matchmaker = Arc::clone(&matchmaker);
            tokio::spawn(async move {
                matchmaker.handle_queue_request(queue_request(
                    format!("shared_{}", i % 10),
                    1500,
                    50,
                ))
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let accepted = results.into_iter().filter(|r| matches!(r, Ok(true))).count();

    assert_eq!(accepted, 10);
    assert_eq!(matchmaker.pool().len(), 10);
}

#[test]
fn test_passes_racing_producers_never_lose_participants() {
    let matchmaker = Arc::new(Matchmaker::new(FormationConfig::with_team_size(3)).unwrap());
    let producers = 4;
    let per_producer = 150;

    let producer_threads: Vec<_> = (0..producers)
        .map(|producer| {
            let matchmaker = Arc::clone(&matchmaker);
            std::thread::spawn(move || {
                for i in 0..per_producer {
                    matchmaker.handle_queue_request(queue_request(
                        format!("producer_{}_{}", producer, i),
                        1000 + ((producer * per_producer + i) as i64 * 53) % 900,
                        10 + (i as i64 % 200),
                    ));
                }
            })
        })
        .collect();

    let mut matched = HashSet::new();
    let mut record = |outcome: &squad_room::FormationOutcome| {
        assert_disjoint(outcome);
        for team in &outcome.teams {
            assert_eq!(team.len(), 3);
        }
        for id in outcome.matched_ids() {
            assert!(matched.insert(id), "participant matched in two passes");
        }
    };

    while producer_threads.iter().any(|t| !t.is_finished()) {
        record(&matchmaker.run_pass().unwrap());
    }
    for thread in producer_threads {
        thread.join().unwrap();
    }

    // Drain what is left now that producers are done
    record(&matchmaker.run_pass().unwrap());

    let remaining = matchmaker.pool().len();
    assert!(remaining < 3);
    assert_eq!(matched.len() + remaining, producers * per_producer);
}
