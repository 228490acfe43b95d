//! Test fixtures shared by the integration and load tests

#![allow(dead_code)]

use squad_room::clock::ManualClock;
use squad_room::types::{FormationOutcome, Participant, QueueRequest};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Manual clock starting at the current time
pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::starting_now())
}

/// Participant enqueued `waited` before the clock's current time
pub fn waiting_participant(
    clock: &ManualClock,
    id: &str,
    skill: i64,
    latency_ms: i64,
    waited: Duration,
) -> Participant {
    use squad_room::clock::Clock;
    let enqueued_at = clock.now() - chrono::Duration::from_std(waited).unwrap();
    Participant::new(id, skill, latency_ms, enqueued_at)
}

pub fn queue_request(id: impl Into<String>, skill: i64, latency_ms: i64) -> QueueRequest {
    QueueRequest {
        participant_id: id.into(),
        skill,
        latency_ms,
    }
}

/// The classic four-participant scenario: skills 1050/1180/1220/1350, 50ms each
pub fn sample_requests() -> Vec<QueueRequest> {
    vec![
        queue_request("A", 1050, 50),
        queue_request("B", 1180, 50),
        queue_request("C", 1220, 50),
        queue_request("D", 1350, 50),
    ]
}

/// Assert that no participant appears in two teams or in both a team and the residual
pub fn assert_disjoint(outcome: &FormationOutcome) {
    let mut seen = HashSet::new();
    for team in &outcome.teams {
        for member in &team.members {
            assert!(
                seen.insert(member.id.clone()),
                "participant '{}' assigned twice",
                member.id
            );
        }
    }
    for participant in &outcome.residual {
        assert!(
            seen.insert(participant.id.clone()),
            "participant '{}' is both matched and residual",
            participant.id
        );
    }
}
