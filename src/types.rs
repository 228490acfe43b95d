//! Common types used throughout the team-formation service

use crate::utils::{elapsed_between, spread};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for participants
pub type ParticipantId = String;

/// Unique identifier for formation passes
pub type PassId = Uuid;

/// A participant waiting to be placed in a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub skill: i64,
    /// Network latency in milliseconds
    pub latency_ms: i64,
    pub enqueued_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        skill: i64,
        latency_ms: i64,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            skill,
            latency_ms,
            enqueued_at,
        }
    }

    /// Time spent waiting as of `now`
    pub fn waiting_time(&self, now: DateTime<Utc>) -> Duration {
        elapsed_between(self.enqueued_at, now)
    }
}

/// Request submitted by a producer to join the waiting pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRequest {
    pub participant_id: ParticipantId,
    pub skill: i64,
    pub latency_ms: i64,
}

/// A fixed-size group of participants selected in one formation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub members: Vec<Participant>,
    /// Score of the selected combination; `None` when chosen by fallback
    pub score: Option<f64>,
    /// Number of candidate combinations scored while selecting this team
    pub candidates_evaluated: usize,
}

impl Team {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn skill_spread(&self) -> u64 {
        spread(self.members.iter().map(|p| p.skill))
    }

    pub fn latency_spread(&self) -> u64 {
        spread(self.members.iter().map(|p| p.latency_ms))
    }

    pub fn max_waiting_time(&self, now: DateTime<Utc>) -> Duration {
        self.members
            .iter()
            .map(|p| p.waiting_time(now))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.members.iter().any(|p| p.id == participant_id)
    }

    pub fn is_fallback(&self) -> bool {
        self.score.is_none()
    }
}

/// Result of one formation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationOutcome {
    pub pass_id: PassId,
    /// Teams in extraction order
    pub teams: Vec<Team>,
    /// Participants left unmatched because too few remained
    pub residual: Vec<Participant>,
    /// Snapshot entries dropped because their identity appeared earlier
    pub duplicates_dropped: usize,
}

impl FormationOutcome {
    /// Total participants placed into teams
    pub fn matched_count(&self) -> usize {
        self.teams.iter().map(Team::len).sum()
    }

    /// Identities of every participant placed into a team
    pub fn matched_ids(&self) -> Vec<ParticipantId> {
        self.teams
            .iter()
            .flat_map(|team| team.members.iter().map(|p| p.id.clone()))
            .collect()
    }

    /// Every participant placed into a team, in extraction order
    pub fn matched_participants(&self) -> impl Iterator<Item = &Participant> {
        self.teams.iter().flat_map(|team| team.members.iter())
    }
}
