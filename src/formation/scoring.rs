//! Team scoring
//!
//! Scores are costs: lower is better. Spreads in skill and latency add to the
//! cost, the longest wait among the members subtracts from it.

use crate::config::formation::ScoringWeights;
use crate::types::Participant;
use crate::utils::spread;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Trait for scoring a candidate team (lower = better)
pub trait TeamScorer: Send + Sync {
    fn score(&self, members: &[&Participant], now: DateTime<Utc>) -> f64;
}

/// Weighted cost over skill spread, latency spread and maximum wait
#[derive(Debug, Clone, Default)]
pub struct WeightedTeamScorer {
    weights: ScoringWeights,
}

impl WeightedTeamScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }
}

impl TeamScorer for WeightedTeamScorer {
    fn score(&self, members: &[&Participant], now: DateTime<Utc>) -> f64 {
        let w = &self.weights;

        let skill_spread = spread(members.iter().map(|p| p.skill)) as f64;
        let latency_spread = spread(members.iter().map(|p| p.latency_ms)) as f64;
        let max_wait_seconds = members
            .iter()
            .map(|p| p.waiting_time(now))
            .max()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();

        w.skill_weight * (skill_spread / w.skill_norm)
            + w.latency_weight * (latency_spread / w.latency_norm)
            - w.wait_weight * (max_wait_seconds / w.wait_norm)
    }
}
