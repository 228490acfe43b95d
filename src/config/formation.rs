//! Team formation configuration
//!
//! Team size, the per-team candidate budget and the scoring weights. All
//! values are validated before a formation pass starts; nothing is clamped.

use crate::error::{MatchmakingError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default cap on candidate combinations scored per team
pub const DEFAULT_MAX_CANDIDATES_PER_TEAM: usize = 1000;

/// Default number of participants per team
pub const DEFAULT_TEAM_SIZE: usize = 2;

/// Weights and normalization divisors for the team score
///
/// ```text
/// score = skill_weight   * skill_spread   / skill_norm
///       + latency_weight * latency_spread / latency_norm
///       - wait_weight    * max_wait_secs  / wait_norm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub skill_weight: f64,
    pub latency_weight: f64,
    pub wait_weight: f64,
    pub skill_norm: f64,
    pub latency_norm: f64,
    /// Seconds
    pub wait_norm: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill_weight: 0.5,
            latency_weight: 0.3,
            wait_weight: 0.2,
            skill_norm: 1000.0,
            latency_norm: 1000.0,
            wait_norm: 60.0,
        }
    }
}

impl ScoringWeights {
    /// Validate weights and divisors
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("skill_weight", self.skill_weight),
            ("latency_weight", self.latency_weight),
            ("wait_weight", self.wait_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchmakingError::invalid_config(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                ))
                .into());
            }
        }

        let norms = [
            ("skill_norm", self.skill_norm),
            ("latency_norm", self.latency_norm),
            ("wait_norm", self.wait_norm),
        ];
        for (name, value) in norms {
            if !value.is_finite() || value <= 0.0 {
                return Err(MatchmakingError::invalid_config(format!(
                    "{} must be a finite positive number, got {}",
                    name, value
                ))
                .into());
            }
        }

        Ok(())
    }
}

/// How a formation pass treats a participant identity seen twice in one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence in snapshot order, drop the rest
    #[default]
    Deduplicate,
    /// Fail the pass with `MatchmakingError::DuplicateIdentity`
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = MatchmakingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deduplicate" | "dedup" => Ok(Self::Deduplicate),
            "reject" => Ok(Self::Reject),
            other => Err(MatchmakingError::invalid_config(format!(
                "Unknown duplicate policy: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Deduplicate => write!(f, "deduplicate"),
            DuplicatePolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Configuration for a formation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Participants per team
    pub team_size: usize,
    /// Hard cap on combinations scored per team
    pub max_candidates_per_team: usize,
    pub scoring: ScoringWeights,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            team_size: DEFAULT_TEAM_SIZE,
            max_candidates_per_team: DEFAULT_MAX_CANDIDATES_PER_TEAM,
            scoring: ScoringWeights::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl FormationConfig {
    /// Configuration with the given team size and default everything else
    pub fn with_team_size(team_size: usize) -> Self {
        Self {
            team_size,
            ..Self::default()
        }
    }

    pub fn with_max_candidates(mut self, max_candidates_per_team: usize) -> Self {
        self.max_candidates_per_team = max_candidates_per_team;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringWeights) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.team_size < 1 {
            return Err(MatchmakingError::invalid_config("team_size must be at least 1").into());
        }

        if self.max_candidates_per_team < 1 {
            return Err(MatchmakingError::invalid_config(
                "max_candidates_per_team must be at least 1",
            )
            .into());
        }

        self.scoring.validate()
    }
}
