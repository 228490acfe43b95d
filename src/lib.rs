//! Squad Room - skill and latency balanced team formation
//!
//! This crate provides a thread-safe waiting pool and a budgeted team
//! formation engine that groups waiting participants into fixed-size teams,
//! trading skill and latency balance against time spent waiting.

pub mod clock;
pub mod config;
pub mod error;
pub mod formation;
pub mod metrics;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DuplicatePolicy, FormationConfig, ScoringWeights};
pub use formation::{form_teams, TeamFormationEngine, TeamScorer, WeightedTeamScorer};
pub use queue::WaitingPool;
pub use service::Matchmaker;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
