//! Team formation engine
//!
//! This module turns a snapshot of the waiting pool into a sequence of
//! fixed-size teams. Each team is the lowest-scoring combination found within
//! a per-team candidate budget.

pub mod combinations;
pub mod engine;
pub mod ordering;
pub mod scoring;

// Re-export commonly used types
pub use combinations::Combinations;
pub use engine::{form_teams, TeamFormationEngine};
pub use ordering::order_for_formation;
pub use scoring::{TeamScorer, WeightedTeamScorer};
