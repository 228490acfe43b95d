//! Configuration management for the squad-room service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for team formation.

pub mod app;
pub mod formation;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use formation::{DuplicatePolicy, FormationConfig, ScoringWeights};
