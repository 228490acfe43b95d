//! Service layer for the squad-room matchmaking service
//!
//! This module ties the waiting pool to the formation engine and runs
//! formation passes on demand or on a schedule.

pub mod matchmaker;

pub use matchmaker::Matchmaker;
