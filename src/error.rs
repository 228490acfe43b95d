//! Error types for the team-formation service
//!
//! Propagation uses anyhow; the variants below cover the conditions a caller
//! may want to match on after downcasting.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Duplicate participant identity in snapshot: {participant_id}")]
    DuplicateIdentity { participant_id: String },
}

impl MatchmakingError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
