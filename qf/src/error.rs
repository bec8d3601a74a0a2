//! Error types for the task farm

use std::time::Duration;
use thiserror::Error;

use crate::protocol::Rank;

/// Errors that can occur while setting up or running a farm
#[derive(Debug, Error)]
pub enum FarmError {
    #[error("Must have at least 2 participants to run, got {participants}")]
    InsufficientParticipants { participants: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Protocol violation from rank {from}: {reason}")]
    ProtocolViolation { from: Rank, reason: String },

    #[error("Workers {busy:?} unresponsive after {timeout:?}")]
    WorkerUnresponsive { busy: Vec<Rank>, timeout: Duration },

    #[error("No message matched within {0:?}")]
    Timeout(Duration),

    #[error("Channel to rank {0} closed")]
    ChannelClosed(Rank),

    #[error("Unknown rank {0}")]
    UnknownRank(Rank),

    #[error("Slot for rank {0} is already busy")]
    SlotBusy(Rank),

    #[error("Worker {rank} failed: {reason}")]
    WorkerFailed { rank: Rank, reason: String },
}

impl FarmError {
    /// Build a protocol violation for a given sender
    pub fn protocol(from: Rank, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            from,
            reason: reason.into(),
        }
    }

    /// Check if this error was raised before any work was dispatched
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::InsufficientParticipants { .. } | Self::InvalidConfig(_))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, FarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_participants_message() {
        let err = FarmError::InsufficientParticipants { participants: 1 };
        assert_eq!(err.to_string(), "Must have at least 2 participants to run, got 1");
        assert!(err.is_preflight());
    }

    #[test]
    fn test_protocol_helper() {
        let err = FarmError::protocol(Rank(3), "unexpected stop message");
        assert!(matches!(err, FarmError::ProtocolViolation { from: Rank(3), .. }));
        assert!(err.to_string().contains("unexpected stop message"));
        assert!(!err.is_preflight());
    }
}
