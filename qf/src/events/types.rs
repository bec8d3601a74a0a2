//! Farm event types

use serde::{Deserialize, Serialize};

use crate::domain::Task;
use crate::protocol::Rank;

/// Everything the coordinator does that changes scheduler state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FarmEvent {
    /// A task left the bag for an idle worker
    Dispatched { worker: Rank, task: Task },

    /// A worker replied with a split; both halves are back in the bag
    SplitReceived { worker: Rank, first: Task, second: Task },

    /// A worker replied with a finished area
    ResultReceived { worker: Rank, area: f64 },

    /// A worker was told to stop
    StopSent { worker: Rank },

    /// The farm finished with this total
    Finished { area: f64 },
}

impl FarmEvent {
    /// Event type as a string, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Dispatched { .. } => "dispatched",
            Self::SplitReceived { .. } => "split_received",
            Self::ResultReceived { .. } => "result_received",
            Self::StopSent { .. } => "stop_sent",
            Self::Finished { .. } => "finished",
        }
    }

    /// Worker this event concerns, if any
    pub fn worker(&self) -> Option<Rank> {
        match self {
            Self::Dispatched { worker, .. }
            | Self::SplitReceived { worker, .. }
            | Self::ResultReceived { worker, .. }
            | Self::StopSent { worker } => Some(*worker),
            Self::Finished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = FarmEvent::Dispatched {
            worker: Rank(2),
            task: Task::new(0.0, 1.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"dispatched\""));
        assert!(json.contains("\"worker\":2"));

        let back: FarmEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_worker() {
        assert_eq!(FarmEvent::StopSent { worker: Rank(1) }.worker(), Some(Rank(1)));
        assert_eq!(FarmEvent::Finished { area: 1.0 }.worker(), None);
        assert_eq!(FarmEvent::Finished { area: 1.0 }.event_type(), "finished");
    }
}
