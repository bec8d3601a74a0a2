//! Message types exchanged between the coordinator and its workers

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::domain::Task;

/// Address of a participant; rank 0 is the coordinator, workers are 1..=N
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub usize);

impl Rank {
    pub const COORDINATOR: Rank = Rank(0);

    pub fn index(&self) -> usize {
        self.0
    }

    pub fn is_coordinator(&self) -> bool {
        *self == Self::COORDINATOR
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages carried by the farm's channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Message {
    /// Coordinator -> worker: evaluate this interval
    DoWork { left: f64, right: f64 },

    /// Worker -> coordinator: one child of a split, always sent in a pair
    SplitTask { left: f64, right: f64 },

    /// Worker -> coordinator: finished partial area
    Result { area: f64 },

    /// Coordinator -> worker: no more tasks
    Stop,
}

impl Message {
    pub fn do_work(task: Task) -> Self {
        Self::DoWork {
            left: task.left,
            right: task.right,
        }
    }

    pub fn split_task(task: Task) -> Self {
        Self::SplitTask {
            left: task.left,
            right: task.right,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::DoWork { .. } => MessageKind::DoWork,
            Self::SplitTask { .. } => MessageKind::SplitTask,
            Self::Result { .. } => MessageKind::Result,
            Self::Stop => MessageKind::Stop,
        }
    }

    /// The interval carried by a `DoWork` or `SplitTask`
    pub fn task(&self) -> Option<Task> {
        match *self {
            Self::DoWork { left, right } | Self::SplitTask { left, right } => Some(Task::new(left, right)),
            Self::Result { .. } | Self::Stop => None,
        }
    }
}

/// Message kind, used as a receive filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    DoWork,
    SplitTask,
    Result,
    Stop,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoWork => write!(f, "do-work"),
            Self::SplitTask => write!(f, "split-task"),
            Self::Result => write!(f, "result"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// A message in flight, tagged with its sender
///
/// The sender stays blocked until the receiver matches the envelope, which
/// fires the acknowledgement.
#[derive(Debug)]
pub struct Envelope {
    pub from: Rank,
    pub message: Message,
    ack: Option<oneshot::Sender<()>>,
}

impl Envelope {
    pub(crate) fn new(from: Rank, message: Message, ack: oneshot::Sender<()>) -> Self {
        Self {
            from,
            message,
            ack: Some(ack),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    /// Release the blocked sender
    pub(crate) fn acknowledge(&mut self) {
        if let Some(ack) = self.ack.take() {
            // Sender may have given up waiting
            let _ = ack.send(());
        }
    }
}

/// Receive filter: `None` on either field is a wildcard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selector {
    pub source: Option<Rank>,
    pub kind: Option<MessageKind>,
}

impl Selector {
    /// Any sender, any kind
    pub fn any() -> Self {
        Self::default()
    }

    /// A specific sender, any kind
    pub fn from(source: Rank) -> Self {
        Self {
            source: Some(source),
            kind: None,
        }
    }

    /// Narrow this selector to one message kind
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, envelope: &Envelope) -> bool {
        self.source.is_none_or(|source| source == envelope.from) && self.kind.is_none_or(|kind| kind == envelope.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(from: usize, message: Message) -> Envelope {
        let (ack, _rx) = oneshot::channel();
        Envelope::new(Rank(from), message, ack)
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::SplitTask { left: 0.0, right: 2.5 };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"split-task\""));

        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);

        let stop: Message = serde_json::from_str(r#"{"kind":"stop"}"#).unwrap();
        assert_eq!(stop, Message::Stop);
    }

    #[test]
    fn test_message_kind_and_task() {
        let msg = Message::do_work(Task::new(1.0, 3.0));
        assert_eq!(msg.kind(), MessageKind::DoWork);
        assert_eq!(msg.task(), Some(Task::new(1.0, 3.0)));

        let msg = Message::Result { area: 4.0 };
        assert_eq!(msg.kind(), MessageKind::Result);
        assert_eq!(msg.task(), None);
    }

    #[test]
    fn test_selector_wildcards() {
        let env = envelope(2, Message::Result { area: 1.0 });

        assert!(Selector::any().matches(&env));
        assert!(Selector::from(Rank(2)).matches(&env));
        assert!(!Selector::from(Rank(1)).matches(&env));
        assert!(Selector::any().with_kind(MessageKind::Result).matches(&env));
        assert!(!Selector::from(Rank(2)).with_kind(MessageKind::SplitTask).matches(&env));
    }

    #[tokio::test]
    async fn test_acknowledge_releases_sender() {
        let (ack, rx) = oneshot::channel();
        let mut env = Envelope::new(Rank(1), Message::Stop, ack);
        env.acknowledge();
        assert!(rx.await.is_ok());

        // A second acknowledge is a no-op
        env.acknowledge();
    }
}
