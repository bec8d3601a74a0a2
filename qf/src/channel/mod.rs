//! Point-to-point rendezvous channels between farm participants
//!
//! [`connect`] builds a fully connected network of endpoints, one per rank.
//! Each endpoint owns a mailbox that supports selective receive by sender
//! and/or message kind. Messages from one sender to one receiver arrive in
//! send order.

mod endpoint;
mod mailbox;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::Rank;

pub use endpoint::Endpoint;
pub use mailbox::Mailbox;

/// Create endpoints for `participants` ranks, indexed by rank
pub fn connect(participants: usize, mailbox_capacity: usize) -> Vec<Endpoint> {
    debug!(participants, mailbox_capacity, "connect: called");
    let capacity = mailbox_capacity.max(1);

    let (senders, receivers): (Vec<_>, Vec<_>) = (0..participants).map(|_| mpsc::channel(capacity)).unzip();
    let peers = Arc::new(senders);

    receivers
        .into_iter()
        .enumerate()
        .map(|(i, rx)| Endpoint::new(Rank(i), Mailbox::new(Rank(i), rx), peers.clone()))
        .collect()
}
