//! Endpoint - one participant's view of the farm network

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{FarmError, Result};
use crate::protocol::{Envelope, Message, Rank, Selector};

use super::mailbox::Mailbox;

/// Rendezvous send and selective receive for a single rank
///
/// Every send blocks until the destination has matched the message with a
/// receive, mirroring a synchronous-mode send.
pub struct Endpoint {
    rank: Rank,
    mailbox: Mailbox,
    peers: Arc<Vec<mpsc::Sender<Envelope>>>,
}

impl Endpoint {
    pub(crate) fn new(rank: Rank, mailbox: Mailbox, peers: Arc<Vec<mpsc::Sender<Envelope>>>) -> Self {
        Self { rank, mailbox, peers }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Total participants on the network, this one included
    pub fn participants(&self) -> usize {
        self.peers.len()
    }

    /// Send `message` to `dest` and wait until it has been received
    pub async fn send(&self, dest: Rank, message: Message) -> Result<()> {
        debug!(from = %self.rank, to = %dest, kind = %message.kind(), "Endpoint::send: called");
        let tx = self.peers.get(dest.index()).ok_or(FarmError::UnknownRank(dest))?;
        let (ack_tx, ack_rx) = oneshot::channel();

        tx.send(Envelope::new(self.rank, message, ack_tx))
            .await
            .map_err(|_| FarmError::ChannelClosed(dest))?;

        ack_rx.await.map_err(|_| FarmError::ChannelClosed(dest))
    }

    /// Block until a message matching `selector` arrives
    pub async fn recv(&mut self, selector: Selector) -> Result<Envelope> {
        self.mailbox.recv(selector).await
    }

    /// Like [`Endpoint::recv`], giving up with [`FarmError::Timeout`] after `timeout`
    pub async fn recv_timeout(&mut self, selector: Selector, timeout: Duration) -> Result<Envelope> {
        tokio::time::timeout(timeout, self.mailbox.recv(selector))
            .await
            .map_err(|_| FarmError::Timeout(timeout))?
    }

    /// Envelopes parked by earlier selective receives
    pub fn deferred(&self) -> usize {
        self.mailbox.deferred()
    }
}
