//! Selective-receive mailbox

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{FarmError, Result};
use crate::protocol::{Envelope, Rank, Selector};

/// Inbound side of one participant's channel
///
/// Envelopes that arrive while a narrower selector is active are parked in
/// the stash, in arrival order, and offered again to later receives.
pub struct Mailbox {
    rank: Rank,
    rx: mpsc::Receiver<Envelope>,
    stash: VecDeque<Envelope>,
}

impl Mailbox {
    pub(crate) fn new(rank: Rank, rx: mpsc::Receiver<Envelope>) -> Self {
        Self {
            rank,
            rx,
            stash: VecDeque::new(),
        }
    }

    /// Block until an envelope matching `selector` arrives
    ///
    /// Cancel-safe: dropping the future loses no envelopes.
    pub async fn recv(&mut self, selector: Selector) -> Result<Envelope> {
        if let Some(pos) = self.stash.iter().position(|env| selector.matches(env))
            && let Some(mut env) = self.stash.remove(pos)
        {
            debug!(rank = %self.rank, from = %env.from, kind = %env.kind(), "Mailbox::recv: matched stashed envelope");
            env.acknowledge();
            return Ok(env);
        }

        loop {
            let mut env = self.rx.recv().await.ok_or(FarmError::ChannelClosed(self.rank))?;
            if selector.matches(&env) {
                env.acknowledge();
                return Ok(env);
            }
            debug!(
                rank = %self.rank,
                from = %env.from,
                kind = %env.kind(),
                ?selector,
                "Mailbox::recv: deferring envelope"
            );
            self.stash.push_back(env);
        }
    }

    /// Number of envelopes received but not yet matched
    pub fn deferred(&self) -> usize {
        self.stash.len()
    }
}
