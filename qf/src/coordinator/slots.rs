//! Worker occupancy table

use serde::Serialize;
use tracing::debug;

use crate::error::{FarmError, Result};
use crate::protocol::Rank;

use super::config::DispatchPolicy;

/// State of one worker as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Idle,
    Busy,
}

/// Idle/busy table plus per-worker dispatch counters
///
/// Slot `i` belongs to worker rank `i + 1`. `idle` is kept in step with the
/// states so that `idle + busy == len` always holds.
#[derive(Debug)]
pub struct WorkerSlots {
    states: Vec<SlotState>,
    dispatched: Vec<u64>,
    idle: usize,
    cursor: usize,
    policy: DispatchPolicy,
}

impl WorkerSlots {
    pub fn new(workers: usize, policy: DispatchPolicy) -> Self {
        debug!(workers, %policy, "WorkerSlots::new: called");
        Self {
            states: vec![SlotState::Idle; workers],
            dispatched: vec![0; workers],
            idle: workers,
            cursor: 0,
            policy,
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle
    }

    pub fn busy_count(&self) -> usize {
        self.states.len() - self.idle
    }

    /// Ranks currently holding a task
    pub fn busy_ranks(&self) -> Vec<Rank> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == SlotState::Busy)
            .map(|(i, _)| Rank(i + 1))
            .collect()
    }

    /// Dispatch count per worker, slot order
    pub fn dispatched(&self) -> &[u64] {
        &self.dispatched
    }

    /// Reset the scan position for a new dispatch phase
    pub fn begin_phase(&mut self) {
        if self.policy == DispatchPolicy::LowestIndex {
            self.cursor = 0;
        }
    }

    /// Next idle worker in scan order, without claiming it
    pub fn next_idle(&mut self) -> Option<Rank> {
        let n = self.states.len();
        if self.idle == 0 || n == 0 {
            return None;
        }
        let found = (0..n)
            .map(|offset| (self.cursor + offset) % n)
            .find(|&i| self.states[i] == SlotState::Idle)?;
        self.cursor = (found + 1) % n;
        Some(Rank(found + 1))
    }

    /// Mark a worker busy and count the dispatch
    pub fn mark_busy(&mut self, rank: Rank) -> Result<()> {
        let i = self.slot(rank)?;
        if self.states[i] == SlotState::Busy {
            return Err(FarmError::SlotBusy(rank));
        }
        self.states[i] = SlotState::Busy;
        self.idle -= 1;
        self.dispatched[i] += 1;
        self.check_occupancy();
        Ok(())
    }

    /// Fail unless `rank` is a worker that currently holds a task
    pub fn ensure_busy(&self, rank: Rank) -> Result<()> {
        let i = self.slot(rank)?;
        match self.states[i] {
            SlotState::Busy => Ok(()),
            SlotState::Idle => Err(FarmError::protocol(rank, "reply from a worker with no task assigned")),
        }
    }

    /// Mark a worker idle after it replied
    pub fn mark_idle(&mut self, rank: Rank) -> Result<()> {
        let i = self.slot(rank)?;
        if self.states[i] == SlotState::Idle {
            return Err(FarmError::protocol(rank, "reply from a worker with no task assigned"));
        }
        self.states[i] = SlotState::Idle;
        self.idle += 1;
        self.check_occupancy();
        Ok(())
    }

    fn slot(&self, rank: Rank) -> Result<usize> {
        if rank.is_coordinator() || rank.index() > self.states.len() {
            return Err(FarmError::protocol(rank, "sender is not a worker"));
        }
        Ok(rank.index() - 1)
    }

    fn check_occupancy(&self) {
        debug_assert_eq!(
            self.states.iter().filter(|s| **s == SlotState::Idle).count(),
            self.idle,
            "idle counter out of step with slot states"
        );
    }
}
