//! Worker task implementation

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::channel::Endpoint;
use crate::domain::{Integrand, Task};
use crate::error::{FarmError, Result};
use crate::protocol::{Message, Rank, Selector};

use super::decision::{Decision, evaluate};

/// What a worker did before it was stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub rank: Rank,
    pub tasks: u64,
    pub splits: u64,
    pub results: u64,
}

/// A worker evaluates one interval at a time and reports back to the coordinator
pub struct Worker {
    endpoint: Endpoint,
    integrand: Integrand,
    epsilon: f64,
    work_delay: Duration,
}

impl Worker {
    pub fn new(endpoint: Endpoint, integrand: Integrand, epsilon: f64) -> Self {
        Self {
            endpoint,
            integrand,
            epsilon,
            work_delay: Duration::ZERO,
        }
    }

    /// Pause for `delay` on every task to simulate a heavier integrand
    pub fn with_work_delay(mut self, delay: Duration) -> Self {
        self.work_delay = delay;
        self
    }

    pub fn rank(&self) -> Rank {
        self.endpoint.rank()
    }

    /// Run the Worker task
    ///
    /// This consumes the Worker and runs until the coordinator sends `Stop`.
    pub async fn run(mut self) -> Result<WorkerSummary> {
        let rank = self.endpoint.rank();
        let mut summary = WorkerSummary {
            rank,
            tasks: 0,
            splits: 0,
            results: 0,
        };
        debug!(%rank, integrand = self.integrand.name(), epsilon = self.epsilon, "Worker started");

        loop {
            let env = self.endpoint.recv(Selector::from(Rank::COORDINATOR)).await?;

            let task = match env.message {
                Message::Stop => break,
                Message::DoWork { left, right } => Task::new(left, right),
                other => {
                    return Err(FarmError::protocol(
                        env.from,
                        format!("worker cannot handle a {} message", other.kind()),
                    ));
                }
            };
            summary.tasks += 1;

            if !self.work_delay.is_zero() {
                tokio::time::sleep(self.work_delay).await;
            }

            match evaluate(task, &self.integrand, self.epsilon) {
                Decision::Split(first, second) => {
                    debug!(%rank, %task, "Splitting task");
                    self.endpoint.send(Rank::COORDINATOR, Message::split_task(first)).await?;
                    self.endpoint.send(Rank::COORDINATOR, Message::split_task(second)).await?;
                    summary.splits += 1;
                }
                Decision::Accept { area } => {
                    debug!(%rank, %task, area, "Task converged");
                    self.endpoint.send(Rank::COORDINATOR, Message::Result { area }).await?;
                    summary.results += 1;
                }
            }
        }

        info!(%rank, tasks = summary.tasks, "Worker stopped");
        Ok(summary)
    }
}
