//! Farm - wires a coordinator and its workers together for one run

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::channel::connect;
use crate::coordinator::{Coordinator, CoordinatorConfig, FarmReport};
use crate::domain::Problem;
use crate::error::{FarmError, Result};
use crate::events::EventBus;
use crate::protocol::Rank;
use crate::worker::{Worker, WorkerSummary};

/// One integration run: a problem, a pool size and optional event output
pub struct Farm {
    problem: Problem,
    config: CoordinatorConfig,
    events: Option<Arc<EventBus>>,
}

impl Farm {
    pub fn new(problem: Problem, config: CoordinatorConfig) -> Self {
        debug!(workers = config.workers, "Farm::new: called");
        Self {
            problem,
            config,
            events: None,
        }
    }

    /// Emit coordinator events on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Check the run can start at all
    pub fn preflight(&self) -> Result<()> {
        let participants = self.config.participants();
        if participants < 2 {
            return Err(FarmError::InsufficientParticipants { participants });
        }
        self.problem.validate()
    }

    /// Spawn the workers, run the coordinator to completion and join the workers
    ///
    /// A worker that ends before it is stopped fails the whole run; the
    /// coordinator is dropped and the remaining workers are aborted.
    pub async fn run(self) -> Result<FarmReport> {
        self.preflight()?;

        let mut endpoints = connect(self.config.participants(), self.config.mailbox_capacity);
        let coordinator_endpoint = endpoints.remove(0);

        // Each worker gets a watcher that reports how its task ended
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(Rank, WorkerExit)>();
        let mut aborts = Vec::with_capacity(endpoints.len());
        for ep in endpoints {
            let worker = Worker::new(ep, self.problem.integrand.clone(), self.problem.epsilon)
                .with_work_delay(self.config.work_delay());
            let rank = worker.rank();
            let handle = tokio::spawn(worker.run());
            aborts.push(handle.abort_handle());

            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let _ = done_tx.send((rank, handle.await));
            });
        }
        drop(done_tx);

        let mut coordinator = Coordinator::new(coordinator_endpoint, self.problem.interval, self.config.clone());
        if let Some(bus) = self.events.clone() {
            coordinator = coordinator.with_events(bus);
        }
        info!(
            run_id = coordinator.run_id(),
            workers = aborts.len(),
            integrand = self.problem.integrand.name(),
            epsilon = self.problem.epsilon,
            "Farm started"
        );

        let mut summaries = Vec::with_capacity(aborts.len());
        let coordinator_run = coordinator.run();
        tokio::pin!(coordinator_run);

        let outcome = loop {
            tokio::select! {
                result = &mut coordinator_run => break result,

                // Workers only exit cleanly on Stop, which comes during shutdown
                Some((rank, exit)) = done_rx.recv() => {
                    match worker_outcome(rank, exit) {
                        Ok(summary) => summaries.push(summary),
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Farm failed, aborting workers");
                for handle in &aborts {
                    handle.abort();
                }
                return Err(e);
            }
        };

        while let Some((rank, exit)) = done_rx.recv().await {
            summaries.push(worker_outcome(rank, exit)?);
        }

        for summary in &summaries {
            let dispatched = report.tasks_per_rank.get(summary.rank.index()).copied().unwrap_or(0);
            if summary.tasks != dispatched {
                warn!(rank = %summary.rank, handled = summary.tasks, dispatched, "Worker task count mismatch");
            }
        }

        info!(area = report.area, "Farm finished");
        Ok(report)
    }
}

/// How a worker task ended, as seen by its watcher
type WorkerExit = std::result::Result<Result<WorkerSummary>, JoinError>;

fn worker_outcome(rank: Rank, exit: WorkerExit) -> Result<WorkerSummary> {
    match exit {
        Ok(Ok(summary)) => {
            debug!(%rank, tasks = summary.tasks, "worker_outcome: worker stopped");
            Ok(summary)
        }
        Ok(Err(e)) => Err(FarmError::WorkerFailed {
            rank,
            reason: e.to_string(),
        }),
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(FarmError::WorkerFailed {
                rank,
                reason: format!("panicked: {}", message),
            })
        }
        Err(e) => Err(FarmError::WorkerFailed {
            rank,
            reason: e.to_string(),
        }),
    }
}
