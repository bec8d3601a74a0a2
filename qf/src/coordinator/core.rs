//! Main Coordinator task implementation

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::Endpoint;
use crate::domain::{Task, TaskBag};
use crate::error::{FarmError, Result};
use crate::events::{EventBus, FarmEvent};
use crate::protocol::{Envelope, Message, MessageKind, Rank, Selector};

use super::config::CoordinatorConfig;
use super::report::{FarmReport, FarmStats};
use super::slots::WorkerSlots;

/// True once there is nothing left to hand out and nobody is working
pub fn is_finished(bag_empty: bool, idle: usize, workers: usize) -> bool {
    bag_empty && idle == workers
}

/// Everything the coordinator mutates while the loop runs
struct FarmState {
    bag: TaskBag,
    slots: WorkerSlots,
    area: f64,
    stats: FarmStats,
}

/// The Coordinator owns the task bag and the occupancy table and farms tasks
/// out to workers until the whole interval has been integrated
pub struct Coordinator {
    endpoint: Endpoint,
    interval: Task,
    config: CoordinatorConfig,
    events: Option<Arc<EventBus>>,
    run_id: String,
}

impl Coordinator {
    /// Create a Coordinator that will integrate over `interval`
    pub fn new(endpoint: Endpoint, interval: Task, config: CoordinatorConfig) -> Self {
        Self {
            endpoint,
            interval,
            config,
            events: None,
            run_id: Uuid::now_v7().to_string(),
        }
    }

    /// Emit scheduling events on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run the Coordinator task
    ///
    /// This consumes the Coordinator, drives the dispatch/collect loop to
    /// completion, stops every worker and returns the report.
    pub async fn run(mut self) -> Result<FarmReport> {
        let participants = self.endpoint.participants();
        if participants < 2 {
            return Err(FarmError::InsufficientParticipants { participants });
        }
        let workers = participants - 1;
        if workers != self.config.workers {
            warn!(
                configured = self.config.workers,
                connected = workers,
                "Worker count differs from config, using connected endpoints"
            );
        }

        info!(
            run_id = %self.run_id,
            workers,
            interval = %self.interval,
            policy = %self.config.dispatch_policy,
            "Coordinator started"
        );
        let started = Instant::now();

        let mut state = FarmState {
            bag: TaskBag::new(),
            slots: WorkerSlots::new(workers, self.config.dispatch_policy),
            area: 0.0,
            stats: FarmStats::default(),
        };
        state.bag.push(self.interval);
        state.stats.peak_bag_depth = 1;

        while !is_finished(state.bag.is_empty(), state.slots.idle_count(), workers) {
            self.dispatch(&mut state).await?;
            self.collect(&mut state).await?;
        }

        self.shutdown(workers).await?;

        debug_assert_eq!(state.stats.dispatches, state.bag.total_popped());
        state.stats.tasks_created = state.bag.total_pushed();
        state.stats.deferred_at_shutdown = self.endpoint.deferred();
        state.stats.elapsed_ms = started.elapsed().as_millis() as u64;

        let mut tasks_per_rank = Vec::with_capacity(participants);
        tasks_per_rank.push(0);
        tasks_per_rank.extend_from_slice(state.slots.dispatched());

        self.emit(FarmEvent::Finished { area: state.area });
        info!(
            run_id = %self.run_id,
            area = state.area,
            dispatches = state.stats.dispatches,
            splits = state.stats.splits,
            elapsed_ms = state.stats.elapsed_ms,
            "Coordinator stopped"
        );

        Ok(FarmReport {
            run_id: self.run_id,
            area: state.area,
            tasks_per_rank,
            stats: state.stats,
            finished_at: Utc::now(),
        })
    }

    /// Hand pending tasks to idle workers until one side runs out
    async fn dispatch(&self, state: &mut FarmState) -> Result<()> {
        state.slots.begin_phase();

        while !state.bag.is_empty() {
            let Some(worker) = state.slots.next_idle() else {
                break;
            };
            let Some(task) = state.bag.pop() else {
                break;
            };

            state.slots.mark_busy(worker)?;
            self.endpoint.send(worker, Message::do_work(task)).await?;
            state.stats.dispatches += 1;

            debug!(%worker, %task, pending = state.bag.len(), busy = state.slots.busy_count(), "Dispatched task");
            self.emit(FarmEvent::Dispatched { worker, task });
        }

        Ok(())
    }

    /// Block for one reply and fold it into the farm state
    async fn collect(&mut self, state: &mut FarmState) -> Result<()> {
        let env = self.receive(Selector::any(), &state.slots).await?;
        let from = env.from;
        state.slots.ensure_busy(from)?;

        match env.message {
            Message::Result { area } => {
                if !area.is_finite() {
                    return Err(FarmError::protocol(from, format!("non-finite area {}", area)));
                }
                state.area += area;
                state.stats.results += 1;

                debug!(worker = %from, area, total = state.area, "Received result");
                self.emit(FarmEvent::ResultReceived { worker: from, area });
            }

            Message::SplitTask { left, right } => {
                let first = checked_task(from, left, right)?;
                state.bag.push(first);

                // The second half always follows from the same worker
                let pair = self
                    .receive(Selector::from(from).with_kind(MessageKind::SplitTask), &state.slots)
                    .await?;
                let second = match pair.message {
                    Message::SplitTask { left, right } => checked_task(from, left, right)?,
                    other => {
                        return Err(FarmError::protocol(
                            from,
                            format!("expected second split-task, got {}", other.kind()),
                        ));
                    }
                };
                state.bag.push(second);
                state.stats.splits += 1;
                state.stats.peak_bag_depth = state.stats.peak_bag_depth.max(state.bag.len());

                debug!(worker = %from, %first, %second, pending = state.bag.len(), "Received split");
                self.emit(FarmEvent::SplitReceived {
                    worker: from,
                    first,
                    second,
                });
            }

            other => {
                return Err(FarmError::protocol(
                    from,
                    format!("coordinator cannot handle a {} message", other.kind()),
                ));
            }
        }

        state.slots.mark_idle(from)
    }

    /// Receive, turning a configured timeout into `WorkerUnresponsive`
    async fn receive(&mut self, selector: Selector, slots: &WorkerSlots) -> Result<Envelope> {
        match self.config.recv_timeout() {
            Some(timeout) => self
                .endpoint
                .recv_timeout(selector, timeout)
                .await
                .map_err(|e| match e {
                    FarmError::Timeout(timeout) => {
                        let busy = slots.busy_ranks();
                        warn!(?busy, ?timeout, "Workers unresponsive");
                        FarmError::WorkerUnresponsive { busy, timeout }
                    }
                    other => other,
                }),
            None => self.endpoint.recv(selector).await,
        }
    }

    /// Tell every worker there is no more work
    async fn shutdown(&self, workers: usize) -> Result<()> {
        info!(workers, "Stopping workers");
        for rank in 1..=workers {
            let worker = Rank(rank);
            self.endpoint.send(worker, Message::Stop).await?;
            self.emit(FarmEvent::StopSent { worker });
        }
        Ok(())
    }

    fn emit(&self, event: FarmEvent) {
        if let Some(ref bus) = self.events {
            bus.emit(event);
        }
    }
}

fn checked_task(from: Rank, left: f64, right: f64) -> Result<Task> {
    Task::checked(left, right).ok_or_else(|| FarmError::protocol(from, format!("malformed interval [{}, {}]", left, right)))
}
