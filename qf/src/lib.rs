//! QuadFarm - adaptive quadrature on a task farm
//!
//! A coordinator splits an integration interval into tasks and farms them out
//! to a fixed pool of workers. Each worker compares a one-trapezoid and a
//! two-trapezoid estimate of its interval: if they disagree by more than
//! epsilon it hands back both halves, otherwise it hands back the area. The
//! run ends when no task is pending and every worker is idle.
//!
//! # Core Concepts
//!
//! - **No Shared Memory**: coordinator and workers are separate tokio tasks talking over channels
//! - **Rendezvous Messaging**: a send completes only once the receiver has matched it
//! - **LIFO Bag**: the freshest split is dispatched first
//! - **Centralized Termination**: the coordinator sees all state and simply checks it
//!
//! # Modules
//!
//! - [`protocol`] - Message types and receive selectors
//! - [`channel`] - Rendezvous endpoints with selective receive
//! - [`coordinator`] - Dispatch/collect loop, occupancy table, report
//! - [`worker`] - Subdivision decision and worker loop
//! - [`farm`] - Spawns and joins one complete run
//! - [`events`] - Scheduling event bus
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod channel;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod events;
pub mod farm;
pub mod protocol;
pub mod worker;

// Re-export commonly used types
pub use config::{Config, IntegrationConfig};
pub use coordinator::{
    Coordinator, CoordinatorConfig, DispatchPolicy, FarmReport, FarmStats, SlotState, WorkerSlots, is_finished,
};
pub use domain::{Integrand, IntegrandSpec, Problem, Task, TaskBag};
pub use error::{FarmError, Result};
pub use events::{EventBus, FarmEvent};
pub use farm::Farm;
pub use protocol::{Envelope, Message, MessageKind, Rank, Selector};
pub use worker::{Decision, Estimate, Worker, WorkerSummary, evaluate};
