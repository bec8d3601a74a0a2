//! Coordinator (farmer) for the worker pool
//!
//! The Coordinator runs a single-threaded dispatch/collect loop:
//! - **Dispatch:** pop tasks from the LIFO bag onto idle workers
//! - **Collect:** block for one reply; fold a result into the total or push both halves of a split
//! - **Terminate:** once the bag is empty and every worker is idle, stop all workers

mod config;
mod core;
mod report;
mod slots;

pub use config::{CoordinatorConfig, DispatchPolicy};
pub use core::{Coordinator, is_finished};
pub use report::{FarmReport, FarmStats};
pub use slots::{SlotState, WorkerSlots};
