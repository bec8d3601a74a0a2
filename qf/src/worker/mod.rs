//! Worker side of the farm
//!
//! A worker is stateless between tasks: each interval is judged on its own by
//! [`evaluate`], and the answer goes straight back to the coordinator.

mod core;
mod decision;

pub use core::{Worker, WorkerSummary};
pub use decision::{Decision, Estimate, evaluate};
