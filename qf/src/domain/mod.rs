//! Domain types: subintervals, the task bag, integrands and the problem definition

mod integrand;
mod problem;
mod task;

pub use integrand::{Integrand, IntegrandSpec};
pub use problem::Problem;
pub use task::{Task, TaskBag};
