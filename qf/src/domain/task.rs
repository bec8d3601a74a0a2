//! Integration subintervals and the bag that holds pending ones

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One integration subinterval `[left, right]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub left: f64,
    pub right: f64,
}

impl Task {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Build a task only if both bounds are finite and ordered
    pub fn checked(left: f64, right: f64) -> Option<Self> {
        if left.is_finite() && right.is_finite() && left <= right {
            Some(Self { left, right })
        } else {
            None
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn midpoint(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Split into the two halves `[left, mid]` and `[mid, right]`
    pub fn split(&self) -> (Task, Task) {
        let mid = self.midpoint();
        (Task::new(self.left, mid), Task::new(mid, self.right))
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

/// LIFO bag of pending tasks
///
/// The most recently pushed task is the next one popped, so the two halves of
/// a split are processed before older, wider intervals.
#[derive(Debug, Default)]
pub struct TaskBag {
    tasks: Vec<Task>,
    pushed: u64,
    popped: u64,
}

impl TaskBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task) {
        debug!(%task, depth = self.tasks.len() + 1, "TaskBag::push");
        self.tasks.push(task);
        self.pushed += 1;
    }

    pub fn pop(&mut self) -> Option<Task> {
        let task = self.tasks.pop();
        if task.is_some() {
            self.popped += 1;
        }
        task
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Total tasks ever pushed
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// Total tasks ever popped
    pub fn total_popped(&self) -> u64 {
        self.popped
    }
}
