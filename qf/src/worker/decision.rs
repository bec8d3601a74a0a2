//! Adaptive-subdivision decision

use crate::domain::{Integrand, Task};

/// Trapezoid estimates over one interval and its two halves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub whole: f64,
    pub left_half: f64,
    pub right_half: f64,
}

impl Estimate {
    pub fn compute(task: Task, f: &Integrand) -> Self {
        let Task { left, right } = task;
        let mid = task.midpoint();
        let f_left = f.eval(left);
        let f_right = f.eval(right);
        let f_mid = f.eval(mid);

        Self {
            whole: (f_left + f_right) * task.width() / 2.0,
            left_half: (f_left + f_mid) * (mid - left) / 2.0,
            right_half: (f_mid + f_right) * (right - mid) / 2.0,
        }
    }

    /// Area of the two-half estimate
    pub fn refined(&self) -> f64 {
        self.left_half + self.right_half
    }

    /// Disagreement between the one- and two-trapezoid estimates
    pub fn error(&self) -> f64 {
        (self.refined() - self.whole).abs()
    }
}

/// What a worker replies with for one task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Not accurate yet: evaluate `[left, mid]` and `[mid, right]` separately
    Split(Task, Task),

    /// Accurate enough: contribute this area
    Accept { area: f64 },
}

/// Decide whether `task` needs another split
///
/// Pure: the result depends only on the arguments.
pub fn evaluate(task: Task, f: &Integrand, epsilon: f64) -> Decision {
    let estimate = Estimate::compute(task, f);
    if estimate.error() > epsilon {
        let (first, second) = task.split();
        Decision::Split(first, second)
    } else {
        Decision::Accept {
            area: estimate.refined(),
        }
    }
}
