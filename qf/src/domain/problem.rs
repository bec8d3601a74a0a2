//! The fixed parameters of one integration run

use tracing::debug;

use crate::error::{FarmError, Result};

use super::{Integrand, Task};

/// Interval, tolerance and integrand shared read-only by every participant
#[derive(Debug, Clone)]
pub struct Problem {
    pub interval: Task,
    pub epsilon: f64,
    pub integrand: Integrand,
}

impl Problem {
    pub fn new(a: f64, b: f64, epsilon: f64, integrand: Integrand) -> Self {
        Self {
            interval: Task::new(a, b),
            epsilon,
            integrand,
        }
    }

    /// Reject bounds and tolerances the workers cannot converge on
    pub fn validate(&self) -> Result<()> {
        debug!(interval = %self.interval, epsilon = self.epsilon, "Problem::validate: called");
        if Task::checked(self.interval.left, self.interval.right).is_none() {
            return Err(FarmError::InvalidConfig(format!(
                "integration bounds {} must be finite with a <= b",
                self.interval
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(FarmError::InvalidConfig(format!(
                "epsilon must be a positive finite number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one() -> Integrand {
        Integrand::new("one", |_| 1.0)
    }

    #[test]
    fn test_valid_problem() {
        assert!(Problem::new(0.0, 10.0, 1e-3, one()).validate().is_ok());
    }

    #[test]
    fn test_reversed_bounds_rejected() {
        let err = Problem::new(5.0, 0.0, 1e-3, one()).validate().unwrap_err();
        assert!(matches!(err, FarmError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_positive_epsilon_rejected() {
        assert!(Problem::new(0.0, 1.0, 0.0, one()).validate().is_err());
        assert!(Problem::new(0.0, 1.0, -1.0, one()).validate().is_err());
        assert!(Problem::new(0.0, 1.0, f64::NAN, one()).validate().is_err());
    }
}
