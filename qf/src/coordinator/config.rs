//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How the dispatch phase picks the next idle worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// The scan resumes after the last slot filled, across dispatch phases
    #[default]
    RoundRobin,

    /// Every dispatch phase scans from slot 0, favoring low ranks
    LowestIndex,
}

impl std::fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round-robin"),
            Self::LowestIndex => write!(f, "lowest-index"),
        }
    }
}

impl std::str::FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "DispatchPolicy::from_str: called");
        match s.to_lowercase().as_str() {
            "round-robin" | "roundrobin" | "rr" => Ok(Self::RoundRobin),
            "lowest-index" | "lowest" | "low" => Ok(Self::LowestIndex),
            _ => Err(format!("Unknown dispatch policy: {}. Use: round-robin or lowest-index", s)),
        }
    }
}

/// Farm configuration: pool size and coordinator behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Number of worker tasks (participants minus the coordinator)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Idle-slot scan order
    #[serde(default, rename = "dispatch-policy")]
    pub dispatch_policy: DispatchPolicy,

    /// Simulated work per task in microseconds (0 disables)
    #[serde(default, rename = "work-delay-us")]
    pub work_delay_us: u64,

    /// Give up on busy workers after this many milliseconds without a reply
    #[serde(default, rename = "recv-timeout-ms")]
    pub recv_timeout_ms: Option<u64>,

    /// Buffered envelopes per mailbox
    #[serde(default = "default_mailbox_capacity", rename = "mailbox-capacity")]
    pub mailbox_capacity: usize,
}

fn default_workers() -> usize {
    debug!("default_workers: called");
    4
}

fn default_mailbox_capacity() -> usize {
    debug!("default_mailbox_capacity: called");
    64
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            workers: 4,
            dispatch_policy: DispatchPolicy::RoundRobin,
            work_delay_us: 0,
            recv_timeout_ms: None,
            mailbox_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    /// Config for `workers` workers with everything else defaulted
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    /// Total participants, coordinator included
    pub fn participants(&self) -> usize {
        self.workers + 1
    }

    pub fn work_delay(&self) -> Duration {
        Duration::from_micros(self.work_delay_us)
    }

    pub fn recv_timeout(&self) -> Option<Duration> {
        debug!(recv_timeout_ms = ?self.recv_timeout_ms, "CoordinatorConfig::recv_timeout: called");
        self.recv_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.participants(), 5);
        assert_eq!(config.dispatch_policy, DispatchPolicy::RoundRobin);
        assert_eq!(config.work_delay(), Duration::ZERO);
        assert_eq!(config.recv_timeout(), None);
        assert_eq!(config.mailbox_capacity, 64);
    }

    #[test]
    fn test_recv_timeout_duration() {
        let config = CoordinatorConfig {
            recv_timeout_ms: Some(250),
            ..Default::default()
        };
        assert_eq!(config.recv_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("round-robin".parse::<DispatchPolicy>(), Ok(DispatchPolicy::RoundRobin));
        assert_eq!("Lowest-Index".parse::<DispatchPolicy>(), Ok(DispatchPolicy::LowestIndex));
        assert!("random".parse::<DispatchPolicy>().is_err());
        assert_eq!(DispatchPolicy::LowestIndex.to_string(), "lowest-index");
    }

    #[test]
    fn test_yaml_defaults() {
        let config: CoordinatorConfig = serde_yaml::from_str("workers: 2\n").unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.dispatch_policy, DispatchPolicy::RoundRobin);

        let config: CoordinatorConfig =
            serde_yaml::from_str("dispatch-policy: lowest-index\nrecv-timeout-ms: 1000\n").unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.dispatch_policy, DispatchPolicy::LowestIndex);
        assert_eq!(config.recv_timeout_ms, Some(1000));
    }
}
