//! Final report of a farm run

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scheduler counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FarmStats {
    /// Tasks handed to workers
    pub dispatches: u64,
    /// Split replies received (each added two tasks)
    pub splits: u64,
    /// Result replies received
    pub results: u64,
    /// Tasks ever placed in the bag, the seed included
    pub tasks_created: u64,
    /// Largest bag depth seen
    pub peak_bag_depth: usize,
    /// Envelopes still parked in the coordinator's mailbox at shutdown
    pub deferred_at_shutdown: usize,
    pub elapsed_ms: u64,
}

/// Total area plus the per-process dispatch table
#[derive(Debug, Clone, Serialize)]
pub struct FarmReport {
    pub run_id: String,
    pub area: f64,
    /// Tasks dispatched per rank; rank 0 is the coordinator and always 0
    pub tasks_per_rank: Vec<u64>,
    pub stats: FarmStats,
    pub finished_at: DateTime<Utc>,
}

impl FarmReport {
    /// Dispatch counts of the workers only, slot order
    pub fn tasks_per_worker(&self) -> &[u64] {
        self.tasks_per_rank.get(1..).unwrap_or(&[])
    }

    /// Plain-text rendering: the area, then a rank row and a count row
    pub fn render_text(&self) -> String {
        let ranks: Vec<String> = (0..self.tasks_per_rank.len()).map(|r| r.to_string()).collect();
        let counts: Vec<String> = self.tasks_per_rank.iter().map(|c| c.to_string()).collect();

        let mut out = String::new();
        out.push_str(&format!("Area={:.6}\n", self.area));
        out.push_str("\nTasks Per Process\n");
        out.push_str(&ranks.join("\t"));
        out.push('\n');
        out.push_str(&counts.join("\t"));
        out.push('\n');
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
