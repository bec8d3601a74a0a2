//! Integration tests for QuadFarm
//!
//! These tests run complete farms and check the scheduler's behavior through
//! the reports and the event stream.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use quadfarm::coordinator::{CoordinatorConfig, DispatchPolicy};
use quadfarm::domain::{Integrand, IntegrandSpec, Problem, Task};
use quadfarm::events::{EventBus, FarmEvent, drain};
use quadfarm::farm::Farm;
use quadfarm::protocol::Rank;
use quadfarm::{FarmError, FarmReport};

async fn run_traced(problem: Problem, config: CoordinatorConfig) -> (FarmReport, Vec<FarmEvent>) {
    let bus = Arc::new(EventBus::with_default_capacity());
    let mut rx = bus.subscribe();

    let report = tokio::time::timeout(Duration::from_secs(30), Farm::new(problem, config).with_events(bus).run())
        .await
        .expect("farm should finish")
        .expect("farm should succeed");

    (report, drain(&mut rx))
}

fn square_problem() -> Problem {
    Problem::new(0.0, 2.0, 1e-6, Integrand::new("square", |x| x * x))
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_constant_integrand_never_splits() {
    let problem = Problem::new(0.0, 10.0, 1.0, Integrand::new("one", |_| 1.0));
    let (report, events) = run_traced(problem, CoordinatorConfig::with_workers(4)).await;

    assert_eq!(report.area, 10.0);
    assert_eq!(report.stats.dispatches, 1);
    assert_eq!(report.stats.splits, 0);
    assert_eq!(report.stats.results, 1);
    assert_eq!(report.tasks_per_worker().iter().filter(|&&c| c == 1).count(), 1);
    assert_eq!(report.tasks_per_worker().iter().sum::<u64>(), 1);

    let dispatched: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, FarmEvent::Dispatched { .. }))
        .collect();
    assert_eq!(dispatched.len(), 1);
}

#[tokio::test]
async fn test_square_converges_to_eight_thirds() {
    let (report, _) = run_traced(square_problem(), CoordinatorConfig::with_workers(4)).await;

    assert!((report.area - 8.0 / 3.0).abs() < 1e-4, "area was {}", report.area);
    assert!(report.stats.splits > 1);
    assert_eq!(report.tasks_per_worker().iter().sum::<u64>(), report.stats.dispatches);
}

#[tokio::test]
async fn test_single_worker_lifecycle() {
    let problem = Problem::new(0.0, 10.0, 1.0, Integrand::new("one", |_| 1.0));
    let (report, events) = run_traced(problem, CoordinatorConfig::with_workers(1)).await;

    assert_eq!(report.tasks_per_rank, vec![0, 1]);
    assert_eq!(
        events,
        vec![
            FarmEvent::Dispatched {
                worker: Rank(1),
                task: Task::new(0.0, 10.0),
            },
            FarmEvent::ResultReceived {
                worker: Rank(1),
                area: 10.0,
            },
            FarmEvent::StopSent { worker: Rank(1) },
            FarmEvent::Finished { area: 10.0 },
        ]
    );
}

#[tokio::test]
async fn test_never_dispatches_to_busy_worker() {
    let (report, events) = run_traced(square_problem(), CoordinatorConfig::with_workers(4)).await;
    assert!(report.stats.splits >= 3);

    let mut busy: HashSet<Rank> = HashSet::new();
    for event in &events {
        match event {
            FarmEvent::Dispatched { worker, .. } => {
                assert!(busy.insert(*worker), "dispatched to busy worker {}", worker);
                assert!(busy.len() <= 4);
            }
            FarmEvent::SplitReceived { worker, .. } | FarmEvent::ResultReceived { worker, .. } => {
                assert!(busy.remove(worker), "reply from idle worker {}", worker);
            }
            FarmEvent::StopSent { .. } => assert!(busy.is_empty()),
            FarmEvent::Finished { .. } => {}
        }
    }
    assert!(busy.is_empty());
}

// =============================================================================
// Scheduler properties
// =============================================================================

#[tokio::test]
async fn test_task_conservation() {
    let (report, events) = run_traced(square_problem(), CoordinatorConfig::with_workers(3)).await;
    let stats = &report.stats;

    assert_eq!(stats.tasks_created, 1 + 2 * stats.splits);
    assert_eq!(stats.results, stats.tasks_created - stats.splits);
    assert_eq!(stats.dispatches, stats.tasks_created);

    let results = events
        .iter()
        .filter(|e| matches!(e, FarmEvent::ResultReceived { .. }))
        .count() as u64;
    assert_eq!(results, stats.results);
}

#[tokio::test]
async fn test_split_pairs_tile_the_dispatched_task() {
    let (_, events) = run_traced(square_problem(), CoordinatorConfig::with_workers(4)).await;

    let mut assigned: HashMap<Rank, Task> = HashMap::new();
    for event in &events {
        match event {
            FarmEvent::Dispatched { worker, task } => {
                assigned.insert(*worker, *task);
            }
            FarmEvent::SplitReceived { worker, first, second } => {
                let parent = assigned.remove(worker).expect("split from worker with a task");
                assert_eq!(first.left, parent.left);
                assert_eq!(first.right, second.left);
                assert_eq!(second.right, parent.right);
            }
            FarmEvent::ResultReceived { worker, .. } => {
                assert!(assigned.remove(worker).is_some());
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_bag_is_processed_lifo() {
    let (_, events) = run_traced(square_problem(), CoordinatorConfig::with_workers(2)).await;

    for pair in events.windows(2) {
        if let FarmEvent::SplitReceived { second, .. } = &pair[0] {
            match &pair[1] {
                FarmEvent::Dispatched { task, .. } => assert_eq!(task, second),
                other => panic!("expected a dispatch after a split, got {:?}", other),
            }
        }
    }
}

#[tokio::test]
async fn test_policies_agree_on_area() {
    let mut areas = Vec::new();
    for policy in [DispatchPolicy::RoundRobin, DispatchPolicy::LowestIndex] {
        let config = CoordinatorConfig {
            dispatch_policy: policy,
            ..CoordinatorConfig::with_workers(3)
        };
        let (report, _) = run_traced(square_problem(), config).await;
        assert_eq!(report.tasks_per_worker().iter().sum::<u64>(), report.stats.dispatches);
        areas.push(report.area);
    }
    assert!((areas[0] - areas[1]).abs() < 1e-9);
}

#[tokio::test]
async fn test_default_problem_cosh_power() {
    let problem = Problem::new(0.0, 1.0, 1e-6, Integrand::from(IntegrandSpec::default()));
    let (report, _) = run_traced(problem, CoordinatorConfig::with_workers(4)).await;

    // Antiderivative of cosh^4: 3x/8 + sinh(2x)/4 + sinh(4x)/32
    let exact = 3.0 / 8.0 + 2.0f64.sinh() / 4.0 + 4.0f64.sinh() / 32.0;
    assert!((report.area - exact).abs() < 1e-3, "area {} vs {}", report.area, exact);
}

#[tokio::test]
async fn test_zero_workers_rejected_before_work() {
    let bus = Arc::new(EventBus::with_default_capacity());
    let mut rx = bus.subscribe();

    let err = Farm::new(square_problem(), CoordinatorConfig::with_workers(0))
        .with_events(bus)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, FarmError::InsufficientParticipants { participants: 1 }));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_panicking_worker_fails_the_run() {
    let problem = Problem::new(
        0.0,
        1.0,
        1e-3,
        Integrand::new("boom", |x| if x > 0.4 { panic!("integrand exploded") } else { x }),
    );

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        Farm::new(problem, CoordinatorConfig::with_workers(2)).run(),
    )
    .await
    .expect("farm should fail instead of hanging");

    match result {
        Err(FarmError::WorkerFailed { rank, reason }) => {
            // Only one task exists at the start and round-robin hands it to the first worker
            assert_eq!(rank, Rank(1));
            assert!(reason.contains("integrand exploded"), "reason was {}", reason);
        }
        other => panic!("expected WorkerFailed, got {:?}", other.map(|r| r.area)),
    }
}

// =============================================================================
// CLI
// =============================================================================

mod cli {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn qf(home: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("qf").expect("qf binary");
        cmd.current_dir(home.path())
            .env("HOME", home.path())
            .env("XDG_DATA_HOME", home.path().join("data"))
            .env("XDG_CONFIG_HOME", home.path().join("config"));
        cmd
    }

    #[test]
    fn test_run_prints_report() {
        let home = TempDir::new().expect("Failed to create temp dir");
        qf(&home)
            .args([
                "run",
                "--workers",
                "2",
                "--from",
                "0",
                "--to",
                "10",
                "--epsilon",
                "1",
                "--integrand",
                "constant:1",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Area=10.000000"))
            .stdout(predicate::str::contains("Tasks Per Process"))
            .stdout(predicate::str::contains("0\t1\t2"));
    }

    #[test]
    fn test_run_json_output() {
        let home = TempDir::new().expect("Failed to create temp dir");
        let output = qf(&home)
            .args(["run", "-w", "3", "-a", "0", "-b", "2", "-e", "1e-6", "-i", "poly:0,0,1", "-f", "json"])
            .output()
            .expect("run qf");
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
        let area = report["area"].as_f64().expect("area");
        assert!((area - 8.0 / 3.0).abs() < 1e-4);
        assert_eq!(report["tasks_per_rank"].as_array().map(|a| a.len()), Some(4));
    }

    #[test]
    fn test_zero_workers_fails() {
        let home = TempDir::new().expect("Failed to create temp dir");
        qf(&home)
            .args(["run", "--workers", "0"])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("at least 2 participants"));
    }

    #[test]
    fn test_config_command_reads_file() {
        let home = TempDir::new().expect("Failed to create temp dir");
        let path = home.path().join("farm.yml");
        std::fs::write(&path, "farm:\n  workers: 7\n").expect("write config");

        qf(&home)
            .args(["config", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("workers: 7"))
            .stdout(predicate::str::contains("kind: cosh-power"));
    }

    #[test]
    fn test_local_config_file_is_picked_up() {
        let home = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(home.path().join(".quadfarm.yml"), "farm:\n  workers: 2\n").expect("write config");

        qf(&home)
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("workers: 2"));
    }
}
