//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::coordinator::DispatchPolicy;
use crate::domain::IntegrandSpec;

/// QuadFarm - adaptive quadrature on a task farm
#[derive(Parser)]
#[command(
    name = "qf",
    about = "Adaptive quadrature distributed over a coordinator and a worker pool",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Integrate and print the area and the per-process task table
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Overrides for a single run; anything unset comes from the config file
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Number of workers (participants minus the coordinator)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Lower integration bound
    #[arg(short = 'a', long = "from", allow_hyphen_values = true)]
    pub a: Option<f64>,

    /// Upper integration bound
    #[arg(short = 'b', long = "to", allow_hyphen_values = true)]
    pub b: Option<f64>,

    /// Convergence tolerance
    #[arg(short, long)]
    pub epsilon: Option<f64>,

    /// Integrand: constant:C, poly:c0,c1,..., cosh:P, sin, exp
    #[arg(short, long)]
    pub integrand: Option<IntegrandSpec>,

    /// Idle-worker scan order (round-robin, lowest-index)
    #[arg(short, long)]
    pub policy: Option<DispatchPolicy>,

    /// Give up after this many milliseconds without a worker reply
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print every scheduling event to stderr as JSON lines
    #[arg(long)]
    pub trace: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Overlay the flags that were given on top of `config`
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "RunArgs::apply: called");
        if let Some(workers) = self.workers {
            config.farm.workers = workers;
        }
        if let Some(a) = self.a {
            config.integration.a = a;
        }
        if let Some(b) = self.b {
            config.integration.b = b;
        }
        if let Some(epsilon) = self.epsilon {
            config.integration.epsilon = epsilon;
        }
        if let Some(ref integrand) = self.integrand {
            config.integration.integrand = integrand.clone();
        }
        if let Some(policy) = self.policy {
            config.farm.dispatch_policy = policy;
        }
        if self.timeout_ms.is_some() {
            config.farm.recv_timeout_ms = self.timeout_ms;
        }
    }
}

/// Output format for the run report
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quadfarm")
        .join("logs")
        .join("quadfarm.log")
}
