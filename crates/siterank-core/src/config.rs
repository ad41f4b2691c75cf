use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Number of domains pushed to the work queue per store call.
pub const LOAD_BATCH_SIZE: usize = 100;

/// How the work queue stores domains under its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// FIFO list; duplicates allowed.
    List,
    /// Deduplicating set; pop order is arbitrary.
    Set,
}

impl QueueMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueMode::List => "list",
            QueueMode::Set => "set",
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueueMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "list" => Ok(QueueMode::List),
            "set" => Ok(QueueMode::Set),
            _ => Err(AppError::ConfigError(format!(
                "Unknown queue mode '{s}' (expected 'list' or 'set')"
            ))),
        }
    }
}

/// Which strategy fills the fourth rank field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AltRankStrategy {
    /// Read the global rank embedded in an inline script block.
    #[default]
    Script,
    /// Re-read the global rank panel, same as the second field.
    Panel,
}

impl AltRankStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AltRankStrategy::Script => "script",
            AltRankStrategy::Panel => "panel",
        }
    }
}

impl fmt::Display for AltRankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AltRankStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "script" => Ok(AltRankStrategy::Script),
            "panel" => Ok(AltRankStrategy::Panel),
            _ => Err(AppError::ConfigError(format!(
                "Unknown alt rank strategy '{s}' (expected 'script' or 'panel')"
            ))),
        }
    }
}

/// Configuration for the result file sink.
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Path prefix; the run-start unix timestamp is appended to it.
    pub output_base: PathBuf,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            output_base: PathBuf::from("./rank_results/siterank_result_"),
        }
    }
}

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub clear_before_load: bool,
    pub batch_size: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            clear_before_load: true,
            batch_size: LOAD_BATCH_SIZE,
        }
    }
}

/// Configuration for the worker pool. The worker count is chosen per run.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_prefix: "worker".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn worker_id(&self, index: usize) -> String {
        format!("{}-{index}", self.worker_prefix)
    }
}
