//! Per-task export outcomes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result of one export task. Produced exactly once per dispatched task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// The tool exited with status 0.
    Success {
        output_path: PathBuf,
        duration: Duration,
    },
    /// The tool exited non-zero or could not be launched. `error` is the
    /// tool's trimmed standard-error content, opaque diagnostic payload.
    Failure {
        output_path: PathBuf,
        error: String,
        duration: Duration,
    },
}

impl TaskOutcome {
    /// The output file this task targeted.
    pub fn output_path(&self) -> &Path {
        match self {
            Self::Success { output_path, .. } | Self::Failure { output_path, .. } => output_path,
        }
    }

    /// Wall-clock time spent on this task.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Success { duration, .. } | Self::Failure { duration, .. } => *duration,
        }
    }

    /// Whether the task succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
