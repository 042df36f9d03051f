//! Batch summary aggregation and rendering.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use scadrun_core::TaskOutcome;

/// One successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub output_path: PathBuf,
    pub duration: Duration,
}

/// One failed export, with the tool's captured error text.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub output_path: PathBuf,
    pub error: String,
    pub duration: Duration,
}

/// Aggregated result of one batch run.
///
/// Successes and failures are ordered by the original parameter-set index
/// regardless of completion order, so the rendered summary is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    successes: Vec<ExportRecord>,
    failures: Vec<FailureRecord>,
    skipped: Vec<usize>,
    total_elapsed: Duration,
}

impl BatchReport {
    /// Build a report from `(index, outcome)` pairs in any order, plus the
    /// indices the selection skipped and the whole-batch wall time.
    pub fn from_outcomes(
        mut outcomes: Vec<(usize, TaskOutcome)>,
        mut skipped: Vec<usize>,
        total_elapsed: Duration,
    ) -> Self {
        outcomes.sort_by_key(|(index, _)| *index);
        skipped.sort_unstable();

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                TaskOutcome::Success {
                    output_path,
                    duration,
                } => successes.push(ExportRecord {
                    output_path,
                    duration,
                }),
                TaskOutcome::Failure {
                    output_path,
                    error,
                    duration,
                } => failures.push(FailureRecord {
                    output_path,
                    error,
                    duration,
                }),
            }
        }

        Self {
            successes,
            failures,
            skipped,
            total_elapsed,
        }
    }

    /// Successful exports, ordered by parameter-set index.
    pub fn successes(&self) -> &[ExportRecord] {
        &self.successes
    }

    /// Failed exports, ordered by parameter-set index.
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Indices excluded by the selection. Not counted as attempted.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// Total exports attempted (successes + failures).
    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether any unit failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Per-task durations for aggregate timing: successes first, then
    /// failures, each in index order.
    pub fn durations(&self) -> Vec<Duration> {
        self.successes
            .iter()
            .map(|record| record.duration)
            .chain(self.failures.iter().map(|record| record.duration))
            .collect()
    }

    /// Wall time for the whole batch, measured around the dispatch (not a
    /// sum of per-task durations, which overlap under concurrency).
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    /// Render the deterministic, human-readable summary.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Batch export completed.");
        let _ = writeln!(out, "Total exports attempted: {}", self.attempted());
        let _ = writeln!(out, "Successful exports: {}", self.successes.len());
        if !self.successes.is_empty() {
            let _ = writeln!(out, "Successfully exported files:");
            for record in &self.successes {
                let _ = writeln!(out, "  - {}", record.output_path.display());
            }
        }
        let _ = writeln!(out, "Failed exports: {}", self.failures.len());
        if !self.failures.is_empty() {
            let _ = writeln!(out, "Failed to export the following files:");
            for record in &self.failures {
                let _ = writeln!(out, "  - {}: {}", record.output_path.display(), record.error);
            }
        }
        let _ = writeln!(
            out,
            "\nTotal time taken: {:.2} seconds.",
            self.total_elapsed.as_secs_f64()
        );
        out
    }
}
