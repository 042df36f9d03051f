//! Batch dispatch - runs one export task per selected parameter set.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use scadrun_core::{
    read_parameter_file, translate, ExportExtension, ExportFormat, ParameterSet, Selection,
    SelectionError, SourceError, TaskOutcome,
};

use crate::executor::{ExportTool, InvocationSpec, OpenScadTool};
use crate::report::BatchReport;

/// Fatal batch errors. Per-unit tool failures are not errors; they are
/// recorded as `Failure` outcomes in the report.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Model source file passed to every invocation.
    pub model_path: PathBuf,

    /// Directory exported files are written to. Created (with parents)
    /// before any task runs.
    pub output_dir: PathBuf,

    /// External tool executable.
    pub tool_path: PathBuf,

    /// Export format forwarded to the tool.
    pub format: ExportFormat,

    /// Extension of exported files.
    pub extension: ExportExtension,

    /// Run tasks one at a time in index order instead of concurrently.
    pub sequential: bool,
}

/// Dispatches export tasks over a parameter-set sequence and collects their
/// outcomes into a deterministic [`BatchReport`].
pub struct BatchRunner<T: ExportTool> {
    config: BatchConfig,
    tool: Arc<T>,
}

impl<T: ExportTool> BatchRunner<T> {
    /// Create a new BatchRunner.
    pub fn new(config: BatchConfig, tool: T) -> Self {
        Self {
            config,
            tool: Arc::new(tool),
        }
    }

    /// Run every selected parameter set to completion. With no selection,
    /// all indices are selected. Unselected indices produce no outcome and
    /// are reported as skipped.
    pub async fn run(
        &self,
        sets: &[ParameterSet],
        selection: Option<&Selection>,
    ) -> Result<BatchReport, BatchError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| {
            BatchError::OutputDir {
                path: self.config.output_dir.clone(),
                source,
            }
        })?;

        let mut jobs = Vec::new();
        let mut skipped = Vec::new();
        for (index, set) in sets.iter().enumerate() {
            if selection.is_some_and(|sel| !sel.contains(index)) {
                skipped.push(index);
                continue;
            }
            jobs.push((index, self.invocation(index, set)));
        }

        let started = Instant::now();
        let outcomes = if self.config.sequential {
            info!(jobs = jobs.len(), "running exports sequentially");
            self.run_sequential(jobs).await
        } else {
            info!(jobs = jobs.len(), "running exports in parallel");
            self.run_concurrent(jobs).await
        };
        let total_elapsed = started.elapsed();

        Ok(BatchReport::from_outcomes(outcomes, skipped, total_elapsed))
    }

    fn invocation(&self, index: usize, set: &ParameterSet) -> InvocationSpec {
        let name = set.name_or_index(index);
        let output_path = self
            .config
            .output_dir
            .join(format!("{}.{}", name, self.config.extension));
        InvocationSpec {
            tool_path: self.config.tool_path.clone(),
            model_path: self.config.model_path.clone(),
            output_path,
            format: self.config.format,
            flags: translate(set),
        }
    }

    /// One task at a time, in ascending index order; outcome order equals
    /// index order.
    async fn run_sequential(&self, jobs: Vec<(usize, InvocationSpec)>) -> Vec<(usize, TaskOutcome)> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for (index, spec) in jobs {
            let outcome = self.tool.export(&spec).await;
            log_outcome(&outcome);
            outcomes.push((index, outcome));
        }
        outcomes
    }

    /// One independent unit of work per selected index, bounded by the
    /// host's default concurrency. Outcomes are collected as tasks complete;
    /// the report sorts them back into index order.
    async fn run_concurrent(&self, jobs: Vec<(usize, InvocationSpec)>) -> Vec<(usize, TaskOutcome)> {
        let permits = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        let mut tasks = JoinSet::new();
        for (index, spec) in jobs {
            let tool = Arc::clone(&self.tool);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed; a failed acquire only
                // means the task runs unthrottled.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = tool.export(&spec).await;
                log_outcome(&outcome);
                (index, outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(error = %err, "export task aborted"),
            }
        }
        outcomes
    }
}

fn log_outcome(outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Success {
            output_path,
            duration,
        } => info!(
            path = %output_path.display(),
            secs = format!("{:.2}", duration.as_secs_f64()),
            "exported"
        ),
        TaskOutcome::Failure {
            output_path,
            error,
            duration,
        } => warn!(
            path = %output_path.display(),
            secs = format!("{:.2}", duration.as_secs_f64()),
            error = %error,
            "export failed"
        ),
    }
}

/// Options for the batch-export entry point consumed by the CLI layer.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub model_path: PathBuf,
    pub parameter_file: PathBuf,
    pub output_dir: PathBuf,
    pub tool_path: PathBuf,
    pub format: ExportFormat,
    pub extension: ExportExtension,
    /// Selection string restricting which parameter sets run; `None` runs
    /// them all.
    pub selection: Option<String>,
    pub sequential: bool,
}

/// Read the parameter file, resolve the selection, and dispatch the batch
/// with the production tool executor.
pub async fn batch_export(options: &ExportOptions) -> Result<BatchReport, BatchError> {
    let sets = read_parameter_file(&options.parameter_file)?;

    let selection = options
        .selection
        .as_deref()
        .map(|expr| Selection::parse(expr, sets.len()))
        .transpose()?;
    if let Some(selection) = &selection {
        let indices: Vec<usize> = selection.indices().collect();
        info!(?indices, "selected parameter set indices");
    }

    let runner = BatchRunner::new(
        BatchConfig {
            model_path: options.model_path.clone(),
            output_dir: options.output_dir.clone(),
            tool_path: options.tool_path.clone(),
            format: options.format,
            extension: options.extension,
            sequential: options.sequential,
        },
        OpenScadTool,
    );
    runner.run(&sets, selection.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Deterministic stand-in for the external tool: fails any output whose
    /// file stem appears in `fail_stems`, records every invocation.
    struct StubTool {
        fail_stems: BTreeSet<String>,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl StubTool {
        fn new<const N: usize>(fail_stems: [&str; N]) -> Self {
            Self {
                fail_stems: fail_stems.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExportTool for StubTool {
        async fn export(&self, spec: &InvocationSpec) -> TaskOutcome {
            self.seen.lock().unwrap().push(spec.output_path.clone());
            let stem = spec
                .output_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if self.fail_stems.contains(stem) {
                TaskOutcome::Failure {
                    output_path: spec.output_path.clone(),
                    error: format!("stub refused {stem}"),
                    duration: Duration::from_millis(1),
                }
            } else {
                TaskOutcome::Success {
                    output_path: spec.output_path.clone(),
                    duration: Duration::from_millis(1),
                }
            }
        }
    }

    fn sets(names: &[Option<&str>]) -> Vec<ParameterSet> {
        names
            .iter()
            .map(|name| {
                ParameterSet::new(
                    name.map(str::to_string),
                    vec![("width".to_string(), json!("3"))],
                )
            })
            .collect()
    }

    fn config(dir: &std::path::Path, sequential: bool) -> BatchConfig {
        BatchConfig {
            model_path: PathBuf::from("box.scad"),
            output_dir: dir.to_path_buf(),
            tool_path: PathBuf::from("openscad"),
            format: ExportFormat::BinStl,
            extension: ExportExtension::Stl,
            sequential,
        }
    }

    fn sorted_paths(records: &[crate::report::ExportRecord]) -> Vec<PathBuf> {
        records.iter().map(|r| r.output_path.clone()).collect()
    }

    #[tokio::test]
    async fn test_no_selection_runs_everything() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(config(dir.path(), true), StubTool::new([]));
        let report = runner
            .run(&sets(&[Some("a"), None, Some("c")]), None)
            .await
            .unwrap();
        assert_eq!(report.attempted(), 3);
        assert!(report.skipped().is_empty());
        assert_eq!(
            sorted_paths(report.successes()),
            vec![
                dir.path().join("a.stl"),
                dir.path().join("model_1.stl"),
                dir.path().join("c.stl"),
            ]
        );
    }

    #[tokio::test]
    async fn test_selection_filters_and_records_skips() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(config(dir.path(), true), StubTool::new([]));
        let selection = Selection::parse("0,2", 4).unwrap();
        let report = runner
            .run(&sets(&[None, None, None, None]), Some(&selection))
            .await
            .unwrap();
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.skipped(), &[1, 3]);
    }

    #[tokio::test]
    async fn test_outcome_count_matches_selection_size() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(config(dir.path(), false), StubTool::new([]));
        let names: Vec<Option<&str>> = vec![None; 8];
        let selection = Selection::parse("every:2 in 0-6", 8).unwrap();
        let report = runner.run(&sets(&names), Some(&selection)).await.unwrap();
        assert_eq!(report.attempted(), selection.len());
        let stems: BTreeSet<_> = report
            .successes()
            .iter()
            .map(|r| r.output_path.clone())
            .collect();
        assert_eq!(stems.len(), selection.len());
    }

    #[tokio::test]
    async fn test_sequential_and_concurrent_agree() {
        let dir = tempfile::tempdir().unwrap();
        let names = [Some("a"), Some("b"), Some("c"), Some("d"), Some("e")];

        let sequential = BatchRunner::new(config(dir.path(), true), StubTool::new(["b", "d"]));
        let concurrent = BatchRunner::new(config(dir.path(), false), StubTool::new(["b", "d"]));

        let seq_report = sequential.run(&sets(&names), None).await.unwrap();
        let con_report = concurrent.run(&sets(&names), None).await.unwrap();

        assert_eq!(
            sorted_paths(seq_report.successes()),
            sorted_paths(con_report.successes())
        );
        assert_eq!(
            seq_report
                .failures()
                .iter()
                .map(|f| (f.output_path.clone(), f.error.clone()))
                .collect::<Vec<_>>(),
            con_report
                .failures()
                .iter()
                .map(|f| (f.output_path.clone(), f.error.clone()))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(config(dir.path(), false), StubTool::new(["a"]));
        let report = runner
            .run(&sets(&[Some("a"), Some("b")]), None)
            .await
            .unwrap();
        assert_eq!(report.successes().len(), 1);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].error, "stub refused a");
    }
}
