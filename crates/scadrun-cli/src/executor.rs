//! Task execution - one external-tool invocation per parameter set.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use scadrun_core::{ExportFormat, TaskOutcome};

/// One concrete external-tool invocation, built per task and discarded after
/// it returns.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    /// External tool executable.
    pub tool_path: PathBuf,

    /// Model source file passed to the tool.
    pub model_path: PathBuf,

    /// File the tool writes.
    pub output_path: PathBuf,

    /// Export format forwarded via `--export-format`.
    pub format: ExportFormat,

    /// Translated `-D` flags, in parameter order.
    pub flags: Vec<String>,
}

impl InvocationSpec {
    /// Arguments after the program name, in the invocation contract order:
    /// output flag, format flag, `-D` flags, model source path.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.flags.len() + 4);
        args.push("-o".to_string());
        args.push(self.output_path.display().to_string());
        args.push(format!("--export-format={}", self.format));
        args.extend(self.flags.iter().cloned());
        args.push(self.model_path.display().to_string());
        args
    }
}

/// Seam between the dispatcher and the external tool, so dispatch logic can
/// be exercised without spawning processes.
#[async_trait]
pub trait ExportTool: Send + Sync + 'static {
    /// Run one export to completion and report its outcome. Never retries;
    /// a failing unit never aborts its siblings.
    async fn export(&self, spec: &InvocationSpec) -> TaskOutcome;
}

/// Production executor: spawns the export tool as a child process, captures
/// stdout and stderr separately, and measures wall-clock duration around the
/// child's lifetime.
#[derive(Debug, Clone, Default)]
pub struct OpenScadTool;

#[async_trait]
impl ExportTool for OpenScadTool {
    async fn export(&self, spec: &InvocationSpec) -> TaskOutcome {
        let args = spec.args();
        debug!(
            tool = %spec.tool_path.display(),
            command = %args.join(" "),
            "running export tool"
        );

        let started = Instant::now();
        let output = Command::new(&spec.tool_path).args(&args).output().await;
        let duration = started.elapsed();

        match output {
            Ok(output) if output.status.success() => TaskOutcome::Success {
                output_path: spec.output_path.clone(),
                duration,
            },
            Ok(output) => TaskOutcome::Failure {
                output_path: spec.output_path.clone(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                duration,
            },
            Err(err) => TaskOutcome::Failure {
                output_path: spec.output_path.clone(),
                error: format!("failed to launch {}: {}", spec.tool_path.display(), err),
                duration,
            },
        }
    }
}
