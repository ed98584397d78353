use log::{debug, error};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::errors::ProviderError;

/// Run an external tool to completion, bounded by `timeout_secs`.
///
/// The child is killed if the timeout fires or the returned future is
/// dropped. A non-zero exit status is reported as `ProcessFailed`
/// with the tool's meaningful stderr lines.
pub async fn run_tool(program: &str, args: &[String], timeout_secs: u64) -> Result<Output, ProviderError> {
    debug!("Running {} with {} argument(s)", program, args.len());

    let tool_future = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let timeout_duration = Duration::from_secs(timeout_secs);
    let output = tokio::select! {
        result = tool_future => {
            result.map_err(|e| ProviderError::ProcessFailed(format!("Failed to execute {}: {}", program, e)))?
        },
        _ = tokio::time::sleep(timeout_duration) => {
            return Err(ProviderError::Timeout(timeout_secs));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered = filter_stderr(&stderr);
        error!("{} failed: {}", program, filtered);
        return Err(ProviderError::ProcessFailed(format!("{} exited with {}: {}", program, output.status, filtered)));
    }

    Ok(output)
}

/// Keep the error and warning lines of a tool's stderr, or the last line if none
fn filter_stderr(stderr: &str) -> String {
    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR") || line.starts_with("WARNING") || line.contains("rror"))
        .collect();

    if meaningful.is_empty() {
        stderr.lines().map(str::trim).filter(|l| !l.is_empty()).last().unwrap_or("no output").to_string()
    } else {
        meaningful.join("; ")
    }
}
