//! Script test runner: discover `test_*` files in a directory, run each as
//! its own child process, and fold the exit statuses into one verdict.
//!
//! Deliberately small: sequential execution, no timeout, no retries, no
//! output capture. A crash and an assertion failure are the same thing
//! here: a nonzero exit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

pub const PASS_SUMMARY: &str = "All tests passed.";
pub const FAIL_SUMMARY: &str = "One or more tests failed.";

/// Outcome of one test script.
#[derive(Debug)]
pub struct ScriptResult {
    pub path: PathBuf,
    pub exit_code: i32,
}

impl ScriptResult {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Aggregate outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub results: Vec<ScriptResult>,
}

impl RunReport {
    /// True when every script exited 0, vacuously true for an empty run.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScriptResult::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    pub fn summary_line(&self) -> &'static str {
        if self.all_passed() { PASS_SUMMARY } else { FAIL_SUMMARY }
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }
}

/// Lists `test_*.{ext}` regular files in `dir`, sorted so runs are
/// deterministic.
pub fn discover(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading test directory {}", dir.display()))?;

    let mut scripts = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("test_") && path.extension().and_then(|e| e.to_str()) == Some(ext) {
            scripts.push(path);
        }
    }

    scripts.sort();
    Ok(scripts)
}

/// Runs one script, through `interpreter` when given, and reports its exit
/// code. A script that cannot be spawned or dies to a signal counts as
/// failed.
pub async fn run_script(path: &Path, interpreter: Option<&str>) -> ScriptResult {
    let status = match interpreter {
        Some(interpreter) => {
            tokio::process::Command::new(interpreter)
                .arg(path)
                .status()
                .await
        }
        None => tokio::process::Command::new(path).status().await,
    };

    let exit_code = match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            error!("failed to spawn {}: {e}", path.display());
            -1
        }
    };

    ScriptResult {
        path: path.to_path_buf(),
        exit_code,
    }
}

/// Runs every script in order. A failure never aborts the rest of the run.
pub async fn run_all(scripts: &[PathBuf], interpreter: Option<&str>) -> RunReport {
    let mut report = RunReport::default();

    for path in scripts {
        let result = run_script(path, interpreter).await;
        if result.passed() {
            info!("PASS {}", path.display());
        } else {
            info!("FAIL {} (exit={})", path.display(), result.exit_code);
        }
        report.results.push(result);
    }

    report
}
