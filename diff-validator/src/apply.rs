//! Dry-run apply via the git unified-diff machinery.
//!
//! `git apply --check` verifies a patch against the working tree without
//! writing anything. Stdout is ignored; the verdict is the exit status and
//! stderr carries the conflicting-hunk detail we surface to agents.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Longest a dry run may take before we give up on the subprocess.
const DRY_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Stderr is truncated to this many bytes in returned errors.
const STDERR_CAP: usize = 4096;

/// Dry-run applier bound to one working tree root.
#[derive(Debug, Clone)]
pub struct DiffValidator {
    worktree: PathBuf,
}

impl DiffValidator {
    pub fn new(worktree: impl Into<PathBuf>) -> Self {
        Self {
            worktree: worktree.into(),
        }
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// Checks whether `diff` would apply cleanly to the working tree.
    ///
    /// An empty diff is a no-op and passes without spawning anything.
    /// The working tree is never modified.
    pub async fn check_apply(&self, diff: &str) -> DiffResult<()> {
        if diff.trim().is_empty() {
            return Ok(());
        }

        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.worktree)
            .args(["apply", "--check", "--whitespace=nowarn", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A broken pipe just means git already reached a verdict; the
            // exit status below is authoritative.
            let _ = stdin.write_all(diff.as_bytes()).await;
            if !diff.ends_with('\n') {
                let _ = stdin.write_all(b"\n").await;
            }
        }

        let output = match tokio::time::timeout(DRY_RUN_TIMEOUT, child.wait_with_output()).await
        {
            Ok(output) => output?,
            Err(_) => {
                return Err(DiffError::Timeout {
                    secs: DRY_RUN_TIMEOUT.as_secs(),
                });
            }
        };

        if output.status.success() {
            debug!(worktree = %self.worktree.display(), "dry-run apply clean");
            return Ok(());
        }

        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if stderr.len() > STDERR_CAP {
            let mut cut = STDERR_CAP;
            while !stderr.is_char_boundary(cut) {
                cut -= 1;
            }
            stderr.truncate(cut);
            stderr.push_str("…");
        }
        let stderr = stderr.trim().to_string();
        debug!(worktree = %self.worktree.display(), %stderr, "dry-run apply rejected");
        Err(DiffError::Conflict { stderr })
    }
}
