//! Git adapter for the `git_*` actions.
//!
//! A failing git command is not an error here: its combined output is
//! returned as the text result so the plan can report it. Only a failure to
//! spawn git at all, or a timeout, is an error.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::io::config::GitConfig;
use crate::io::process::run_command_with_timeout;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, config: &GitConfig) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    /// Short status of the working tree.
    #[instrument(skip_all)]
    pub fn status(&self) -> Result<String> {
        self.run_text(&["status", "--short"])
    }

    /// Unstaged diff of the working tree.
    #[instrument(skip_all)]
    pub fn diff(&self) -> Result<String> {
        self.run_text(&["diff"])
    }

    /// Stage everything and commit it with `message`.
    #[instrument(skip_all)]
    pub fn commit(&self, message: &str) -> Result<String> {
        let staged = self.run_text(&["add", "."])?;
        debug!(output = %staged, "staged changes");
        self.run_text(&["commit", "-m", message])
    }

    fn run_text(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .map_err(|err| err.context(format!("spawn git {}", args.join(" "))))?;
        if output.timed_out {
            return Err(anyhow!(
                "git {} timed out after {:?}",
                args.join(" "),
                self.timeout
            ));
        }
        let text = output.combined_text("git");
        if !output.status.success() {
            warn!(
                exit_code = ?output.status.code(),
                command = %args.join(" "),
                "git command failed; returning its output"
            );
        }
        Ok(text)
    }
}
