// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and lifecycle management.
//!
//! ```text
//! run() / run_with_cancellation(token)
//!              |
//!              v
//!     build_command()
//!     args, piped stdio, kill_on_drop
//!              |
//!              v
//!          spawn() --err--> ProcessError::SpawnFailed
//!              |
//!              v
//!         run_child
//!              |
//!              v
//!    validate exit_code
//!    (skip if ALLOW_FAILURE or interrupted)
//!              |
//!              v
//!       ProcessOutput
//! ```

use std::fmt::Write as _;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput};
use crate::error::{DropzoneResult, ProcessError};

impl ProcessBuilder {
    /// Returns the display name for this process.
    pub(crate) fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    fn command_line(&self) -> String {
        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns and runs the process, waiting for completion.
    ///
    /// # Errors
    ///
    /// Returns a `ProcessError` if spawning fails, the output cannot be read,
    /// or the process exits non-zero without `ALLOW_FAILURE`.
    pub async fn run(self) -> DropzoneResult<ProcessOutput> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Spawns and runs the process, killing it when `token` is cancelled.
    ///
    /// A cancelled run returns `Ok` with [`ProcessOutput::is_interrupted`]
    /// set; the caller decides how to surface it.
    ///
    /// # Errors
    ///
    /// Returns a `ProcessError` if spawning fails, the output cannot be read,
    /// or the process exits non-zero without `ALLOW_FAILURE`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tokio_util::sync::CancellationToken;
    /// use dropzone_rs::core::process::builder::ProcessBuilder;
    ///
    /// let token = CancellationToken::new();
    /// let output = ProcessBuilder::new("wget")
    ///     .arg("--tries=1")
    ///     .arg("https://example.com/mod.zip")
    ///     .run_with_cancellation(token.child_token())
    ///     .await?;
    /// ```
    pub async fn run_with_cancellation(
        self,
        token: CancellationToken,
    ) -> DropzoneResult<ProcessOutput> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if token.is_cancelled() {
            return Ok(ProcessOutput::new(-1, String::new(), true));
        }

        debug!(cmd = %cmd_line, "exec");

        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;

        trace!(process = %name, pid = ?child.id(), "spawned");

        let output = self
            .run_child(&name, &mut child, &token)
            .await
            .map_err(|e| ProcessError::OutputError {
                command: name.clone(),
                message: e.to_string(),
            })?;

        if !output.is_interrupted()
            && !self.process_flags().contains(ProcessFlags::ALLOW_FAILURE)
            && output.exit_code() != 0
        {
            if !output.stderr().is_empty() {
                error!(process = %name, stderr = %output.stderr(), "process error output");
            }
            return Err(ProcessError::NonZeroExit {
                command: name,
                code: output.exit_code(),
                message: "unexpected exit status".to_string(),
            }
            .into());
        }

        trace!(
            process = %name,
            exit_code = output.exit_code(),
            interrupted = output.is_interrupted(),
            "completed"
        );
        Ok(output)
    }

    /// Builds the tokio Command from this builder's configuration.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        command
    }
}
