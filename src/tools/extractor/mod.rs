// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Archive extraction through a 7-Zip compatible executable.
//!
//! ```text
//! archive (.7z | .zip | .7z.001 ...) --> 7z x -y -bsp1 -bso0 -o<dir> --> dir
//! ```
//!
//! 7-Zip redraws its counter with backspaces; the process reader splits on
//! them so every redraw becomes a progress update. Split archives are opened
//! through their first part.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Progress, ToolContext, check_exit, validate_executable, validate_file};
use crate::core::process::builder::{ProcessBuilder, ProcessFlags};
use crate::error::{DropzoneResult, FsError};

/// 7-Zip exit statuses.
pub const SEVENZIP_EXIT_CODES: &[(i32, &str)] = &[
    (1, "warning (non-fatal error)"),
    (2, "fatal error"),
    (7, "command line error"),
    (8, "not enough memory"),
    (255, "user stopped the process"),
];

#[derive(Debug, Clone)]
pub struct ExtractorTool {
    executable: PathBuf,
}

impl ExtractorTool {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        "7z"
    }

    fn output_switch(output_dir: &Path) -> String {
        format!("-o{}", output_dir.display())
    }

    /// Extracts `archive` into `output_dir`, overwriting existing files.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the executable or archive is missing or not a
    ///   file. Nothing is spawned in that case.
    /// - `FsError` if `output_dir` cannot be created.
    /// - `ProcessError` if 7z fails or the run is cancelled.
    pub async fn extract(
        &self,
        archive: &Path,
        output_dir: &Path,
        ctx: &ToolContext,
    ) -> DropzoneResult<PathBuf> {
        let executable = validate_executable(&self.executable).await?;
        validate_file("archive", archive).await?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| FsError::io(output_dir, e))?;

        debug!(
            archive = %archive.display(),
            output = %output_dir.display(),
            "extracting archive"
        );
        ctx.report(Progress::at(0));

        let output = ProcessBuilder::new(executable)
            .name(self.name())
            .arg("x")
            .arg("-y")
            .arg("-bsp1")
            .arg("-bso0")
            .arg(Self::output_switch(output_dir))
            .arg(archive)
            .flag(ProcessFlags::ALLOW_FAILURE)
            .capture_stderr()
            .on_output(ctx.output_handler())
            .run_with_cancellation(ctx.cancel_token().clone())
            .await?;

        check_exit(self.name(), &output, SEVENZIP_EXIT_CODES)?;

        ctx.report(Progress::at(100));
        info!(
            archive = %archive.display(),
            output = %output_dir.display(),
            "archive extracted"
        );
        Ok(output_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests;
