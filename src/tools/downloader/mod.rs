// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Downloader tool driving a wget-compatible executable.
//!
//! ```text
//! url --> last path segment --> percent-decode --> secure_join(target_dir)
//!     --> wget --progress=dot:mega --tries=1 -O <file> <url>
//!     --> "  3072K ........ 12% 1.2M 3s" --> Progress { 12, .. }
//! ```
//!
//! `-O` truncates, so a retried download starts from scratch.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tracing::{debug, info};
use url::Url;

use super::{Progress, ToolContext, check_exit, validate_executable};
use crate::core::process::builder::{ProcessBuilder, ProcessFlags};
use crate::error::{DropzoneResult, FsError, PathError, ValidationError};
use crate::paths::{normalize, secure_join};

/// wget exit statuses.
pub const WGET_EXIT_CODES: &[(i32, &str)] = &[
    (1, "generic error"),
    (2, "parse error"),
    (3, "file I/O error"),
    (4, "network failure"),
    (5, "SSL verification failure"),
    (6, "authentication failure"),
    (7, "protocol error"),
    (8, "server issued an error response"),
];

/// File name used when a URL has no usable last segment.
const FALLBACK_FILE_NAME: &str = "download";

/// Decoded last path segment of a URL, `None` when it is empty.
///
/// # Errors
///
/// Returns `ValidationError::InvalidUrl` if `url` does not parse.
pub fn file_name_from_url(url: &str) -> Result<Option<String>, ValidationError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|name| !name.trim().is_empty()))
}

#[derive(Debug, Clone)]
pub struct DownloaderTool {
    executable: PathBuf,
}

impl DownloaderTool {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        "wget"
    }

    /// Where `url` lands inside `target_dir`.
    ///
    /// # Errors
    ///
    /// - `ValidationError::InvalidUrl` if `url` does not parse.
    /// - `PathError::EscapesRoot` if the decoded file name would leave
    ///   `target_dir` or resolve to the directory itself.
    pub fn target_file(target_dir: &Path, url: &str) -> DropzoneResult<PathBuf> {
        let name = file_name_from_url(url)?.unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        let file = secure_join(target_dir, &name)?;
        if file == normalize(target_dir) {
            return Err(PathError::EscapesRoot {
                root: target_dir.display().to_string(),
                path: name,
            }
            .into());
        }
        Ok(file)
    }

    /// Downloads `url` into `target_dir`, returning the written file.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the executable cannot be resolved or `url`
    ///   does not parse.
    /// - `PathError` if the URL's file name escapes `target_dir`.
    /// - `FsError` if `target_dir` cannot be created.
    /// - `ProcessError` if wget fails or the run is cancelled.
    pub async fn download(
        &self,
        url: &str,
        target_dir: &Path,
        ctx: &ToolContext,
    ) -> DropzoneResult<PathBuf> {
        let executable = validate_executable(&self.executable).await?;
        let target = Self::target_file(target_dir, url)?;

        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| FsError::io(target_dir, e))?;

        debug!(url = %url, target = %target.display(), "downloading");
        ctx.report(Progress::at(0));

        let output = ProcessBuilder::new(executable)
            .name(self.name())
            .arg("--progress=dot:mega")
            .arg("--tries=1")
            .arg("-O")
            .arg(&target)
            .arg(url)
            .flag(ProcessFlags::ALLOW_FAILURE)
            .capture_stderr()
            .on_output(ctx.output_handler())
            .run_with_cancellation(ctx.cancel_token().clone())
            .await?;

        check_exit(self.name(), &output, WGET_EXIT_CODES)?;

        ctx.report(Progress::at(100));
        info!(url = %url, target = %target.display(), "download complete");
        Ok(target)
    }
}
