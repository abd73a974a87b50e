// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! External tool runners.
//!
//! ```text
//! queue job --> ToolContext { cancel token, progress callback }
//!           --> DownloaderTool (wget) / ExtractorTool (7z)
//!           --> ProcessBuilder::run_with_cancellation
//!                 segment --> parse_progress --> callback
//!           --> Ok(artifact path) | ValidationError | ProcessError
//! ```
//!
//! Each runner reports 0 right after spawning and 100 once the tool exits
//! cleanly; everything in between is scraped from the tool's output.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::process::builder::{OutputHandler, OutputStream, ProcessBuilder, ProcessOutput};
use crate::error::{DropzoneResult, ProcessError, ValidationError};

pub mod downloader;
pub mod extractor;

pub use downloader::DownloaderTool;
pub use extractor::ExtractorTool;

/// Progress update emitted by a running tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 0 to 100.
    pub percent: u8,
    /// Remaining text of the output segment, if any.
    pub summary: Option<String>,
}

impl Progress {
    #[must_use]
    pub const fn at(percent: u8) -> Self {
        Self {
            percent,
            summary: None,
        }
    }
}

/// Receives every progress update of a run.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Context provided to tools during execution.
#[derive(Clone)]
pub struct ToolContext {
    cancel_token: CancellationToken,
    on_progress: ProgressCallback,
}

impl ToolContext {
    #[must_use]
    pub fn new(cancel_token: CancellationToken, on_progress: ProgressCallback) -> Self {
        Self {
            cancel_token,
            on_progress,
        }
    }

    /// A context without a listener, for one-off runs.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(CancellationToken::new(), Arc::new(|_| {}))
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn report(&self, progress: Progress) {
        (self.on_progress)(progress);
    }

    /// Output handler that forwards scraped percentages to the callback.
    fn output_handler(&self) -> OutputHandler {
        let on_progress = Arc::clone(&self.on_progress);
        Arc::new(move |_stream: OutputStream, segment: &str| {
            if let Some(progress) = parse_progress(segment) {
                on_progress(progress);
            }
        })
    }
}

/// Pre-compiled `N%` matcher.
fn percent_regex() -> Option<&'static Regex> {
    static PERCENT: OnceLock<Option<Regex>> = OnceLock::new();
    PERCENT
        .get_or_init(|| Regex::new(r"([0-9]{1,3})%").ok())
        .as_ref()
}

/// Extracts the last `N%` marker of an output segment.
///
/// Values above 100 are clamped. The rest of the segment, trimmed, becomes
/// the summary.
#[must_use]
pub fn parse_progress(segment: &str) -> Option<Progress> {
    let caps = percent_regex()?.captures_iter(segment).last()?;
    let whole = caps.get(0)?;
    let percent = caps.get(1)?.as_str().parse::<u16>().ok()?.min(100);
    let percent = u8::try_from(percent).ok()?;

    let summary = format!("{} {}", &segment[..whole.start()], &segment[whole.end()..]);
    let summary = summary.split_whitespace().collect::<Vec<_>>().join(" ");

    Some(Progress {
        percent,
        summary: (!summary.is_empty()).then_some(summary),
    })
}

/// Looks up a tool's exit code in its table.
#[must_use]
pub fn exit_code_message(table: &[(i32, &'static str)], code: i32) -> &'static str {
    table
        .iter()
        .find_map(|&(c, message)| (c == code).then_some(message))
        .unwrap_or("unknown error")
}

/// Resolves an executable before anything is spawned.
///
/// A bare name is looked up on `PATH`; anything else must be an existing
/// regular file.
///
/// # Errors
///
/// Returns `ValidationError::ExecutableNotFound` or `ValidationError::NotAFile`.
pub async fn validate_executable(executable: &Path) -> Result<PathBuf, ValidationError> {
    let is_bare = {
        let mut components = executable.components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    };

    if is_bare {
        let name = executable.to_string_lossy();
        return ProcessBuilder::find(&name).ok_or_else(|| ValidationError::ExecutableNotFound {
            name: name.into_owned(),
        });
    }

    match tokio::fs::metadata(executable).await {
        Ok(meta) if meta.is_file() => Ok(executable.to_path_buf()),
        Ok(_) => Err(ValidationError::NotAFile {
            path: executable.display().to_string(),
        }),
        Err(_) => Err(ValidationError::ExecutableNotFound {
            name: executable.display().to_string(),
        }),
    }
}

/// Checks that an input file exists and is a regular file.
///
/// # Errors
///
/// Returns `ValidationError::MissingFile` or `ValidationError::NotAFile`.
pub async fn validate_file(what: &'static str, path: &Path) -> Result<(), ValidationError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(ValidationError::NotAFile {
            path: path.display().to_string(),
        }),
        Err(_) => Err(ValidationError::MissingFile {
            what,
            path: path.display().to_string(),
        }),
    }
}

/// Maps a finished run onto the tool's error table.
fn check_exit(
    command: &str,
    output: &ProcessOutput,
    table: &[(i32, &'static str)],
) -> DropzoneResult<()> {
    if output.is_interrupted() {
        return Err(ProcessError::Interrupted {
            command: command.to_string(),
        }
        .into());
    }
    if output.exit_code() != 0 {
        if let Some(last) = output.stderr().lines().last() {
            warn!(
                process = command,
                code = output.exit_code(),
                stderr = %last,
                "tool reported an error"
            );
        }
        return Err(ProcessError::NonZeroExit {
            command: command.to_string(),
            code: output.exit_code(),
            message: exit_code_message(table, output.exit_code()).to_string(),
        }
        .into());
    }
    Ok(())
}
