// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process builder with configuration options.
//!
//! ```text
//! ProcessBuilder
//!  • new/find
//!  • arg/flag/name/on_output
//!  • capture_stderr
//!
//! ProcessFlags: ALLOW_FAILURE
//! StreamFlags: FORWARD_TO_LOG (default), KEEP_IN_STRING
//! ```

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Static cache for executable paths resolved via `which`.
static EXECUTABLE_CACHE: OnceLock<RwLock<BTreeMap<String, PathBuf>>> = OnceLock::new();

fn exe_cache() -> &'static RwLock<BTreeMap<String, PathBuf>> {
    EXECUTABLE_CACHE.get_or_init(|| RwLock::new(BTreeMap::new()))
}

bitflags! {
    /// Flags controlling process execution behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcessFlags: u32 {
        /// Don't fail if the process exits with a non-zero status
        const ALLOW_FAILURE = 0x01;
    }
}

bitflags! {
    /// Flags controlling how a piped stream is consumed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StreamFlags: u32 {
        /// Forward output to tracing logs
        const FORWARD_TO_LOG = 0x01;
        /// Keep output in a string for later retrieval
        const KEEP_IN_STRING = 0x02;
    }
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self::FORWARD_TO_LOG
    }
}

/// Which pipe an output segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub(super) const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Callback invoked for every output segment of a piped stream.
///
/// Segments end at `\n`, `\r` or backspace so tools that redraw a progress
/// counter in place still deliver each update.
pub type OutputHandler = Arc<dyn Fn(OutputStream, &str) + Send + Sync>;

/// Output from a completed process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    exit_code: i32,
    stderr: String,
    interrupted: bool,
}

impl ProcessOutput {
    pub(super) const fn new(exit_code: i32, stderr: String, interrupted: bool) -> Self {
        Self {
            exit_code,
            stderr,
            interrupted,
        }
    }

    /// Returns the process exit code (0 = success, -1 if killed by a signal).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns captured stderr (see [`ProcessBuilder::capture_stderr`]).
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Returns whether the process was killed through its cancellation token.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.interrupted
    }
}

/// Builder for configuring and running a process.
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    flags: ProcessFlags,
    stdout: StreamFlags,
    stderr: StreamFlags,
    name: Option<String>,
    on_output: Option<OutputHandler>,
}

impl fmt::Debug for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessBuilder")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("flags", &self.flags)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("name", &self.name)
            .field("on_output", &self.on_output.is_some())
            .finish()
    }
}

impl ProcessBuilder {
    /// Creates a new `ProcessBuilder` for the given program.
    ///
    /// The program can be an absolute path, relative path, or just the
    /// executable name; a bare name is resolved by the OS at spawn time.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            flags: ProcessFlags::empty(),
            stdout: StreamFlags::default(),
            stderr: StreamFlags::default(),
            name: None,
            on_output: None,
        }
    }

    /// Finds the full path to an executable in PATH.
    ///
    /// Hits are cached for the lifetime of the process; misses are not, so a
    /// tool installed while the daemon runs is picked up on the next retry.
    #[must_use]
    pub fn find(program: &str) -> Option<PathBuf> {
        {
            let cache = exe_cache().read().unwrap_or_else(PoisonError::into_inner);
            if let Some(path) = cache.get(program) {
                return Some(path.clone());
            }
        }

        let path = which::which(program).ok()?;
        exe_cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(program.to_string(), path.clone());
        Some(path)
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: ProcessFlags) -> Self {
        self.flags |= flag;
        self
    }

    /// Keeps stderr in [`ProcessOutput::stderr`] as well as logging it.
    #[must_use]
    pub const fn capture_stderr(mut self) -> Self {
        self.stderr = StreamFlags::FORWARD_TO_LOG.union(StreamFlags::KEEP_IN_STRING);
        self
    }

    /// Sets a display name for logging and errors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers a handler for every output segment of the piped streams.
    #[must_use]
    pub fn on_output(mut self, handler: OutputHandler) -> Self {
        self.on_output = Some(handler);
        self
    }

    pub(super) const fn program(&self) -> &PathBuf {
        &self.program
    }

    pub(super) fn args_slice(&self) -> &[String] {
        &self.args
    }

    pub(super) const fn process_flags(&self) -> ProcessFlags {
        self.flags
    }

    pub(super) const fn stdout_config(&self) -> StreamFlags {
        self.stdout
    }

    pub(super) const fn stderr_config(&self) -> StreamFlags {
        self.stderr
    }

    pub(super) fn output_handler(&self) -> Option<OutputHandler> {
        self.on_output.clone()
    }

    pub(super) fn name_override(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
