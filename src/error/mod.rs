// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                DropzoneError (~24 bytes)
//!                        |
//!   +------+------+------+------+------+------+------+
//!   |      |      |      |      |      |      |      |
//!   v      v      v      v      v      v      v      v
//! Bail  Config Valid  Proc   Path  Store   Fs   Io/Other
//!        Box    Box    Box    Box   Box    Box   Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Config     ParseError, MissingKey, InvalidValue
//!   Validation ExecutableNotFound, NotAFile, MissingFile, InvalidUrl
//!   Process    SpawnFailed, NonZeroExit, Interrupted
//!   Path       EscapesRoot
//!   Store      Sqlx, MigrationChanged, ReleaseExists
//!   Fs         IoError
//!
//! All variants boxed => DropzoneError fits in 24 bytes.
//! ```
//!
//! Queue policy keys off the variant: `Validation` requeues without
//! spending an attempt, `Process` spends one, `Path` is never retried.

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`DropzoneError`].
pub type DropzoneResult<T> = std::result::Result<T, DropzoneError>;

/// Result type for the job store.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Top-level error type of the install core.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum DropzoneError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Pre-flight validation failed before any process was spawned.
    #[error("validation error: {0}")]
    Validation(#[from] Box<ValidationError>),

    /// External process failed or was aborted.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Path resolution error.
    #[error("path error: {0}")]
    Path(#[from] Box<PathError>),

    /// Job store error.
    #[error("store error: {0}")]
    Store(#[from] Box<StoreError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

impl DropzoneError {
    /// Returns true for errors raised before a job's process was started.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the computed path left its trusted root.
    #[must_use]
    pub fn is_path_escape(&self) -> bool {
        matches!(self, Self::Path(e) if matches!(**e, PathError::EscapesRoot { .. }))
    }

    /// Returns true for job input that can never succeed: an escaping
    /// path or an unparsable URL.
    #[must_use]
    pub fn is_rejected_input(&self) -> bool {
        self.is_path_escape()
            || matches!(
                self,
                Self::Validation(e) if matches!(**e, ValidationError::InvalidUrl { .. })
            )
    }
}

/// Create a fatal [`DropzoneError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> DropzoneError {
    DropzoneError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for DropzoneError {
                fn from(err: $error) -> Self {
                    DropzoneError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ConfigError => Config,
    ValidationError => Validation,
    ProcessError => Process,
    PathError => Path,
    StoreError => Store,
    FsError => Fs,
    std::io::Error => Io,
}

impl From<sqlx::Error> for DropzoneError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(Box::new(StoreError::Sqlx(err)))
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Validation Errors ---

/// Pre-flight failures detected before a process is spawned.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Executable could not be resolved.
    #[error("executable not found: '{name}'")]
    ExecutableNotFound { name: String },

    /// Path exists but is not a regular file.
    #[error("not a file: {path}")]
    NotAFile { path: String },

    /// Required input file does not exist.
    #[error("{what} does not exist: {path}")]
    MissingFile { what: &'static str, path: String },

    /// Download URL could not be parsed.
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a non-zero status.
    #[error("process '{command}' exited with code {code}: {message}")]
    NonZeroExit {
        command: String,
        code: i32,
        message: String,
    },

    /// Process was aborted through its cancellation token.
    #[error("process '{command}' was interrupted")]
    Interrupted { command: String },

    /// Failed to wait for or read from the process.
    #[error("failed to read output from process '{command}': {message}")]
    OutputError { command: String, message: String },
}

// --- Path Errors ---

/// Path resolution errors.
#[derive(Debug, Error)]
pub enum PathError {
    /// Joined path resolved outside of its trusted root.
    #[error("path '{path}' escapes root '{root}'")]
    EscapesRoot { root: String, path: String },
}

// --- Store Errors ---

/// Job store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error from sqlx.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// JSON column could not be encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An applied migration's content no longer matches its recorded hash.
    #[error("migration '{name}' was modified after being applied (recorded {recorded}, found {found})")]
    MigrationChanged {
        name: String,
        recorded: String,
        found: String,
    },

    /// Release is already persisted.
    #[error("release '{0}' already exists")]
    ReleaseExists(String),

    /// Release is unknown.
    #[error("release '{0}' not found")]
    ReleaseNotFound(String),

    /// Column held a value outside its domain.
    #[error("invalid {column} value '{value}'")]
    InvalidValue { column: &'static str, value: String },
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.display().to_string(),
            source,
        }
    }
}
