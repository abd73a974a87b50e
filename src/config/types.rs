// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for dropzone-rs.
//!
//! ```text
//! Config: GlobalConfig, PathsConfig, ToolsConfig, QueueConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stdout output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file.
    pub log_file: PathBuf,
    /// Write the log file as JSON lines instead of plain text.
    pub json_log: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: PathBuf::from("dropzone.log"),
            json_log: false,
        }
    }
}

/// External executables.
///
/// Bare names are looked up on `PATH`, anything with a separator must point
/// at an existing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// wget-compatible downloader.
    pub wget: PathBuf,
    /// 7-Zip compatible archiver.
    #[serde(rename = "7z")]
    pub sevenz: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                wget: PathBuf::from("wget.exe"),
                sevenz: PathBuf::from("7z.exe"),
            }
        } else {
            Self {
                wget: PathBuf::from("wget"),
                sevenz: PathBuf::from("7z"),
            }
        }
    }
}

/// Retry and scheduling settings shared by both job queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Attempts before a job is left stalled.
    pub max_attempts: u32,
    /// Backoff applied to a job after a failed attempt.
    pub retry_delay_secs: u64,
    /// Safety-net poll of the download queue.
    pub download_poll_secs: u64,
    /// Poll of the extract queue; dependencies complete without waking it.
    pub extract_poll_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 30,
            download_poll_secs: 30,
            extract_poll_secs: 1,
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    #[must_use]
    pub const fn download_poll(&self) -> Duration {
        Duration::from_secs(self.download_poll_secs)
    }

    #[must_use]
    pub const fn extract_poll(&self) -> Duration {
        Duration::from_secs(self.extract_poll_secs)
    }

    /// Reject settings the scheduler cannot honour.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero attempt budget or poll
    /// interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            section: "queue".to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.download_poll_secs == 0 {
            return Err(invalid("download_poll_secs", "must be at least 1"));
        }
        if self.extract_poll_secs == 0 {
            return Err(invalid("extract_poll_secs", "must be at least 1"));
        }
        Ok(())
    }
}
