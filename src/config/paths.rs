// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Path configuration.
//!
//! ```text
//! working_dir/
//!   dropzone.sqlite3   (database, unless overridden)
//!   <release_id>/      (per-release sandbox)
//!
//! dcs_working_dir      DestRoot::DcsWorkingDir
//! dcs_install_dir      DestRoot::DcsInstallDir
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// File name of the job store inside `working_dir`.
pub const DEFAULT_DATABASE_NAME: &str = "dropzone.sqlite3";

/// Filesystem roots used by the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root of the per-release sandboxes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Job store file (default: `working_dir/dropzone.sqlite3`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Saved-games directory links may target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcs_working_dir: Option<PathBuf>,
    /// Game installation directory links may target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcs_install_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Fill in the database default and anchor a relative database path.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::MissingKey` if `working_dir` is not set.
    pub fn resolve(&mut self) -> Result<()> {
        let working_dir = self.working_dir()?.to_path_buf();

        match &self.database {
            Some(db) if db.is_relative() => self.database = Some(working_dir.join(db)),
            None => self.database = Some(working_dir.join(DEFAULT_DATABASE_NAME)),
            _ => {}
        }

        Ok(())
    }

    /// Get the working directory, returning an error if not set.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::MissingKey` if `working_dir` is not set.
    pub fn working_dir(&self) -> Result<&Path> {
        self.working_dir
            .as_deref()
            .ok_or_else(|| missing("working_dir").into())
    }

    /// Get the database path.
    ///
    /// Falls back to the default location when [`resolve`](Self::resolve)
    /// has not run yet.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::MissingKey` if neither `database` nor
    /// `working_dir` is set.
    pub fn database(&self) -> std::result::Result<PathBuf, ConfigError> {
        if let Some(db) = &self.database {
            return Ok(db.clone());
        }
        self.working_dir
            .as_deref()
            .map(|dir| dir.join(DEFAULT_DATABASE_NAME))
            .ok_or_else(|| missing("working_dir"))
    }
}

fn missing(key: &str) -> ConfigError {
    ConfigError::MissingKey {
        section: "paths".to_string(),
        key: key.to_string(),
    }
}
