// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release data model.
//!
//! ```text
//! ReleaseDescriptor (JSON, camelCase)
//!   releaseId modId modName version dependencies[]
//!   assets[]          { id, name, isArchive, urls[] }
//!   symbolicLinks[]   { name, src, dest, destRoot }
//!   missionScripts[]  { name, purpose, path, root, runOn }
//!        |
//!        v  SubscriptionRepository::save
//! Release + Asset + SymbolicLink + MissionScript rows
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{DropzoneResult, StoreError};

/// Named filesystem location a link may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DestRoot {
    /// The game's saved-games directory.
    DcsWorkingDir,
    /// The game's installation directory.
    DcsInstallDir,
}

impl DestRoot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DcsWorkingDir => "DCS_WORKING_DIR",
            Self::DcsInstallDir => "DCS_INSTALL_DIR",
        }
    }

    /// Configuration key holding this root's directory.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::DcsWorkingDir => "dcs_working_dir",
            Self::DcsInstallDir => "dcs_install_dir",
        }
    }
}

impl fmt::Display for DestRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestRoot {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DCS_WORKING_DIR" => Ok(Self::DcsWorkingDir),
            "DCS_INSTALL_DIR" => Ok(Self::DcsInstallDir),
            other => Err(StoreError::InvalidValue {
                column: "dest_root",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DestRoot {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A specific version of a mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub release_id: String,
    pub mod_id: String,
    pub mod_name: String,
    pub version: String,
    #[sqlx(json)]
    pub dependencies: Vec<String>,
}

/// One downloadable unit of a release.
///
/// Several URLs model the parts of a split archive (`.7z.001`, `.7z.002`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub is_archive: bool,
    #[sqlx(json)]
    pub urls: Vec<String>,
}

/// Link requested by a release descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolicLinkSpec {
    pub name: String,
    /// Relative to the release sandbox.
    pub src: String,
    /// Relative to `dest_root`.
    pub dest: String,
    pub dest_root: DestRoot,
}

/// Persisted link with its install state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SymbolicLink {
    pub id: i64,
    pub release_id: String,
    pub name: String,
    pub src: String,
    pub dest: String,
    #[sqlx(try_from = "String")]
    pub dest_root: DestRoot,
    /// Set only while the link exists on disk.
    pub installed_path: Option<String>,
}

impl SymbolicLink {
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.installed_path.is_some()
    }
}

/// Mission script carried as release metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MissionScript {
    pub name: String,
    pub purpose: String,
    pub path: String,
    #[sqlx(try_from = "String")]
    pub root: DestRoot,
    pub run_on: String,
}

/// Install request for one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDescriptor {
    pub release_id: String,
    pub mod_id: String,
    pub mod_name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub symbolic_links: Vec<SymbolicLinkSpec>,
    #[serde(default)]
    pub mission_scripts: Vec<MissionScript>,
}

impl ReleaseDescriptor {
    /// Parse and validate a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Json` for malformed JSON and
    /// `StoreError::InvalidValue` for an empty release id or a duplicated
    /// asset id.
    pub fn from_json(json: &str) -> DropzoneResult<Self> {
        let descriptor: Self = serde_json::from_str(json).map_err(StoreError::from)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks the identifiers the store keys on.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidValue` for an empty release id or a
    /// duplicated asset id.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.release_id.trim().is_empty() {
            return Err(StoreError::InvalidValue {
                column: "release_id",
                value: self.release_id.clone(),
            });
        }
        let mut seen = BTreeSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.id.as_str()) {
                return Err(StoreError::InvalidValue {
                    column: "asset_id",
                    value: asset.id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn release(&self) -> Release {
        Release {
            release_id: self.release_id.clone(),
            mod_id: self.mod_id.clone(),
            mod_name: self.mod_name.clone(),
            version: self.version.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

/// Lifecycle summary shown by `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    /// Jobs exist but none is running.
    Queued,
    Downloading,
    Extracting,
    /// A job exhausted its attempts.
    Stalled,
    /// All jobs finished, links not installed.
    Ready,
    /// Every link is installed.
    Enabled,
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Downloading => "DOWNLOADING",
            Self::Extracting => "EXTRACTING",
            Self::Stalled => "STALLED",
            Self::Ready => "READY",
            Self::Enabled => "ENABLED",
        };
        f.write_str(s)
    }
}

/// One row of `listInstalled`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledRelease {
    pub mod_id: String,
    pub release_id: String,
    pub mod_name: String,
    pub version: String,
    pub status: ReleaseStatus,
    pub progress_percent: f64,
    pub enabled: bool,
}
