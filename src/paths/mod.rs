// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sandboxed path resolution.
//!
//! ```text
//! secure_join(root, child)
//!   normalize(root)            lexical: drop ".", fold ".."
//!   normalize(root.join(child)) absolute/drive child replaces root
//!   strip_prefix(root)
//!     ""   --> root
//!     rel  --> root/rel
//!     Err  --> PathError::EscapesRoot
//!
//! PathService
//!   release_dir(id)        secure_join(working_dir, id)
//!   dest_root(root)        configured DCS_* directory
//!   link_source/link_destination
//! ```
//!
//! Nothing here touches the filesystem, so symlinks already inside a root
//! are not followed.

use std::path::{Component, Path, PathBuf};

use crate::config::PathsConfig;
use crate::error::{ConfigError, DropzoneResult, PathError};
use crate::model::DestRoot;

/// Lexically normalizes a path.
///
/// `..` folds into the preceding normal component, is dropped directly under
/// a root, and is kept at the front of a relative path.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves `child` against `root`, refusing anything outside of `root`.
///
/// # Errors
///
/// Returns `PathError::EscapesRoot` if the resolved path is not `root` or a
/// descendant of it, including when `child` is absolute elsewhere or
/// carries another drive.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use dropzone_rs::paths::secure_join;
///
/// let joined = secure_join(Path::new("/base"), "sub/dir").unwrap();
/// assert_eq!(joined, Path::new("/base/sub/dir"));
/// assert!(secure_join(Path::new("/base"), "../../etc").is_err());
/// ```
pub fn secure_join(root: &Path, child: impl AsRef<Path>) -> DropzoneResult<PathBuf> {
    let child = child.as_ref();
    let root = normalize(root);
    let resolved = normalize(&root.join(child));

    match resolved.strip_prefix(&root) {
        Ok(rel) if rel.as_os_str().is_empty() => Ok(root),
        Ok(rel) if matches!(rel.components().next(), Some(Component::ParentDir)) => {
            Err(escapes(&root, child))
        }
        Ok(_) => Ok(resolved),
        Err(_) => Err(escapes(&root, child)),
    }
}

fn escapes(root: &Path, child: &Path) -> crate::error::DropzoneError {
    PathError::EscapesRoot {
        root: root.display().to_string(),
        path: child.display().to_string(),
    }
    .into()
}

/// Maps release ids and destination roots to real directories.
#[derive(Debug, Clone)]
pub struct PathService {
    working_dir: PathBuf,
    dcs_working_dir: Option<PathBuf>,
    dcs_install_dir: Option<PathBuf>,
}

impl PathService {
    #[must_use]
    pub fn new(
        working_dir: impl Into<PathBuf>,
        dcs_working_dir: Option<PathBuf>,
        dcs_install_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            dcs_working_dir,
            dcs_install_dir,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if `paths.working_dir` is unset.
    pub fn from_config(paths: &PathsConfig) -> DropzoneResult<Self> {
        let working_dir = paths
            .working_dir
            .clone()
            .ok_or_else(|| missing_key("working_dir"))?;
        Ok(Self::new(
            working_dir,
            paths.dcs_working_dir.clone(),
            paths.dcs_install_dir.clone(),
        ))
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The release's private sandbox, `{working_dir}/{release_id}`.
    ///
    /// # Errors
    ///
    /// Returns `PathError::EscapesRoot` for ids such as `..` that would
    /// leave the working directory, and for an empty id.
    pub fn release_dir(&self, release_id: &str) -> DropzoneResult<PathBuf> {
        let dir = secure_join(&self.working_dir, release_id)?;
        if dir == normalize(&self.working_dir) {
            return Err(escapes(&self.working_dir, Path::new(release_id)));
        }
        Ok(dir)
    }

    /// The directory configured for `root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if the root is not configured.
    pub fn dest_root(&self, root: DestRoot) -> DropzoneResult<&Path> {
        let dir = match root {
            DestRoot::DcsWorkingDir => self.dcs_working_dir.as_deref(),
            DestRoot::DcsInstallDir => self.dcs_install_dir.as_deref(),
        };
        dir.ok_or_else(|| missing_key(root.config_key()))
    }

    /// Absolute source of a link inside the release sandbox.
    ///
    /// # Errors
    ///
    /// Returns `PathError::EscapesRoot` if `src` leaves the sandbox.
    pub fn link_source(&self, release_id: &str, src: &str) -> DropzoneResult<PathBuf> {
        secure_join(&self.release_dir(release_id)?, src)
    }

    /// Absolute destination of a link inside its destination root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` for an unconfigured root and
    /// `PathError::EscapesRoot` if `dest` leaves it.
    pub fn link_destination(&self, root: DestRoot, dest: &str) -> DropzoneResult<PathBuf> {
        secure_join(self.dest_root(root)?, dest)
    }
}

fn missing_key(key: &str) -> crate::error::DropzoneError {
    ConfigError::MissingKey {
        section: "paths".to_string(),
        key: key.to_string(),
    }
    .into()
}
