// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release command arguments.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the `install` command.
#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Release descriptor (JSON).
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: PathBuf,
}

/// Arguments for commands acting on one release.
#[derive(Debug, Clone, Args)]
pub struct ReleaseArgs {
    /// Release identifier.
    #[arg(value_name = "RELEASE_ID")]
    pub release_id: String,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Keeps redrawing per-release progress bars until every release
    /// settles or Ctrl-C is pressed.
    #[arg(long, conflicts_with = "json")]
    pub watch: bool,

    /// Prints the list as JSON.
    #[arg(long)]
    pub json: bool,

    /// Seconds between redraws with --watch.
    #[arg(long, value_name = "SECS", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}
