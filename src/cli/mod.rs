// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for dropzone-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! dropzone [global options] <command>
//! serve
//! install <descriptor.json>
//! remove | enable | disable <release-id>
//! list [--watch] [--json]
//! options
//! version
//! ```

pub mod global;
pub mod release;


use crate::cli::global::GlobalOptions;
use crate::cli::release::{InstallArgs, ListArgs, ReleaseArgs};
use clap::{Parser, Subcommand};

/// Dropzone install daemon
///
/// Queues mod release downloads, extracts their archives and toggles their
/// symbolic links.
#[derive(Debug, Parser)]
#[command(
    name = "dropzone",
    author,
    version,
    about = "Dropzone Install Daemon",
    long_about = "dropzone-rs Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Run `dropzone serve` to process queued downloads and\n\
                  extractions. The other commands edit the job store and\n\
                  return immediately; a running `serve` picks their jobs up.",
    after_help = "CONFIGURATION:\n\n\
                  dropzone reads `dropzone.toml` from the current directory if it\n\
                  exists, then every --config file in order, then DROPZONE_*\n\
                  environment variables (DROPZONE_PATHS__WORKING_DIR=...), then\n\
                  --set options. Later sources override earlier ones."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Runs the download and extract queues until interrupted.
    Serve,

    /// Adds a release from its JSON descriptor and queues its assets.
    Install(InstallArgs),

    /// Cancels a release's jobs, removes its links and deletes its files.
    Remove(ReleaseArgs),

    /// Creates a release's symbolic links.
    Enable(ReleaseArgs),

    /// Removes a release's symbolic links.
    Disable(ReleaseArgs),

    /// Lists installed releases with their status.
    List(ListArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
