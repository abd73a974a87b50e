// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning and management.
//!
//! ```text
//! ProcessBuilder::new("wget")
//!   .arg() .flag() .on_output() .capture_stderr()
//!   .run() / .run_with_cancellation()
//!       --> tokio::process::Command
//!           stream stdout/stderr as \n \r \b separated segments
//!       --> ProcessOutput { exit_code, stderr, interrupted }
//! ```

pub mod builder;
mod io;
mod runner;
