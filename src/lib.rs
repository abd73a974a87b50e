// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |        serve / install / list ...
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |   config      daemon      |
//!              '-------------+-------------'
//!                            |
//!                   subscription (lifecycle)
//!                     |               |
//!                     v               v
//!                  install          toggle
//!                 (assets)      (symlinks, paths)
//!                     |
//!             +-------+-------+
//!             v               v
//!       queue::download  queue::extract
//!             |               |
//!             v               v
//!      tools::downloader tools::extractor
//!
//!   +-------------------------------------------+
//!   |  store   SQLite jobs, releases, migrations |
//!   +-------------------------------------------+
//!   |  core    process     model    paths        |
//!   +-------------------------------------------+
//!   |  foundation   error, logging               |
//!   +-------------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod daemon;
pub mod error;
pub mod install;
pub mod logging;
pub mod model;
pub mod paths;
pub mod queue;
pub mod store;
pub mod subscription;
pub mod toggle;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_utils;
