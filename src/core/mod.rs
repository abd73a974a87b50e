// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core process management.
//!
//! ```text
//!     core
//!       |
//!    process
//!       |
//!  Builder  Output  segment reader
//! ```

pub mod process;
