// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing.
//!
//! Tests the CLI module with realistic command-line argument patterns.

use std::path::PathBuf;

use clap::Parser;
use dropzone_rs::cli::global::GlobalOptions;
use dropzone_rs::cli::{Cli, Command};

// =============================================================================
// Version Command
// =============================================================================

#[test]
fn cli_version_command() {
    let cli = Cli::try_parse_from(["dropzone", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn cli_version_alias() {
    let cli = Cli::try_parse_from(["dropzone", "-v"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn cli_no_command() {
    let cli = Cli::try_parse_from(["dropzone"]).unwrap();
    assert!(cli.command.is_none());
}

// =============================================================================
// Release Commands
// =============================================================================

#[test]
fn cli_install_descriptor() {
    let cli = Cli::try_parse_from(["dropzone", "install", "releases/mod-a.json"]).unwrap();
    match cli.command {
        Some(Command::Install(args)) => {
            assert_eq!(args.descriptor, PathBuf::from("releases/mod-a.json"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn cli_install_requires_descriptor() {
    assert!(Cli::try_parse_from(["dropzone", "install"]).is_err());
}

#[test]
fn cli_enable_and_disable() {
    let enable = Cli::try_parse_from(["dropzone", "enable", "r1"]).unwrap();
    assert!(matches!(enable.command, Some(Command::Enable(ref a)) if a.release_id == "r1"));

    let disable = Cli::try_parse_from(["dropzone", "disable", "r1"]).unwrap();
    assert!(matches!(disable.command, Some(Command::Disable(ref a)) if a.release_id == "r1"));
}

#[test]
fn cli_list_watch_interval() {
    let cli = Cli::try_parse_from(["dropzone", "list", "--watch", "--interval", "5"]).unwrap();
    match cli.command {
        Some(Command::List(args)) => {
            assert!(args.watch);
            assert_eq!(args.interval, 5);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn cli_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["dropzone", "build"]).is_err());
}

// =============================================================================
// Global Options
// =============================================================================

#[test]
fn cli_global_options() {
    let cli = Cli::try_parse_from([
        "dropzone",
        "-c",
        "base.toml",
        "--config",
        "host.toml",
        "--log-level",
        "5",
        "--no-default-config",
        "serve",
    ])
    .unwrap();
    assert!(matches!(cli.command, Some(Command::Serve)));
    assert_eq!(
        cli.global.configs,
        [PathBuf::from("base.toml"), PathBuf::from("host.toml")]
    );
    assert_eq!(cli.global.log_level, Some(5));
    assert!(cli.global.no_default_config);
}

#[test]
fn cli_log_level_out_of_range() {
    assert!(Cli::try_parse_from(["dropzone", "-l", "7", "serve"]).is_err());
}

#[test]
fn cli_global_options_to_config_overrides() {
    let opts = GlobalOptions {
        log_level: Some(2),
        file_log_level: Some(5),
        log_file: Some(PathBuf::from("/var/log/dropzone.log")),
        working_dir: Some(PathBuf::from("/srv/dz")),
        options: vec!["queue.retry_delay_secs=5".to_string()],
        ..Default::default()
    };

    let overrides = opts.to_config_overrides();
    assert_eq!(
        overrides,
        [
            "queue.retry_delay_secs=5",
            "global.output_log_level=2",
            "global.file_log_level=5",
            "global.log_file=/var/log/dropzone.log",
            "paths.working_dir=/srv/dz",
        ]
    );
}

#[test]
fn cli_empty_overrides() {
    assert!(GlobalOptions::default().to_config_overrides().is_empty());
}
