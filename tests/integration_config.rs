// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Tests the Config module with realistic TOML configurations.

use std::path::PathBuf;

use dropzone_rs::cli::global::GlobalOptions;
use dropzone_rs::cmd::config::load_config;
use dropzone_rs::config::Config;
use dropzone_rs::logging::LogLevel;

// =============================================================================
// Loading from TOML strings
// =============================================================================

#[test]
fn config_parse_minimal() {
    let config = Config::parse(
        r#"
[paths]
working_dir = "/srv/dz"
"#,
    )
    .unwrap();
    assert_eq!(
        config.paths.database,
        Some(PathBuf::from("/srv/dz/dropzone.sqlite3"))
    );
    assert_eq!(config.queue.max_attempts, 3);
    assert_eq!(config.global.output_log_level, LogLevel::INFO);
}

#[test]
fn config_parse_all_sections() {
    let config = Config::parse(
        r#"
[global]
output_log_level = 4
json_log = true

[paths]
working_dir = "/srv/dz"
database = "state/jobs.db"
dcs_working_dir = "/home/pilot/Saved Games/DCS"

[tools]
wget = "/usr/local/bin/wget"
7z = "/usr/bin/7zz"

[queue]
max_attempts = 5
retry_delay_secs = 10
"#,
    )
    .unwrap();

    assert_eq!(config.global.output_log_level, LogLevel::DEBUG);
    assert!(config.global.json_log);
    assert_eq!(
        config.paths.database,
        Some(PathBuf::from("/srv/dz/state/jobs.db"))
    );
    assert_eq!(
        config.paths.dcs_working_dir,
        Some(PathBuf::from("/home/pilot/Saved Games/DCS"))
    );
    assert_eq!(config.paths.dcs_install_dir, None);
    assert_eq!(config.tools.sevenz, PathBuf::from("/usr/bin/7zz"));
    assert_eq!(config.queue.max_attempts, 5);
    assert_eq!(config.queue.retry_delay_secs, 10);
    assert_eq!(config.queue.download_poll_secs, 30);
}

#[test]
fn config_unknown_section_rejected() {
    assert!(Config::parse("[task]\nmo_org = \"x\"\n").is_err());
}

#[test]
fn config_zero_poll_rejected() {
    let err = Config::parse("[queue]\nextract_poll_secs = 0\n").unwrap_err();
    assert!(err.to_string().contains("extract_poll_secs"), "{err}");
}

// =============================================================================
// CLI sources
// =============================================================================

#[test]
fn config_files_then_cli_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.toml");
    let host = dir.path().join("host.toml");
    std::fs::write(
        &base,
        "[paths]\nworking_dir = \"/srv/base\"\n[queue]\nmax_attempts = 4\n",
    )
    .unwrap();
    std::fs::write(&host, "[queue]\nmax_attempts = 6\nretry_delay_secs = 2\n").unwrap();

    let global = GlobalOptions {
        configs: vec![base, host],
        no_default_config: true,
        working_dir: Some(dir.path().join("work")),
        options: vec!["queue.retry_delay_secs=9".to_string()],
        ..Default::default()
    };
    let config = load_config(&global).unwrap();

    assert_eq!(config.queue.max_attempts, 6);
    assert_eq!(config.queue.retry_delay_secs, 9);
    assert_eq!(config.paths.working_dir, Some(dir.path().join("work")));
    assert_eq!(
        config.paths.database,
        Some(dir.path().join("work").join("dropzone.sqlite3"))
    );
}

#[test]
fn config_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let global = GlobalOptions {
        configs: vec![dir.path().join("absent.toml")],
        no_default_config: true,
        ..Default::default()
    };
    assert!(load_config(&global).is_err());
}

#[test]
fn config_malformed_set_fails() {
    let global = GlobalOptions {
        options: vec!["queue.max_attempts".to_string()],
        no_default_config: true,
        ..Default::default()
    };
    assert!(load_config(&global).is_err());
}
