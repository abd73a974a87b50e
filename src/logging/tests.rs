// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_bounds() {
    assert!(LogLevel::new(6).is_ok());
    assert!(LogLevel::new(7).is_err());
    assert_eq!(LogLevel::from_u8(4), Some(LogLevel::DEBUG));
    assert_eq!(LogLevel::from_u8(42), None);
    assert_eq!(u8::from(LogLevel::WARN), 2);
}

#[test]
fn test_log_level_filters() {
    let filters: Vec<_> = (0..=6)
        .filter_map(LogLevel::from_u8)
        .map(LogLevel::to_filter_string)
        .collect();
    insta::assert_debug_snapshot!(filters, @r#"
    [
        "off",
        "error",
        "warn,sqlx=warn",
        "info,sqlx=warn",
        "debug,sqlx=warn",
        "trace,sqlx=warn",
        "trace",
    ]
    "#);
}

#[test]
fn test_log_level_tracing_mapping() {
    assert_eq!(LogLevel::SILENT.to_tracing_level(), None);
    assert_eq!(
        LogLevel::DUMP.to_tracing_level(),
        Some(tracing::Level::TRACE)
    );
}

#[test]
fn test_log_level_deserialize_rejects_out_of_range() {
    let ok: LogLevel = serde_json::from_str("5").unwrap();
    assert_eq!(ok, LogLevel::TRACE);
    assert!(serde_json::from_str::<LogLevel>("9").is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(!config.json_file());
}

#[test]
fn test_log_config_builder() {
    let config = LogConfig::builder()
        .with_console_level(LogLevel::WARN)
        .with_log_file("logs/dropzone.log".to_string())
        .with_json_file(true)
        .build();
    assert_eq!(config.console_level(), LogLevel::WARN);
    assert_eq!(config.log_file(), Some("logs/dropzone.log"));
    assert!(config.json_file());
}
