// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::{ExtractorTool, SEVENZIP_EXIT_CODES};
use crate::error::{DropzoneError, ValidationError};
use crate::tools::{ToolContext, exit_code_message};

#[test]
fn test_output_switch() {
    insta::assert_snapshot!(
        ExtractorTool::output_switch(Path::new("/srv/dz/rel-1")),
        @"-o/srv/dz/rel-1"
    );
}

#[test]
fn test_sevenzip_exit_codes() {
    assert_eq!(exit_code_message(SEVENZIP_EXIT_CODES, 2), "fatal error");
    assert_eq!(
        exit_code_message(SEVENZIP_EXIT_CODES, 255),
        "user stopped the process"
    );
    assert_eq!(
        exit_code_message(SEVENZIP_EXIT_CODES, 1),
        "warning (non-fatal error)"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_missing_archive_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let ctx = ToolContext::new(
        CancellationToken::new(),
        Arc::new(move |p| sink.lock().unwrap().push(p.percent)),
    );

    // any resolvable executable passes the first check
    let tool = ExtractorTool::new("sh");
    let err = tool
        .extract(&dir.path().join("missing.7z"), &dir.path().join("out"), &ctx)
        .await
        .unwrap_err();

    match err {
        DropzoneError::Validation(e) => {
            assert!(matches!(*e, ValidationError::MissingFile { what: "archive", .. }));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(reports.lock().unwrap().is_empty(), "nothing should be spawned");
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_missing_executable_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.7z");
    std::fs::write(&archive, b"7z").unwrap();

    let err = ExtractorTool::new(dir.path().join("no-7z"))
        .extract(&archive, dir.path(), &ToolContext::detached())
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_extraction_logs_tool_error() {
    use std::os::unix::fs::PermissionsExt;

    use crate::error::ProcessError;
    use crate::test_utils::capture_warnings;

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.7z");
    std::fs::write(&archive, b"7z").unwrap();
    let fake = dir.path().join("7z");
    std::fs::write(&fake, "#!/bin/sh\necho 'ERROR: a.7z : Data Error' >&2\nexit 2\n").unwrap();
    std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

    let tool = ExtractorTool::new(&fake);
    let out = dir.path().join("out");
    let ctx = ToolContext::detached();
    let (result, logs) = capture_warnings(|| tool.extract(&archive, &out, &ctx)).await;

    match result.unwrap_err() {
        DropzoneError::Process(e) => {
            assert!(matches!(*e, ProcessError::NonZeroExit { code: 2, .. }), "{e}");
        }
        other => panic!("expected process error, got {other:?}"),
    }
    assert!(logs.contains("Data Error"), "{logs}");
}
