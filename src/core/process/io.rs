// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! I/O streaming and output capture for processes.
//!
//! ```text
//! run_child(token)
//!   stdout/stderr reader tasks
//!     bytes --split on \n \r \b--> segments
//!       trace! / on_output handler / kept string
//!   wait (or cancel --> kill)
//!   --> ProcessOutput { exit_code, stderr, interrupted }
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::builder::{OutputHandler, OutputStream, ProcessBuilder, ProcessOutput, StreamFlags};

const BACKSPACE: u8 = 0x08;

/// True for bytes that end an output segment.
pub(super) const fn is_segment_break(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r' | BACKSPACE)
}

/// Per-stream reader state.
struct SegmentSink {
    flags: StreamFlags,
    stream: OutputStream,
    process_name: String,
    handler: Option<OutputHandler>,
    kept: String,
}

impl SegmentSink {
    fn emit(&mut self, raw: &mut Vec<u8>) {
        if raw.is_empty() {
            return;
        }
        let segment = String::from_utf8_lossy(raw).into_owned();
        raw.clear();

        if segment.trim().is_empty() {
            return;
        }
        if self.flags.contains(StreamFlags::FORWARD_TO_LOG) {
            trace!(
                process = %self.process_name,
                stream = self.stream.as_str(),
                line = %segment,
                "output"
            );
        }
        if let Some(handler) = &self.handler {
            handler(self.stream, &segment);
        }
        if self.flags.contains(StreamFlags::KEEP_IN_STRING) {
            if !self.kept.is_empty() {
                self.kept.push('\n');
            }
            self.kept.push_str(&segment);
        }
    }
}

/// Reads a stream to EOF, returning whatever was kept.
async fn read_stream<R>(reader: R, mut sink: SegmentSink) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut pending = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if is_segment_break(byte) {
                        sink.emit(&mut pending);
                    } else {
                        pending.push(byte);
                    }
                }
            }
            Err(e) => {
                warn!(
                    process = %sink.process_name,
                    stream = sink.stream.as_str(),
                    error = %e,
                    "error reading stream"
                );
                break;
            }
        }
    }
    sink.emit(&mut pending);
    sink.kept
}

fn spawn_reader<R>(
    reader: Option<R>,
    flags: StreamFlags,
    stream: OutputStream,
    process_name: &str,
    handler: Option<OutputHandler>,
) -> Option<JoinHandle<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let sink = SegmentSink {
        flags,
        stream,
        process_name: process_name.to_string(),
        handler,
        kept: String::new(),
    };
    reader.map(|reader| tokio::spawn(read_stream(reader, sink)))
}

/// Collects a reader's kept output.
///
/// After a kill, a grandchild may still hold the pipe open, so interrupted
/// runs abort their readers instead of waiting for EOF.
async fn finish_reader(handle: Option<JoinHandle<String>>, interrupted: bool) -> String {
    match handle {
        Some(handle) if interrupted => {
            handle.abort();
            String::new()
        }
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

impl ProcessBuilder {
    /// Streams the child's output and waits for it to exit or be cancelled.
    pub(super) async fn run_child(
        &self,
        name: &str,
        child: &mut Child,
        token: &CancellationToken,
    ) -> std::io::Result<ProcessOutput> {
        let handler = self.output_handler();
        let stdout_handle = spawn_reader(
            child.stdout.take(),
            self.stdout_config(),
            OutputStream::Stdout,
            name,
            handler.clone(),
        );
        let stderr_handle = spawn_reader(
            child.stderr.take(),
            self.stderr_config(),
            OutputStream::Stderr,
            name,
            handler,
        );

        let (exit_status, interrupted) = tokio::select! {
            status = child.wait() => (status?, false),
            () = token.cancelled() => {
                warn!(process = %name, "cancellation requested, terminating process");
                child.kill().await.ok();
                (child.wait().await?, true)
            }
        };

        // stdout is never kept; draining it only finishes the handler calls
        finish_reader(stdout_handle, interrupted).await;
        let stderr = finish_reader(stderr_handle, interrupted).await;

        Ok(ProcessOutput::new(
            exit_status.code().unwrap_or(-1),
            stderr,
            interrupted,
        ))
    }
}
