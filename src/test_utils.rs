// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared test utilities.
//!
//! Provides log capture and a sample release descriptor.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::model::{Asset, DestRoot, ReleaseDescriptor, SymbolicLinkSpec};

#[derive(Clone)]
struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| std::io::Error::other("buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
struct BufferMakeWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for BufferMakeWriter {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter {
            buffer: self.buffer.clone(),
        }
    }
}

/// Runs an async closure while capturing `WARN` and above.
///
/// The subscriber is thread-local, so only `#[tokio::test]` (current
/// thread) runtimes see every event.
pub(crate) async fn capture_warnings<F, Fut, T>(f: F) -> (T, String)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(BufferMakeWriter {
            buffer: buffer.clone(),
        })
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .finish();

    let _guard = tracing::subscriber::set_default(subscriber);
    let value = f().await;

    let logs = buffer
        .lock()
        .map(|guard| String::from_utf8_lossy(&guard).to_string())
        .unwrap_or_default();
    (value, logs)
}

/// Release with one split archive, one plain file and one link.
pub(crate) fn sample_descriptor(release_id: &str) -> ReleaseDescriptor {
    ReleaseDescriptor {
        release_id: release_id.to_string(),
        mod_id: "mod-a".to_string(),
        mod_name: "Mod A".to_string(),
        version: "1.0.0".to_string(),
        dependencies: Vec::new(),
        assets: vec![
            Asset {
                id: "main".to_string(),
                name: "Main".to_string(),
                is_archive: true,
                urls: vec![
                    "https://cdn.example/part.7z.001".to_string(),
                    "https://cdn.example/part.7z.002".to_string(),
                ],
            },
            Asset {
                id: "readme".to_string(),
                name: "Readme".to_string(),
                is_archive: false,
                urls: vec!["https://cdn.example/README.txt".to_string()],
            },
        ],
        symbolic_links: vec![SymbolicLinkSpec {
            name: "liveries".to_string(),
            src: "Liveries".to_string(),
            dest: "Liveries/mod-a".to_string(),
            dest_root: DestRoot::DcsWorkingDir,
        }],
        mission_scripts: Vec::new(),
    }
}
