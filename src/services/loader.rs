//! Background loading of large files.
//!
//! The loader thread streams the file in fixed-size chunks, decodes them as
//! UTF-8 (invalid bytes become U+FFFD) and sends each decoded piece to the
//! main loop. A multi-byte character split across two chunks is carried over
//! to the next chunk. The token is checked before every send.

use crate::app::types::TabKey;
use crate::model::filesystem::FileSystem;
use crate::services::async_bridge::AsyncMessage;
use crate::services::cancellation::{CancellationToken, OperationId};
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Bytes read per chunk
pub const LOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Owned handle to one in-flight load
#[derive(Debug)]
pub struct LoadHandle {
    pub op: OperationId,
    token: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl LoadHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the worker to exit (used in tests)
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        // The worker only reads; it notices the token and exits on its own
        self.token.cancel();
    }
}

/// Start loading `path` for tab `key` on a worker thread
pub fn spawn_load(
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    key: TabKey,
    sender: Sender<AsyncMessage>,
) -> std::io::Result<LoadHandle> {
    let op = OperationId::next();
    let token = CancellationToken::new();
    let worker_token = token.clone();

    let thread = std::thread::Builder::new()
        .name(format!("load-{}", key.0))
        .spawn(move || {
            let error = match stream_file(fs.as_ref(), &path, &worker_token, |text| {
                sender
                    .send(AsyncMessage::LoadChunk { key, op, text })
                    .is_ok()
            }) {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            };
            if worker_token.is_cancelled() {
                tracing::debug!("Load of {:?} cancelled", path);
                return;
            }
            let _ = sender.send(AsyncMessage::LoadFinished { key, op, error });
        })?;

    Ok(LoadHandle {
        op,
        token,
        thread: Some(thread),
    })
}

/// Read `path` chunk by chunk, handing decoded text to `emit`.
///
/// Stops early when the token is cancelled or `emit` returns false.
pub fn stream_file(
    fs: &dyn FileSystem,
    path: &std::path::Path,
    token: &CancellationToken,
    mut emit: impl FnMut(String) -> bool,
) -> std::io::Result<()> {
    let mut reader = fs.open_reader(path)?;
    let mut buf = vec![0u8; LOAD_CHUNK_SIZE];
    let mut carry: Vec<u8> = Vec::new();

    loop {
        if token.is_cancelled() {
            return Ok(());
        }
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        carry.extend_from_slice(&buf[..n]);
        let (text, rest) = decode_prefix(&carry);
        let rest = rest.to_vec();
        if !text.is_empty() && (token.is_cancelled() || !emit(text)) {
            return Ok(());
        }
        carry = rest;
    }

    if !carry.is_empty() && !token.is_cancelled() {
        emit(String::from_utf8_lossy(&carry).into_owned());
    }
    Ok(())
}

/// Decode as much of `bytes` as possible, returning the undecoded tail.
///
/// Only an incomplete sequence at the very end is held back; invalid bytes
/// elsewhere are replaced.
fn decode_prefix(bytes: &[u8]) -> (String, &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), &bytes[bytes.len()..]),
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            (String::from_utf8_lossy(&bytes[..valid]).into_owned(), &bytes[valid..])
        }
        Err(_) => {
            // Invalid bytes in the middle; hold back only a truncated tail
            let tail_start = incomplete_tail_start(bytes);
            (
                String::from_utf8_lossy(&bytes[..tail_start]).into_owned(),
                &bytes[tail_start..],
            )
        }
    }
}

/// Start of a trailing, possibly incomplete, UTF-8 sequence
fn incomplete_tail_start(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=3.min(len) {
        let b = bytes[len - back];
        if b & 0b1100_0000 != 0b1000_0000 {
            let needed = if b >= 0xF0 {
                4
            } else if b >= 0xE0 {
                3
            } else if b >= 0xC0 {
                2
            } else {
                1
            };
            return if needed > back { len - back } else { len };
        }
    }
    len
}
