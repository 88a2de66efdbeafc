//! Async Bridge: communication between worker threads and the sync main loop
//!
//! Worker threads (large-file loaders, file watchers) never touch session
//! state. They send [`AsyncMessage`]s over a `std::sync::mpsc` channel and the
//! main loop drains it in `Session::pump`, so every state change happens on
//! the main thread.

use crate::app::types::TabKey;
use crate::services::cancellation::OperationId;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

/// Raw file-system event kinds the reconciler cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Changed,
    Deleted,
    Renamed,
}

/// Messages sent from worker threads to the main loop
#[derive(Debug)]
pub enum AsyncMessage {
    /// Decoded text read by a background load
    LoadChunk {
        key: TabKey,
        op: OperationId,
        text: String,
    },

    /// A background load ended; `error` is set when reading failed
    LoadFinished {
        key: TabKey,
        op: OperationId,
        error: Option<String>,
    },

    /// A watched file changed on disk; `observed_at` is when the watcher saw it
    FileEvent {
        path: PathBuf,
        kind: FileEventKind,
        observed_at: Instant,
    },
}

/// Bridge between worker threads and the main loop
#[derive(Debug)]
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    receiver: mpsc::Receiver<AsyncMessage>,
}

impl AsyncBridge {
    /// Create a new async bridge with an unbounded channel
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Get a cloneable sender for worker threads
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// Receive all pending messages without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        self.receiver.try_iter().collect()
    }

    /// Block until a message arrives or `timeout` passes
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<AsyncMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
