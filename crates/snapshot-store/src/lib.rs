//! Latest-snapshot storage shared between the poller and the metrics endpoint.
//!
//! The store is a `watch` channel holding an `Arc` to an immutable snapshot.
//! Replacing it swaps the pointer, so a reader sees either the old or the new
//! snapshot in full.

use std::sync::Arc;

use tokio::sync::watch;
use types::NormalizedSnapshot;

pub type SharedSnapshot = Arc<NormalizedSnapshot>;

/// Creates an empty store and returns its unique writer plus a reader.
pub fn channel() -> (SnapshotWriter, SnapshotReader) {
    let (tx, rx) = watch::channel(None);
    (SnapshotWriter { tx }, SnapshotReader { rx })
}

/// The single write handle. Not `Clone`: only the poller owns it.
#[derive(Debug)]
pub struct SnapshotWriter {
    tx: watch::Sender<Option<SharedSnapshot>>,
}

impl SnapshotWriter {
    pub fn replace(&self, snapshot: NormalizedSnapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    pub fn current(&self) -> Option<SharedSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Option<SharedSnapshot>>,
}

impl SnapshotReader {
    /// Most recent successful snapshot, or `None` before the first one.
    pub fn current(&self) -> Option<SharedSnapshot> {
        self.rx.borrow().clone()
    }

    /// Waits for the next `replace`. Returns `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
