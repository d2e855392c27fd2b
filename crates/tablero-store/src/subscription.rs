//! Snapshot subscriptions.
//!
//! A subscription pushes the full current value of its path once on start
//! and again after every change event that touches the path. Snapshots are
//! delivered through a channel; the forwarding task stops when the
//! subscription is released or dropped.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::SharedStore;
use crate::tree;

/// Full state of a watched path at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: String,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Decode the snapshot into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        match &self.value {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

/// A live subscription to one path.
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next snapshot. Returns `None` once released.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Stop delivering snapshots.
    pub fn release(self) {
        debug!(path = %self.path, "Subscription released");
        // Drop aborts the forwarding task.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to full snapshots of `path`.
///
/// Must be called from within a tokio runtime.
pub fn subscribe(store: SharedStore, path: &str) -> Subscription {
    let path = tree::normalize(path);
    let (tx, rx) = mpsc::unbounded_channel();
    // Register for changes before the first read so nothing slips between.
    let mut changes = store.changes();

    let watched = path.clone();
    let task = tokio::spawn(async move {
        if !emit(&store, &watched, &tx).await {
            return;
        }
        loop {
            match changes.recv().await {
                Ok(event) if tree::overlaps(event.path(), &watched) => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(path = %watched, skipped, "Subscription lagged, resending snapshot");
                }
                Err(RecvError::Closed) => break,
            }
            if !emit(&store, &watched, &tx).await {
                break;
            }
        }
        debug!(path = %watched, "Subscription task stopped");
    });

    Subscription { path, rx, task }
}

/// Read and forward one snapshot. Returns false once the receiver is gone.
async fn emit(store: &SharedStore, path: &str, tx: &mpsc::UnboundedSender<Snapshot>) -> bool {
    match store.get(path).await {
        Ok(value) => tx
            .send(Snapshot {
                path: path.to_string(),
                value,
            })
            .is_ok(),
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to read snapshot");
            !tx.is_closed()
        }
    }
}
