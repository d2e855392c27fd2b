//! In-process store backed by a JSON tree.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::broadcast::{create_change_channel, ChangeEvent, ChangeReceiver, ChangeSender};
use crate::error::{StoreError, StoreResult};
use crate::store::EntityStore;
use crate::tree;

/// A store that keeps the whole tree in memory.
///
/// Used for `memory://` sessions and throughout the test suites. Writes can
/// be made to fail after a number of successful ones, which is how the
/// partial-failure behavior of multi-step operations is exercised.
pub struct MemoryStore {
    root: RwLock<Value>,
    changes: ChangeSender,
    write_budget: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// Create a store preloaded with `root`.
    pub fn with_root(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
            changes: create_change_channel(),
            write_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Let `writes` more writes succeed, then reject every write after.
    pub fn fail_writes_after(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Accept writes again.
    pub fn restore_writes(&self) {
        self.write_budget.store(usize::MAX, Ordering::SeqCst);
    }

    /// Number of live receivers of this store's change events.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn take_write(&self, path: &str) -> StoreResult<()> {
        let granted = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            });
        granted
            .map(|_| ())
            .map_err(|_| StoreError::WriteRejected(format!("write to '{}' rejected", path)))
    }

    fn notify(&self, event: ChangeEvent) {
        debug!(path = %event.path(), "Memory store change");
        // No receivers is fine.
        let _ = self.changes.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        tree::validate(path)?;
        let root = self.root.read().await;
        Ok(tree::get_at(&root, &tree::segments(path)).cloned())
    }

    async fn put(&self, path: &str, value: Value) -> StoreResult<()> {
        tree::validate(path)?;
        self.take_write(path)?;
        {
            let mut root = self.root.write().await;
            tree::set_at(&mut root, &tree::segments(path), value);
        }
        self.notify(ChangeEvent::Written {
            path: tree::normalize(path),
        });
        Ok(())
    }

    async fn patch(&self, path: &str, updates: Map<String, Value>) -> StoreResult<()> {
        tree::validate(path)?;
        for rel in updates.keys() {
            tree::validate(rel)?;
        }
        self.take_write(path)?;
        {
            let mut root = self.root.write().await;
            for (rel, value) in updates {
                let target = tree::join(path, &rel);
                tree::set_at(&mut root, &tree::segments(&target), value);
            }
        }
        self.notify(ChangeEvent::Written {
            path: tree::normalize(path),
        });
        Ok(())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        tree::validate(path)?;
        self.take_write(path)?;
        {
            let mut root = self.root.write().await;
            tree::remove_at(&mut root, &tree::segments(path));
        }
        self.notify(ChangeEvent::Removed {
            path: tree::normalize(path),
        });
        Ok(())
    }

    fn changes(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }
}
