//! The entity store contract.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::broadcast::ChangeReceiver;
use crate::error::StoreResult;

/// A tree-shaped key-value store that announces every committed write.
///
/// Writes are last-write-wins. Each call is one write and produces one
/// change event; nothing spans calls.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Read the subtree at `path`.
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Replace the subtree at `path`. An absent value deletes it.
    async fn put(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Apply `relative path -> value` updates under `path` as a single write.
    async fn patch(&self, path: &str, updates: Map<String, Value>) -> StoreResult<()>;

    /// Remove the subtree at `path`.
    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Subscribe to change events for the whole store.
    fn changes(&self) -> ChangeReceiver;
}

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn EntityStore>;
