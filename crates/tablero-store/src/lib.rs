//! Tablero store layer
//!
//! A tree-shaped, push-notifying key-value store: the contract, an
//! in-process backend and a Redis backend, plus snapshot subscriptions.

pub mod broadcast;
pub mod client;
pub mod error;
pub mod memory;
pub mod store;
pub mod subscription;
pub mod tree;

use std::sync::Arc;

pub use broadcast::{create_change_channel, ChangeEvent, ChangeReceiver, ChangeSender};
pub use client::{RedisPool, RedisStore};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{EntityStore, SharedStore};
pub use subscription::{subscribe, Snapshot, Subscription};

/// URL selecting the in-process store.
pub const MEMORY_URL: &str = "memory://";

/// Open the backend named by `url`.
///
/// `memory://` gives a fresh in-process store; anything else is handed to
/// Redis.
pub async fn open_store(url: &str, namespace: &str) -> StoreResult<SharedStore> {
    if url == MEMORY_URL {
        tracing::debug!("Using in-process memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = RedisStore::connect(url, namespace).await?;
    Ok(Arc::new(store))
}
