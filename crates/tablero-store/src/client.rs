//! Redis-backed entity store.
//!
//! Every leaf of the tree is one string key `<namespace>:<path>` holding
//! JSON. A write is a single MULTI/EXEC pipeline; afterwards a change event
//! is published on `<namespace>:changes`. A listener task feeds events from
//! that channel into the local broadcast, so this client observes its own
//! writes exactly like anybody else's.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcast::{create_change_channel, ChangeEvent, ChangeReceiver, ChangeSender};
use crate::error::StoreResult;
use crate::store::EntityStore;
use crate::tree;

/// Redis connection pool. ConnectionManager multiplexes internally and is
/// Clone, so callers clone it to get a mutable handle for each operation.
pub type RedisPool = ConnectionManager;

/// Store whose tree lives in Redis.
pub struct RedisStore {
    pool: RedisPool,
    namespace: String,
    changes: ChangeSender,
    listener: JoinHandle<()>,
}

impl RedisStore {
    /// Connect to `redis_url` and start listening for change events.
    ///
    /// Example URL: `redis://127.0.0.1:6379`
    pub async fn connect(redis_url: &str, namespace: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let pool = ConnectionManager::new(client.clone()).await?;

        let channel = changes_channel(namespace);
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&channel).await?;

        let changes = create_change_channel();
        let tx = changes.clone();
        let listener = tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(error = %e, "Unreadable change notification");
                        continue;
                    }
                };
                match serde_json::from_str::<ChangeEvent>(&payload) {
                    Ok(event) => {
                        let _ = tx.send(event);
                    }
                    Err(e) => warn!(error = %e, payload = %payload, "Malformed change notification"),
                }
            }
            debug!("Change listener stopped");
        });

        info!(url = %redis_url, namespace = %namespace, "Connected to Redis store");
        Ok(Self {
            pool,
            namespace: namespace.to_string(),
            changes,
            listener,
        })
    }

    fn key(&self, path: &str) -> String {
        leaf_key(&self.namespace, path)
    }

    /// Keys holding `path` itself or anything beneath it.
    async fn subtree_keys(&self, path: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.pool.clone();
        let mut keys = Vec::new();

        if !path.is_empty() {
            let exact = self.key(path);
            let exists: bool = conn.exists(&exact).await?;
            if exists {
                keys.push(exact);
            }
        }

        let pattern = subtree_pattern(&self.namespace, path);
        let mut scan: redis::AsyncIter<String> = conn.scan_match(&pattern).await?;
        while let Some(key) = scan.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    /// Queue the commands replacing the subtree at `path` with `value`.
    async fn stage_replace(
        &self,
        pipe: &mut redis::Pipeline,
        path: &str,
        value: &Value,
    ) -> StoreResult<()> {
        for key in self.subtree_keys(path).await? {
            pipe.del(key).ignore();
        }
        // A leaf stored at an ancestor would shadow the new children.
        for ancestor in tree::ancestors(path) {
            pipe.del(self.key(&ancestor)).ignore();
        }
        let mut leaves = Vec::new();
        tree::flatten(path, value, &mut leaves);
        for (leaf_path, leaf) in leaves {
            pipe.set(self.key(&leaf_path), serde_json::to_string(&leaf)?)
                .ignore();
        }
        Ok(())
    }

    async fn commit(&self, pipe: redis::Pipeline, event: ChangeEvent) -> StoreResult<()> {
        let mut conn = self.pool.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        let payload = serde_json::to_string(&event)?;
        conn.publish::<_, _, ()>(changes_channel(&self.namespace), payload)
            .await?;
        debug!(path = %event.path(), "Redis store change published");
        Ok(())
    }
}

impl Drop for RedisStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl EntityStore for RedisStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        tree::validate(path)?;
        let path = tree::normalize(path);
        let keys = self.subtree_keys(&path).await?;
        if keys.is_empty() {
            return Ok(None);
        }

        let mut conn = self.pool.clone();
        let raw: Vec<Option<String>> = conn.mget(&keys).await?;
        let prefix_len = self.namespace.len() + 1;
        let mut leaves = Vec::with_capacity(keys.len());
        for (key, json) in keys.into_iter().zip(raw) {
            // Deleted between SCAN and MGET.
            let Some(json) = json else { continue };
            leaves.push((key[prefix_len..].to_string(), serde_json::from_str(&json)?));
        }
        Ok(tree::inflate(&path, leaves))
    }

    async fn put(&self, path: &str, value: Value) -> StoreResult<()> {
        tree::validate(path)?;
        let path = tree::normalize(path);
        let mut pipe = redis::pipe();
        pipe.atomic();
        self.stage_replace(&mut pipe, &path, &value).await?;
        self.commit(pipe, ChangeEvent::Written { path }).await
    }

    async fn patch(&self, path: &str, updates: Map<String, Value>) -> StoreResult<()> {
        tree::validate(path)?;
        let path = tree::normalize(path);
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (rel, value) in &updates {
            tree::validate(rel)?;
            self.stage_replace(&mut pipe, &tree::join(&path, rel), value)
                .await?;
        }
        self.commit(pipe, ChangeEvent::Written { path }).await
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        tree::validate(path)?;
        let path = tree::normalize(path);
        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in self.subtree_keys(&path).await? {
            pipe.del(key).ignore();
        }
        self.commit(pipe, ChangeEvent::Removed { path }).await
    }

    fn changes(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }
}

fn changes_channel(namespace: &str) -> String {
    format!("{}:changes", namespace)
}

fn leaf_key(namespace: &str, path: &str) -> String {
    format!("{}:{}", namespace, path)
}

/// SCAN pattern for every key strictly beneath `path`.
fn subtree_pattern(namespace: &str, path: &str) -> String {
    let ns = escape_glob(namespace);
    if path.is_empty() {
        format!("{}:*", ns)
    } else {
        format!("{}:{}/*", ns, escape_glob(path))
    }
}

fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
