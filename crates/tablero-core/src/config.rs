//! Runtime configuration read from the environment.

use tablero_store::SharedStore;
use tracing::debug;

use crate::error::{TableroError, TableroResult};

/// Default store URL.
pub const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379";

/// Default key and channel prefix in Redis.
pub const DEFAULT_NAMESPACE: &str = "tablero";

/// Where the board data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_url: String,
    pub namespace: String,
}

impl Config {
    /// Build a config from `TABLERO_STORE_URL` (or `REDIS_URL`) and
    /// `TABLERO_NAMESPACE`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store_url = lookup("TABLERO_STORE_URL")
            .or_else(|| lookup("REDIS_URL"))
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
        let namespace =
            lookup("TABLERO_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        Self {
            store_url,
            namespace,
        }
    }

    /// Override the store URL.
    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = url.into();
        self
    }

    /// Override the key and channel prefix.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn validate(&self) -> TableroResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(TableroError::Config("namespace must not be empty".into()));
        }
        if self.namespace.contains(['*', '?', '[', ']', ':']) {
            return Err(TableroError::Config(format!(
                "namespace '{}' contains reserved characters",
                self.namespace
            )));
        }
        Ok(())
    }

    /// Open the configured store.
    pub async fn open_store(&self) -> TableroResult<SharedStore> {
        self.validate()?;
        debug!(url = %self.store_url, namespace = %self.namespace, "Opening store");
        Ok(tablero_store::open_store(&self.store_url, &self.namespace).await?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}
