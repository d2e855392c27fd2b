//! Broadcast channel for store change notifications.
//!
//! Every committed write produces one event. Local and remote writes are
//! indistinguishable to receivers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Change notification, also the JSON payload published over Redis.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChangeEvent {
    /// A subtree was written (put or patch).
    Written { path: String },
    /// A subtree was removed.
    Removed { path: String },
}

impl ChangeEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Written { path } | Self::Removed { path } => path,
        }
    }
}

/// Type alias for the broadcast sender.
pub type ChangeSender = broadcast::Sender<ChangeEvent>;

/// Type alias for the broadcast receiver.
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

/// Create a new change channel with default capacity.
pub fn create_change_channel() -> ChangeSender {
    let (tx, _rx) = broadcast::channel(256);
    tx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event = ChangeEvent::Written {
            path: "cards/b1/col_0".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"Written","data":{"path":"cards/b1/col_0"}}"#);
        let back: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path(), "cards/b1/col_0");
    }
}
