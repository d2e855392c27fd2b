//! Card domain models as stored under `cards/<boardId>/<columnId>/<cardId>`.

use serde::{Deserialize, Serialize};

/// Title given to cards created without one.
pub const DEFAULT_CARD_TITLE: &str = "Sin título";

/// A work item within one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Fields of a card being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    pub title: String,
    pub content: String,
}

impl NewCard {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Card fields to change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}
