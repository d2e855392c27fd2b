//! Identifier and timestamp generation.

use uuid::Uuid;

/// Milliseconds since the Unix epoch, the unit of every stored timestamp.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Id for boards and cards.
///
/// UUIDv7 ids sort by creation time, so the store's key order doubles as a
/// stable creation-order tie-breaker.
pub fn entity_id() -> String {
    Uuid::now_v7().to_string()
}

/// Column id assigned by the board wizard.
pub fn indexed_column_id(index: usize) -> String {
    format!("col_{}", index)
}

/// Property id assigned by the board wizard.
pub fn property_id(index: usize) -> String {
    format!("prop_{}", index)
}

/// Column id for a column added after creation: `col_<millis>`, bumped
/// until it no longer collides with an existing id.
pub fn timestamp_column_id(now: i64, taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = now;
    loop {
        let id = format!("col_{}", stamp);
        if !taken(&id) {
            return id;
        }
        stamp += 1;
    }
}
