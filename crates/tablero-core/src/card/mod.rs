//! Card repository.

pub mod model;

pub use model::{Card, CardUpdate, NewCard, DEFAULT_CARD_TITLE};

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tablero_store::SharedStore;
use tracing::{debug, info};

use crate::board::{self, Board};
use crate::decode;
use crate::error::{TableroError, TableroResult};
use crate::ids;
use crate::ordering;
use crate::paths;
use crate::sync;

/// Create a card at the end of a column.
pub async fn create_card(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    input: NewCard,
) -> TableroResult<Card> {
    require_column(store, board_id, column_id).await?;
    let order = next_card_order(store, board_id, column_id).await?;

    let now = ids::now_millis();
    let card = Card {
        id: ids::entity_id(),
        title: title_or_default(&input.title),
        content: input.content,
        order,
        created_at: now,
        updated_at: now,
    };
    store
        .put(
            &paths::card(board_id, column_id, &card.id),
            serde_json::to_value(&card)?,
        )
        .await?;

    debug!(board_id = %board_id, column_id = %column_id, card_id = %card.id, order, "Card created");
    Ok(card)
}

/// Get a card by ID.
pub async fn get_card(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    card_id: &str,
) -> TableroResult<Card> {
    let value = store.get(&paths::card(board_id, column_id, card_id)).await?;
    match value {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(TableroError::CardNotFound(card_id.to_string())),
    }
}

/// Cards of one column in display order.
pub async fn list_cards(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
) -> TableroResult<Vec<Card>> {
    let path = paths::column_cards(board_id, column_id);
    let value = store.get(&path).await?;
    Ok(sync::sort_cards(decode::children(value, &path)))
}

/// Every column's cards in display order, keyed by column id.
pub async fn cards_by_column(
    store: &SharedStore,
    board_id: &str,
) -> TableroResult<BTreeMap<String, Vec<Card>>> {
    let value = store.get(&paths::board_cards(board_id)).await?;
    Ok(sync::project_cards(value, board_id))
}

/// Order value for a card appended to a column: its current length.
pub async fn next_card_order(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
) -> TableroResult<u32> {
    let value = store.get(&paths::column_cards(board_id, column_id)).await?;
    Ok(match value {
        Some(Value::Object(map)) => map.len() as u32,
        _ => 0,
    })
}

/// Update a card's title and/or content. Always stamps `updatedAt`.
pub async fn update_card(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    card_id: &str,
    update: CardUpdate,
) -> TableroResult<Card> {
    require_column(store, board_id, column_id).await?;
    let mut card = get_card(store, board_id, column_id, card_id).await?;

    let mut updates = Map::new();
    if let Some(title) = update.title {
        card.title = title_or_default(&title);
        updates.insert("title".to_string(), json!(card.title));
    }
    if let Some(content) = update.content {
        card.content = content;
        updates.insert("content".to_string(), json!(card.content));
    }
    card.updated_at = ids::now_millis();
    updates.insert("updatedAt".to_string(), json!(card.updated_at));

    store
        .patch(&paths::card(board_id, column_id, card_id), updates)
        .await?;

    debug!(board_id = %board_id, card_id = %card_id, "Card updated");
    Ok(card)
}

/// Delete a card.
pub async fn delete_card(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    card_id: &str,
) -> TableroResult<()> {
    require_column(store, board_id, column_id).await?;
    get_card(store, board_id, column_id, card_id).await?;
    store
        .delete(&paths::card(board_id, column_id, card_id))
        .await?;
    info!(board_id = %board_id, card_id = %card_id, "Card deleted");
    Ok(())
}

/// Move a card to another column at `index`.
pub async fn move_card(
    store: &SharedStore,
    board_id: &str,
    card_id: &str,
    source_column_id: &str,
    target_column_id: &str,
    index: usize,
) -> TableroResult<Card> {
    ordering::move_across_columns(
        store,
        board_id,
        card_id,
        source_column_id,
        target_column_id,
        index,
    )
    .await
}

/// Reorder a column's cards to match `card_ids`.
pub async fn reorder_cards(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    card_ids: &[String],
) -> TableroResult<usize> {
    ordering::reorder_within_column(store, board_id, column_id, card_ids).await
}

/// Load the board and make sure it has the column.
pub(crate) async fn require_column(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
) -> TableroResult<Board> {
    let board = board::get_board(store, board_id).await?;
    if board.column(column_id).is_none() {
        return Err(TableroError::ColumnNotFound(column_id.to_string()));
    }
    Ok(board)
}

/// Titles are stored as given; only an empty one is replaced.
fn title_or_default(title: &str) -> String {
    if title.is_empty() {
        DEFAULT_CARD_TITLE.to_string()
    } else {
        title.to_string()
    }
}
