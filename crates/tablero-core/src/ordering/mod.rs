//! Order-index engine for cards and columns.
//!
//! Every operation computes the complete set of target `order` values first
//! and then writes them, so a committed step never leaves two siblings with
//! the same order. Steps are committed one by one with no rollback: when a
//! write fails the error is returned and the remaining steps never run.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map};
use tablero_store::SharedStore;
use tracing::{debug, info};

use crate::board::{self, Column};
use crate::card::{self, Card};
use crate::error::{TableroError, TableroResult};
use crate::ids;
use crate::paths;

/// Assign `order = index` to the cards of a column following `card_ids`.
///
/// Cards of the column missing from `card_ids` keep their relative order
/// after the listed ones. Only cards whose order changes are written, all in
/// one patch; an already-applied sequence writes nothing. Returns the number
/// of cards written.
pub async fn reorder_within_column(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    card_ids: &[String],
) -> TableroResult<usize> {
    card::require_column(store, board_id, column_id).await?;
    let current = card::list_cards(store, board_id, column_id).await?;
    let plan = plan_reorder(&current, card_ids)?;
    if plan.is_empty() {
        debug!(board_id = %board_id, column_id = %column_id, "Column already in requested order");
        return Ok(0);
    }

    let now = ids::now_millis();
    let mut updates = Map::new();
    for (card_id, order) in &plan {
        updates.insert(format!("{}/order", card_id), json!(order));
        updates.insert(format!("{}/updatedAt", card_id), json!(now));
    }
    store
        .patch(&paths::column_cards(board_id, column_id), updates)
        .await?;

    info!(board_id = %board_id, column_id = %column_id, changed = plan.len(), "Cards reordered");
    Ok(plan.len())
}

/// Move a card from one column into another at `index`.
///
/// Steps: write the card under the target with `order = index`, delete it
/// from the source, shift target cards at positions `>= index` down by one.
/// The source column is left with a gap in its order values; see
/// [`compact_column`]. Moving within one column is a reorder.
pub async fn move_across_columns(
    store: &SharedStore,
    board_id: &str,
    card_id: &str,
    source_column_id: &str,
    target_column_id: &str,
    index: usize,
) -> TableroResult<Card> {
    if source_column_id == target_column_id {
        let current = card::list_cards(store, board_id, source_column_id).await?;
        let sequence = plan_insert(&current, card_id, index)?;
        reorder_within_column(store, board_id, source_column_id, &sequence).await?;
        return card::get_card(store, board_id, source_column_id, card_id).await;
    }

    let board = board::get_board(store, board_id).await?;
    for column_id in [source_column_id, target_column_id] {
        if board.column(column_id).is_none() {
            return Err(TableroError::ColumnNotFound(column_id.to_string()));
        }
    }

    let mut moved = card::get_card(store, board_id, source_column_id, card_id).await?;
    let target_cards = card::list_cards(store, board_id, target_column_id).await?;
    let others: Vec<&Card> = target_cards.iter().filter(|c| c.id != card_id).collect();
    let index = index.min(others.len());

    moved.order = index as u32;
    moved.updated_at = ids::now_millis();
    store
        .put(
            &paths::card(board_id, target_column_id, card_id),
            serde_json::to_value(&moved)?,
        )
        .await?;
    store
        .delete(&paths::card(board_id, source_column_id, card_id))
        .await?;

    let shifts = plan_shift(&others, index);
    if !shifts.is_empty() {
        let mut updates = Map::new();
        for (id, order) in &shifts {
            updates.insert(format!("{}/order", id), json!(order));
        }
        store
            .patch(&paths::column_cards(board_id, target_column_id), updates)
            .await?;
    }

    info!(
        board_id = %board_id,
        card_id = %card_id,
        from = %source_column_id,
        to = %target_column_id,
        index,
        shifted = shifts.len(),
        "Card moved"
    );
    Ok(moved)
}

/// Rewrite a column's card orders to `0..n-1` in current display order.
pub async fn compact_column(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
) -> TableroResult<usize> {
    let current = card::list_cards(store, board_id, column_id).await?;
    let sequence: Vec<String> = current.into_iter().map(|c| c.id).collect();
    reorder_within_column(store, board_id, column_id, &sequence).await
}

/// Remove a column and its cards, re-packing the remaining column orders.
///
/// Refused when the column is the board's last.
pub async fn delete_column_compaction(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
) -> TableroResult<()> {
    let board = board::get_board(store, board_id).await?;
    if board.column(column_id).is_none() {
        return Err(TableroError::ColumnNotFound(column_id.to_string()));
    }
    if board.columns.len() <= 1 {
        return Err(TableroError::ConstraintError(
            "The last column of a board cannot be deleted.".to_string(),
        ));
    }

    let remaining = compact_columns(&board.columns, column_id);
    board::write_columns(store, board_id, &remaining).await?;
    store
        .delete(&paths::column_cards(board_id, column_id))
        .await?;

    info!(board_id = %board_id, column_id = %column_id, remaining = remaining.len(), "Column deleted");
    Ok(())
}

/// Target `(card id, order)` pairs for a reorder, changed cards only.
pub fn plan_reorder(current: &[Card], card_ids: &[String]) -> TableroResult<Vec<(String, u32)>> {
    let mut listed = HashSet::new();
    for id in card_ids {
        if !listed.insert(id.as_str()) {
            return Err(TableroError::validation(format!(
                "Card '{}' appears more than once in the new order.",
                id
            )));
        }
        if !current.iter().any(|c| c.id == *id) {
            return Err(TableroError::CardNotFound(id.clone()));
        }
    }

    let present: HashMap<&str, u32> = current.iter().map(|c| (c.id.as_str(), c.order)).collect();
    let sequence = card_ids.iter().map(String::as_str).chain(
        current
            .iter()
            .map(|c| c.id.as_str())
            .filter(|id| !listed.contains(id)),
    );

    Ok(sequence
        .enumerate()
        .filter(|(index, id)| present.get(id) != Some(&(*index as u32)))
        .map(|(index, id)| (id.to_string(), index as u32))
        .collect())
}

/// Id sequence of a column after moving `card_id` to `index`.
pub fn plan_insert(current: &[Card], card_id: &str, index: usize) -> TableroResult<Vec<String>> {
    let mut ids: Vec<String> = current
        .iter()
        .filter(|c| c.id != card_id)
        .map(|c| c.id.clone())
        .collect();
    if ids.len() == current.len() {
        return Err(TableroError::CardNotFound(card_id.to_string()));
    }
    let index = index.min(ids.len());
    ids.insert(index, card_id.to_string());
    Ok(ids)
}

/// New orders for the cards already in a target column once a card is
/// inserted at `index`: positions before it stay, the rest shift by one.
/// `others` must be in display order. Unchanged cards are left out.
pub fn plan_shift(others: &[&Card], index: usize) -> Vec<(String, u32)> {
    others
        .iter()
        .enumerate()
        .map(|(pos, c)| {
            let order = (if pos >= index { pos + 1 } else { pos }) as u32;
            (c, order)
        })
        .filter(|(c, order)| c.order != *order)
        .map(|(c, order)| (c.id.clone(), order))
        .collect()
}

/// Columns left after removing `removed`, re-numbered `0..n-1` in their
/// previous relative order.
pub fn compact_columns(columns: &[Column], removed: &str) -> Vec<Column> {
    let mut remaining: Vec<Column> = columns.iter().filter(|c| c.id != removed).cloned().collect();
    remaining.sort_by_key(|c| c.order);
    for (index, column) in remaining.iter_mut().enumerate() {
        column.order = index as u32;
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, NewBoard, NewColumn};
    use crate::card::NewCard;
    use std::sync::Arc;
    use tablero_store::{MemoryStore, StoreError};

    fn card(id: &str, order: u32) -> Card {
        Card {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: String::new(),
            order,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    async fn setup(columns: &[&str]) -> (Arc<MemoryStore>, SharedStore, Board) {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let board = board::create_board(
            &store,
            NewBoard {
                title: "Plan".into(),
                columns: columns.iter().map(|c| NewColumn::new(*c)).collect(),
                properties: Vec::new(),
            },
        )
        .await
        .unwrap();
        (memory, store, board)
    }

    async fn fill(store: &SharedStore, board_id: &str, column_id: &str, titles: &[&str]) -> Vec<String> {
        let mut ids = Vec::new();
        for title in titles {
            let card = card::create_card(store, board_id, column_id, NewCard::new(*title, ""))
                .await
                .unwrap();
            ids.push(card.id);
        }
        ids
    }

    async fn titles(store: &SharedStore, board_id: &str, column_id: &str) -> Vec<(String, u32)> {
        card::list_cards(store, board_id, column_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.title, c.order))
            .collect()
    }

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(t, o)| (t.to_string(), *o)).collect()
    }

    #[test]
    fn test_plan_reorder_only_changed() {
        let current = vec![card("a", 0), card("b", 1), card("c", 2)];
        let plan = plan_reorder(&current, &strings(&["b", "a", "c"])).unwrap();
        assert_eq!(plan, vec![("b".to_string(), 0), ("a".to_string(), 1)]);

        let plan = plan_reorder(&current, &strings(&["a", "b", "c"])).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_reorder_appends_unlisted_cards() {
        let current = vec![card("a", 0), card("b", 1), card("c", 2)];
        let plan = plan_reorder(&current, &strings(&["c"])).unwrap();
        assert_eq!(
            plan,
            vec![("c".to_string(), 0), ("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_plan_reorder_rejects_bad_sequences() {
        let current = vec![card("a", 0), card("b", 1)];
        assert!(matches!(
            plan_reorder(&current, &strings(&["a", "a"])),
            Err(TableroError::ValidationError(_))
        ));
        assert!(matches!(
            plan_reorder(&current, &strings(&["z"])),
            Err(TableroError::CardNotFound(_))
        ));
    }

    #[test]
    fn test_plan_reorder_repairs_duplicate_orders() {
        let current = vec![card("a", 0), card("b", 0), card("c", 5)];
        let plan = plan_reorder(&current, &strings(&["a", "b", "c"])).unwrap();
        assert_eq!(plan, vec![("b".to_string(), 1), ("c".to_string(), 2)]);
    }

    #[test]
    fn test_plan_shift() {
        let cards = vec![card("x", 0), card("y", 1), card("z", 2)];
        let refs: Vec<&Card> = cards.iter().collect();
        assert_eq!(
            plan_shift(&refs, 1),
            vec![("y".to_string(), 2), ("z".to_string(), 3)]
        );
        assert!(plan_shift(&refs, 3).is_empty());
    }

    #[test]
    fn test_plan_insert() {
        let cards = vec![card("a", 0), card("b", 1), card("c", 2)];
        assert_eq!(plan_insert(&cards, "a", 2).unwrap(), strings(&["b", "c", "a"]));
        assert_eq!(plan_insert(&cards, "c", 0).unwrap(), strings(&["c", "a", "b"]));
        assert_eq!(plan_insert(&cards, "b", 99).unwrap(), strings(&["a", "c", "b"]));
        assert!(plan_insert(&cards, "q", 0).is_err());
    }

    #[tokio::test]
    async fn test_reorder_commits_dense_sequence() {
        let (_, store, board) = setup(&["Todo"]).await;
        let ids = fill(&store, &board.id, "col_0", &["a", "b", "c", "d"]).await;
        let sequence = vec![ids[3].clone(), ids[1].clone(), ids[0].clone(), ids[2].clone()];

        let changed = reorder_within_column(&store, &board.id, "col_0", &sequence)
            .await
            .unwrap();
        assert_eq!(changed, 4);
        assert_eq!(
            titles(&store, &board.id, "col_0").await,
            pairs(&[("d", 0), ("b", 1), ("a", 2), ("c", 3)])
        );

        // Reapplying is a no-op.
        let changed = reorder_within_column(&store, &board.id, "col_0", &sequence)
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn test_reorder_is_a_single_write() {
        let (_, store, board) = setup(&["Todo"]).await;
        let ids = fill(&store, &board.id, "col_0", &["a", "b", "c"]).await;
        let mut changes = store.changes();

        let sequence = vec![ids[2].clone(), ids[0].clone(), ids[1].clone()];
        reorder_within_column(&store, &board.id, "col_0", &sequence)
            .await
            .unwrap();

        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_move_inserts_and_shifts_target() {
        let (_, store, board) = setup(&["A", "B"]).await;
        let a_ids = fill(&store, &board.id, "col_0", &["a0", "a1", "a2"]).await;
        fill(&store, &board.id, "col_1", &["b0", "b1", "b2"]).await;

        let moved = move_across_columns(&store, &board.id, &a_ids[1], "col_0", "col_1", 1)
            .await
            .unwrap();
        assert_eq!(moved.order, 1);

        assert_eq!(
            titles(&store, &board.id, "col_1").await,
            pairs(&[("b0", 0), ("a1", 1), ("b1", 2), ("b2", 3)])
        );
        // The source keeps its gap.
        assert_eq!(
            titles(&store, &board.id, "col_0").await,
            pairs(&[("a0", 0), ("a2", 2)])
        );

        compact_column(&store, &board.id, "col_0").await.unwrap();
        assert_eq!(
            titles(&store, &board.id, "col_0").await,
            pairs(&[("a0", 0), ("a2", 1)])
        );
    }

    #[tokio::test]
    async fn test_move_into_empty_column_clamps_index() {
        let (_, store, board) = setup(&["A", "B"]).await;
        let ids = fill(&store, &board.id, "col_0", &["a0"]).await;

        let moved = move_across_columns(&store, &board.id, &ids[0], "col_0", "col_1", 10)
            .await
            .unwrap();
        assert_eq!(moved.order, 0);
        assert!(card::list_cards(&store, &board.id, "col_0").await.unwrap().is_empty());
        assert_eq!(titles(&store, &board.id, "col_1").await, pairs(&[("a0", 0)]));
    }

    #[tokio::test]
    async fn test_move_within_same_column_reorders() {
        let (_, store, board) = setup(&["A"]).await;
        let ids = fill(&store, &board.id, "col_0", &["a", "b", "c"]).await;

        move_across_columns(&store, &board.id, &ids[0], "col_0", "col_0", 2)
            .await
            .unwrap();
        assert_eq!(
            titles(&store, &board.id, "col_0").await,
            pairs(&[("b", 0), ("c", 1), ("a", 2)])
        );
    }

    #[tokio::test]
    async fn test_move_errors() {
        let (_, store, board) = setup(&["A", "B"]).await;
        let err = move_across_columns(&store, &board.id, "ghost", "col_0", "col_1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TableroError::CardNotFound(_)));

        let ids = fill(&store, &board.id, "col_0", &["a"]).await;
        let err = move_across_columns(&store, &board.id, &ids[0], "col_0", "col_9", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TableroError::ColumnNotFound(_)));
    }

    #[tokio::test]
    async fn test_move_failure_after_first_write_duplicates_card() {
        let (memory, store, board) = setup(&["A", "B"]).await;
        let ids = fill(&store, &board.id, "col_0", &["a"]).await;

        // The write under the target succeeds, the delete from the source fails.
        memory.fail_writes_after(1);
        let err = move_across_columns(&store, &board.id, &ids[0], "col_0", "col_1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, TableroError::Store(StoreError::WriteRejected(_))));

        assert_eq!(titles(&store, &board.id, "col_0").await, pairs(&[("a", 0)]));
        assert_eq!(titles(&store, &board.id, "col_1").await, pairs(&[("a", 0)]));
    }

    #[tokio::test]
    async fn test_delete_column_repacks_orders() {
        let (_, store, board) = setup(&["A", "B"]).await;
        fill(&store, &board.id, "col_0", &["a"]).await;

        delete_column_compaction(&store, &board.id, "col_0").await.unwrap();

        let stored = board::get_board(&store, &board.id).await.unwrap();
        assert_eq!(stored.columns.len(), 1);
        assert_eq!(stored.columns[0].id, "col_1");
        assert_eq!(stored.columns[0].order, 0);
        assert!(card::list_cards(&store, &board.id, "col_0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_last_column_is_refused() {
        let (_, store, board) = setup(&["Only"]).await;
        let before = board::get_board(&store, &board.id).await.unwrap();

        let err = delete_column_compaction(&store, &board.id, "col_0")
            .await
            .unwrap_err();
        assert!(matches!(err, TableroError::ConstraintError(_)));
        assert_eq!(board::get_board(&store, &board.id).await.unwrap(), before);
    }

    #[test]
    fn test_compact_columns_preserves_relative_order() {
        let column = |id: &str, order| Column {
            id: id.to_string(),
            name: id.to_string(),
            color: Default::default(),
            order,
            width: None,
        };
        let columns = vec![column("c", 2), column("a", 0), column("b", 1), column("d", 3)];
        let remaining = compact_columns(&columns, "b");
        let view: Vec<(&str, u32)> = remaining.iter().map(|c| (c.id.as_str(), c.order)).collect();
        assert_eq!(view, vec![("a", 0), ("c", 1), ("d", 2)]);
    }
}
