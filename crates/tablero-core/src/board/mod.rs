//! Board and column repository.

pub mod model;

pub use model::{
    Board, Column, ColumnColor, ColumnUpdate, NewBoard, NewColumn, NewProperty, PropertyDef,
    PropertyType,
};

use serde_json::{json, Map};
use tablero_store::SharedStore;
use tracing::{debug, info};

use crate::decode;
use crate::error::{TableroError, TableroResult};
use crate::ids;
use crate::ordering;
use crate::paths;

/// Create a board from the wizard input.
///
/// Blank columns and properties are dropped; the rest get sequential ids in
/// the order given.
pub async fn create_board(store: &SharedStore, input: NewBoard) -> TableroResult<Board> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(TableroError::validation("The board title is required."));
    }

    let columns: Vec<Column> = input
        .columns
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .enumerate()
        .map(|(index, c)| Column {
            id: ids::indexed_column_id(index),
            name: c.name.trim().to_string(),
            color: c.color.unwrap_or_default(),
            order: index as u32,
            width: None,
        })
        .collect();
    if columns.is_empty() {
        return Err(TableroError::validation(
            "A board needs at least one column with a name.",
        ));
    }

    let properties = input
        .properties
        .iter()
        .filter(|p| !p.name.trim().is_empty())
        .enumerate()
        .map(|(index, p)| PropertyDef {
            id: ids::property_id(index),
            name: p.name.trim().to_string(),
            kind: p.kind.unwrap_or_default(),
        })
        .collect();

    let now = ids::now_millis();
    let board = Board {
        id: ids::entity_id(),
        title: title.to_string(),
        columns,
        properties,
        created_at: now,
        updated_at: now,
    };
    store
        .put(&paths::board(&board.id), serde_json::to_value(&board)?)
        .await?;

    info!(board_id = %board.id, columns = board.columns.len(), "Board created");
    Ok(board)
}

/// Get a board if it exists.
pub async fn find_board(store: &SharedStore, board_id: &str) -> TableroResult<Option<Board>> {
    let value = store.get(&paths::board(board_id)).await?;
    Ok(value.map(serde_json::from_value).transpose()?)
}

/// Get a board by ID.
pub async fn get_board(store: &SharedStore, board_id: &str) -> TableroResult<Board> {
    find_board(store, board_id)
        .await?
        .ok_or_else(|| TableroError::BoardNotFound(board_id.to_string()))
}

/// List all boards in the store's key order.
pub async fn list_boards(store: &SharedStore) -> TableroResult<Vec<Board>> {
    let value = store.get(paths::BOARDS).await?;
    Ok(decode::children::<Board>(value, paths::BOARDS)
        .into_iter()
        .map(|(_, board)| board)
        .collect())
}

/// Change a board's title.
pub async fn rename_board(store: &SharedStore, board_id: &str, title: &str) -> TableroResult<Board> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TableroError::validation("The board title is required."));
    }
    let mut board = get_board(store, board_id).await?;
    board.title = title.to_string();
    board.updated_at = ids::now_millis();

    let mut updates = Map::new();
    updates.insert("title".to_string(), json!(board.title));
    updates.insert("updatedAt".to_string(), json!(board.updated_at));
    store.patch(&paths::board(board_id), updates).await?;

    info!(board_id = %board_id, "Board renamed");
    Ok(board)
}

/// Delete a board and every card under it.
pub async fn delete_board(store: &SharedStore, board_id: &str) -> TableroResult<()> {
    get_board(store, board_id).await?;
    store.delete(&paths::board(board_id)).await?;
    store.delete(&paths::board_cards(board_id)).await?;
    info!(board_id = %board_id, "Board deleted");
    Ok(())
}

/// Append a column to a board.
pub async fn add_column(
    store: &SharedStore,
    board_id: &str,
    input: NewColumn,
) -> TableroResult<Column> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(TableroError::validation("The column name is required."));
    }
    let board = get_board(store, board_id).await?;

    let column = Column {
        id: ids::timestamp_column_id(ids::now_millis(), |id| board.column(id).is_some()),
        name: name.to_string(),
        color: input.color.unwrap_or_default(),
        order: board.columns.len() as u32,
        width: None,
    };
    let mut columns = board.columns;
    columns.push(column.clone());
    write_columns(store, board_id, &columns).await?;

    info!(board_id = %board_id, column_id = %column.id, "Column added");
    Ok(column)
}

/// Change a column's name, color or width.
pub async fn update_column(
    store: &SharedStore,
    board_id: &str,
    column_id: &str,
    update: ColumnUpdate,
) -> TableroResult<Column> {
    let mut board = get_board(store, board_id).await?;
    let column = board
        .columns
        .iter_mut()
        .find(|c| c.id == column_id)
        .ok_or_else(|| TableroError::ColumnNotFound(column_id.to_string()))?;

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(TableroError::validation("The column name is required."));
        }
        column.name = name.to_string();
    }
    if let Some(color) = update.color {
        column.color = color;
    }
    if let Some(width) = update.width {
        column.width = Some(width);
    }
    let updated = column.clone();

    write_columns(store, board_id, &board.columns).await?;
    debug!(board_id = %board_id, column_id = %column_id, "Column updated");
    Ok(updated)
}

/// Delete a column, its cards, and close the gap in column order.
pub async fn delete_column(store: &SharedStore, board_id: &str, column_id: &str) -> TableroResult<()> {
    ordering::delete_column_compaction(store, board_id, column_id).await
}

/// Replace a board's column list, stamping `updatedAt`.
pub(crate) async fn write_columns(
    store: &SharedStore,
    board_id: &str,
    columns: &[Column],
) -> TableroResult<()> {
    let mut updates = Map::new();
    updates.insert("columns".to_string(), serde_json::to_value(columns)?);
    updates.insert("updatedAt".to_string(), json!(ids::now_millis()));
    store.patch(&paths::board(board_id), updates).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tablero_store::MemoryStore;

    fn store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    fn wizard(title: &str, columns: &[&str]) -> NewBoard {
        NewBoard {
            title: title.to_string(),
            columns: columns.iter().map(|c| NewColumn::new(*c)).collect(),
            properties: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_board_assigns_sequential_ids() {
        let store = store();
        let mut input = wizard("  Roadmap  ", &["Todo", "  ", " Done "]);
        input.properties = vec![
            NewProperty {
                name: "Owner".into(),
                kind: Some(PropertyType::Email),
            },
            NewProperty {
                name: "".into(),
                kind: None,
            },
        ];
        let board = create_board(&store, input).await.unwrap();

        assert_eq!(board.title, "Roadmap");
        let columns: Vec<(&str, &str, u32)> = board
            .columns
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str(), c.order))
            .collect();
        assert_eq!(columns, vec![("col_0", "Todo", 0), ("col_1", "Done", 1)]);
        assert_eq!(board.properties.len(), 1);
        assert_eq!(board.properties[0].id, "prop_0");

        let stored = get_board(&store, &board.id).await.unwrap();
        assert_eq!(stored, board);
    }

    #[tokio::test]
    async fn test_create_board_requires_title() {
        let store = store();
        let err = create_board(&store, wizard("   ", &["Todo"])).await.unwrap_err();
        assert!(matches!(err, TableroError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_board_requires_a_named_column() {
        let store = store();
        let err = create_board(&store, wizard("Plan", &[" ", ""])).await.unwrap_err();
        assert!(matches!(err, TableroError::ValidationError(_)));
        let err = create_board(&store, wizard("Plan", &[])).await.unwrap_err();
        assert!(matches!(err, TableroError::ValidationError(_)));
        assert!(list_boards(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_column_appends() {
        let store = store();
        let board = create_board(&store, wizard("Plan", &["Todo"])).await.unwrap();
        let column = add_column(
            &store,
            &board.id,
            NewColumn::new(" Doing ").with_color(ColumnColor::Amber),
        )
        .await
        .unwrap();

        assert!(column.id.starts_with("col_"));
        assert_ne!(column.id, "col_0");
        assert_eq!(column.order, 1);
        assert_eq!(column.name, "Doing");

        let stored = get_board(&store, &board.id).await.unwrap();
        assert_eq!(stored.columns.len(), 2);
        assert_eq!(stored.columns[1], column);
        assert!(stored.updated_at >= board.updated_at);
    }

    #[tokio::test]
    async fn test_add_column_to_missing_board() {
        let store = store();
        let err = add_column(&store, "nope", NewColumn::new("Todo")).await.unwrap_err();
        assert!(matches!(err, TableroError::BoardNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_column() {
        let store = store();
        let board = create_board(&store, wizard("Plan", &["Todo"])).await.unwrap();
        let update = ColumnUpdate {
            name: Some("Backlog".into()),
            color: Some(ColumnColor::Gray),
            width: Some(320),
        };
        let column = update_column(&store, &board.id, "col_0", update).await.unwrap();
        assert_eq!(column.name, "Backlog");
        assert_eq!(column.width, Some(320));

        let err = update_column(&store, &board.id, "col_9", ColumnUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TableroError::ColumnNotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_and_list() {
        let store = store();
        let a = create_board(&store, wizard("A", &["Todo"])).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let b = create_board(&store, wizard("B", &["Todo"])).await.unwrap();
        rename_board(&store, &b.id, "Beta").await.unwrap();

        let titles: Vec<String> = list_boards(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["A".to_string(), "Beta".to_string()]);
        assert!(rename_board(&store, &a.id, " ").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_board_cascades_cards() {
        let store = store();
        let board = create_board(&store, wizard("Plan", &["Todo"])).await.unwrap();
        crate::card::create_card(&store, &board.id, "col_0", crate::card::NewCard::new("x", ""))
            .await
            .unwrap();

        delete_board(&store, &board.id).await.unwrap();
        assert!(find_board(&store, &board.id).await.unwrap().is_none());
        assert!(store
            .get(&paths::board_cards(&board.id))
            .await
            .unwrap()
            .is_none());

        let err = delete_board(&store, &board.id).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
