//! Turning a finished card drag into an ordering operation.

use tablero_store::SharedStore;
use tracing::debug;

use crate::error::TableroResult;
use crate::ordering;
use crate::sync::BoardProjection;

const COLUMN_ZONE_PREFIX: &str = "column-";

/// What a card was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// The empty area of a column, `column-<columnId>`.
    Column(String),
    Card(String),
}

impl DropTarget {
    pub fn parse(id: &str) -> Self {
        match id.strip_prefix(COLUMN_ZONE_PREFIX) {
            Some(column_id) => Self::Column(column_id.to_string()),
            None => Self::Card(id.to_string()),
        }
    }

    /// Drop-zone id of a column.
    pub fn column_zone(column_id: &str) -> String {
        format!("{}{}", COLUMN_ZONE_PREFIX, column_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Noop,
    Reorder {
        column_id: String,
        card_ids: Vec<String>,
    },
    Move {
        card_id: String,
        source_column_id: String,
        target_column_id: String,
        index: usize,
    },
}

/// Resolve a drop against the current projection.
pub fn resolve_drop(projection: &BoardProjection, dragged: &str, over: Option<&str>) -> DragOutcome {
    let Some((source, from)) = projection.locate_card(dragged) else {
        return DragOutcome::Noop;
    };
    let Some(over) = over else {
        return DragOutcome::Noop;
    };

    match DropTarget::parse(over) {
        DropTarget::Card(target_card) => {
            let Some((target, to)) = projection.locate_card(&target_card) else {
                return DragOutcome::Noop;
            };
            // Across columns a card always lands at the end, whatever it was dropped on.
            if target != source {
                return DragOutcome::Move {
                    card_id: dragged.to_string(),
                    source_column_id: source.to_string(),
                    target_column_id: target.to_string(),
                    index: projection.cards(target).len(),
                };
            }
            if target_card == dragged {
                return DragOutcome::Noop;
            }
            let mut card_ids: Vec<String> =
                projection.cards(source).iter().map(|c| c.id.clone()).collect();
            let moved = card_ids.remove(from);
            card_ids.insert(to, moved);
            DragOutcome::Reorder {
                column_id: source.to_string(),
                card_ids,
            }
        }
        DropTarget::Column(target) => {
            let exists = projection
                .board
                .as_ref()
                .is_some_and(|b| b.column(&target).is_some());
            if target == source || !exists {
                return DragOutcome::Noop;
            }
            let index = projection.cards(&target).len();
            DragOutcome::Move {
                card_id: dragged.to_string(),
                source_column_id: source.to_string(),
                target_column_id: target,
                index,
            }
        }
    }
}

/// Commit a resolved drop.
pub async fn apply_drop(store: &SharedStore, board_id: &str, outcome: DragOutcome) -> TableroResult<()> {
    match outcome {
        DragOutcome::Noop => {}
        DragOutcome::Reorder { column_id, card_ids } => {
            let written =
                ordering::reorder_within_column(store, board_id, &column_id, &card_ids).await?;
            debug!(board_id = %board_id, column_id = %column_id, written, "Drop reordered column");
        }
        DragOutcome::Move {
            card_id,
            source_column_id,
            target_column_id,
            index,
        } => {
            ordering::move_across_columns(
                store,
                board_id,
                &card_id,
                &source_column_id,
                &target_column_id,
                index,
            )
            .await?;
        }
    }
    Ok(())
}
