//! CSV import and export of a board's cards.

pub mod codec;

pub use codec::{
    export_filename, export_template, parse_import, parse_records, ImportRow, BOM, HEADER,
};

use tablero_store::SharedStore;
use tracing::{debug, info};

use crate::board;
use crate::card::{self, NewCard};
use crate::error::TableroResult;

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows whose column name matched no column.
    pub failed: usize,
}

/// Export every card of a board as CSV text.
pub async fn export_board(store: &SharedStore, board_id: &str) -> TableroResult<String> {
    let board = board::get_board(store, board_id).await?;
    let cards = card::cards_by_column(store, board_id).await?;
    let text = codec::export_cards(&board, |column_id| {
        cards.get(column_id).map(Vec::as_slice).unwrap_or(&[])
    });
    debug!(board_id = %board_id, "Board exported");
    Ok(text)
}

/// Export a fill-in template for a board.
pub async fn export_board_template(store: &SharedStore, board_id: &str) -> TableroResult<String> {
    let board = board::get_board(store, board_id).await?;
    Ok(export_template(&board))
}

/// Create a card for each row of `text`, one write at a time.
///
/// Column names must match exactly. A store failure stops the import with
/// the rows before it already written.
pub async fn import_cards(
    store: &SharedStore,
    board_id: &str,
    text: &str,
) -> TableroResult<ImportSummary> {
    let rows = parse_import(text)?;
    let board = board::get_board(store, board_id).await?;

    let mut summary = ImportSummary::default();
    for row in rows {
        let Some(column) = board.column_by_name(&row.column) else {
            debug!(board_id = %board_id, column = %row.column, "Import row names no column");
            summary.failed += 1;
            continue;
        };
        card::create_card(
            store,
            board_id,
            &column.id,
            NewCard::new(row.title, row.content),
        )
        .await?;
        summary.imported += 1;
    }

    info!(
        board_id = %board_id,
        imported = summary.imported,
        failed = summary.failed,
        "CSV import finished"
    );
    Ok(summary)
}
