//! Card management commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use tablero_core::card::{self, CardUpdate, NewCard};
use tablero_core::{drag, ordering, DragOutcome, TableroError};
use tablero_store::SharedStore;

use super::{find_card, load_projection, resolve_board, resolve_column};
use crate::output;

#[derive(Subcommand)]
pub enum CardCommands {
    /// Add a card at the end of a column
    Add(AddCardArgs),

    /// Show a card
    Show(CardRef),

    /// Change a card's title or content
    Edit(EditCardArgs),

    /// Delete a card
    Delete(CardRef),

    /// Move a card to a column, optionally at a position
    Move(MoveCardArgs),

    /// Drop a card on another card or on `column-<columnId>`
    Drop(DropCardArgs),

    /// Set the order of a column's cards
    Reorder(ReorderArgs),

    /// Renumber a column's cards 0..n-1 in display order
    Compact(CompactArgs),
}

#[derive(Args)]
pub struct AddCardArgs {
    /// Board id or title
    pub board: String,

    /// Column id or name
    pub column: String,

    /// Card title
    pub title: String,

    /// Card content
    #[arg(short, long, default_value = "")]
    pub content: String,
}

#[derive(Args)]
pub struct CardRef {
    /// Board id or title
    pub board: String,

    /// Card id
    pub card: String,
}

#[derive(Args)]
pub struct EditCardArgs {
    /// Board id or title
    pub board: String,

    /// Card id
    pub card: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New content
    #[arg(short, long)]
    pub content: Option<String>,
}

#[derive(Args)]
pub struct MoveCardArgs {
    /// Board id or title
    pub board: String,

    /// Card id
    pub card: String,

    /// Target column id or name
    pub column: String,

    /// Position in the target column (defaults to the end)
    #[arg(short, long)]
    pub index: Option<usize>,
}

#[derive(Args)]
pub struct DropCardArgs {
    /// Board id or title
    pub board: String,

    /// Dragged card id
    pub card: String,

    /// Card id or column drop zone it was released over
    pub over: Option<String>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Board id or title
    pub board: String,

    /// Column id or name
    pub column: String,

    /// Card ids in their new order
    #[arg(required = true)]
    pub cards: Vec<String>,
}

#[derive(Args)]
pub struct CompactArgs {
    /// Board id or title
    pub board: String,

    /// Column id or name
    pub column: String,
}

pub async fn execute(cmd: CardCommands, store: &SharedStore) -> Result<()> {
    match cmd {
        CardCommands::Add(args) => {
            let board = resolve_board(store, &args.board).await?;
            let column = resolve_column(&board, &args.column)?;
            let card = card::create_card(
                store,
                &board.id,
                &column.id,
                NewCard::new(args.title, args.content),
            )
            .await?;
            output::success(format!(
                "Created card: {} ({}) in {}",
                card.title.cyan(),
                card.id.dimmed(),
                column.name
            ));
        }

        CardCommands::Show(args) => {
            let board = resolve_board(store, &args.board).await?;
            let projection = load_projection(store, board).await?;
            let (column_id, card) = find_card(&projection, &args.card)?;
            let column = projection
                .board
                .as_ref()
                .and_then(|b| b.column(&column_id))
                .ok_or_else(|| TableroError::ColumnNotFound(column_id.clone()))?;
            output::print_card(&card, column);
        }

        CardCommands::Edit(args) => {
            let board = resolve_board(store, &args.board).await?;
            let board_id = board.id.clone();
            let projection = load_projection(store, board).await?;
            let (column_id, _) = find_card(&projection, &args.card)?;
            let update = CardUpdate {
                title: args.title,
                content: args.content,
            };
            let card = card::update_card(store, &board_id, &column_id, &args.card, update).await?;
            output::success(format!("Updated card {}", card.title.cyan()));
        }

        CardCommands::Delete(args) => {
            let board = resolve_board(store, &args.board).await?;
            let board_id = board.id.clone();
            let projection = load_projection(store, board).await?;
            let (column_id, card) = find_card(&projection, &args.card)?;
            card::delete_card(store, &board_id, &column_id, &card.id).await?;
            output::success(format!("Deleted card {}", card.title.cyan()));
        }

        CardCommands::Move(args) => {
            let board = resolve_board(store, &args.board).await?;
            let target = resolve_column(&board, &args.column)?.clone();
            let board_id = board.id.clone();
            let projection = load_projection(store, board).await?;
            let (source_id, _) = find_card(&projection, &args.card)?;
            let index = args.index.unwrap_or(usize::MAX);

            let card =
                card::move_card(store, &board_id, &args.card, &source_id, &target.id, index).await?;
            output::success(format!(
                "Moved card {} to {} at position {}",
                card.title.cyan(),
                target.name.cyan(),
                card.order
            ));
        }

        CardCommands::Drop(args) => {
            let board = resolve_board(store, &args.board).await?;
            let board_id = board.id.clone();
            let projection = load_projection(store, board).await?;
            let outcome = drag::resolve_drop(&projection, &args.card, args.over.as_deref());
            let summary = match &outcome {
                DragOutcome::Noop => "Nothing to do".dimmed().to_string(),
                DragOutcome::Reorder { .. } => "Reordered column".to_string(),
                DragOutcome::Move { index, .. } => format!("Moved card to position {}", index),
            };
            drag::apply_drop(store, &board_id, outcome).await?;
            output::success(summary);
        }

        CardCommands::Reorder(args) => {
            let board = resolve_board(store, &args.board).await?;
            let column = resolve_column(&board, &args.column)?;
            let written = card::reorder_cards(store, &board.id, &column.id, &args.cards).await?;
            output::success(format!(
                "Reordered {} ({} card(s) updated)",
                column.name.cyan(),
                written
            ));
        }

        CardCommands::Compact(args) => {
            let board = resolve_board(store, &args.board).await?;
            let column = resolve_column(&board, &args.column)?;
            let written = ordering::compact_column(store, &board.id, &column.id).await?;
            output::success(format!(
                "Compacted {} ({} card(s) updated)",
                column.name.cyan(),
                written
            ));
        }
    }

    Ok(())
}
