//! Board management commands.

use std::str::FromStr;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use tablero_core::board::{self, ColumnColor, NewBoard, NewColumn, NewProperty, PropertyType};
use tablero_store::SharedStore;

use super::{load_projection, resolve_board};
use crate::output;

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Create a new board
    Create(CreateBoardArgs),

    /// List all boards
    List,

    /// Display a board with its cards
    Show(BoardRef),

    /// Change a board's title
    Rename(RenameBoardArgs),

    /// Delete a board and all of its cards
    Delete(BoardRef),
}

#[derive(Args)]
pub struct CreateBoardArgs {
    /// Board title
    pub title: String,

    /// Column, as `Name` or `Name:color` (repeatable, in display order)
    #[arg(short, long = "column", required = true)]
    pub columns: Vec<String>,

    /// Card property, as `Name` or `Name:type` (repeatable)
    #[arg(short, long = "property")]
    pub properties: Vec<String>,
}

#[derive(Args)]
pub struct BoardRef {
    /// Board id or title
    pub board: String,
}

#[derive(Args)]
pub struct RenameBoardArgs {
    /// Board id or title
    pub board: String,

    /// New title
    pub title: String,
}

/// Split `Name:suffix` at the last colon when the suffix parses as `T`.
/// Otherwise the whole argument is the name.
fn split_suffix<T: FromStr>(raw: &str) -> (&str, Option<T>) {
    raw.rsplit_once(':')
        .and_then(|(name, suffix)| suffix.trim().parse().ok().map(|parsed| (name, Some(parsed))))
        .unwrap_or((raw, None))
}

pub fn parse_column(raw: &str) -> NewColumn {
    let (name, color) = split_suffix::<ColumnColor>(raw);
    let column = NewColumn::new(name);
    match color {
        Some(color) => column.with_color(color),
        None => column,
    }
}

pub fn parse_property(raw: &str) -> NewProperty {
    let (name, kind) = split_suffix::<PropertyType>(raw);
    NewProperty {
        name: name.to_string(),
        kind,
    }
}

pub async fn execute(cmd: BoardCommands, store: &SharedStore) -> Result<()> {
    match cmd {
        BoardCommands::Create(args) => {
            let input = NewBoard {
                title: args.title,
                columns: args.columns.iter().map(|c| parse_column(c)).collect(),
                properties: args.properties.iter().map(|p| parse_property(p)).collect(),
            };
            let board = board::create_board(store, input).await?;
            output::success(format!(
                "Created board: {} ({})",
                board.title.cyan(),
                board.id.dimmed()
            ));
        }

        BoardCommands::List => {
            let boards = board::list_boards(store).await?;
            output::print_boards_table(&boards);
        }

        BoardCommands::Show(args) => {
            let board = resolve_board(store, &args.board).await?;
            let projection = load_projection(store, board).await?;
            output::print_board(&projection);
            println!();
            output::print_columns(&projection);
        }

        BoardCommands::Rename(args) => {
            let existing = resolve_board(store, &args.board).await?;
            let board = board::rename_board(store, &existing.id, &args.title).await?;
            output::success(format!("Renamed board to {}", board.title.cyan()));
        }

        BoardCommands::Delete(args) => {
            let existing = resolve_board(store, &args.board).await?;
            board::delete_board(store, &existing.id).await?;
            output::success(format!(
                "Deleted board {} ({})",
                existing.title.cyan(),
                existing.id.dimmed()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_arg() {
        let column = parse_column("In progress:amber");
        assert_eq!(column.name, "In progress");
        assert_eq!(column.color, Some(ColumnColor::Amber));
        assert_eq!(parse_column("Todo").color, None);

        let column = parse_column("Todo:mauve");
        assert_eq!(column.name, "Todo:mauve");
        assert_eq!(column.color, None);
    }

    #[test]
    fn test_column_name_with_colon() {
        let column = parse_column("Phase: 1");
        assert_eq!(column.name, "Phase: 1");
        assert_eq!(column.color, None);

        let column = parse_column("Phase: 1:teal");
        assert_eq!(column.name, "Phase: 1");
        assert_eq!(column.color, Some(ColumnColor::Teal));
    }

    #[test]
    fn test_parse_property_arg() {
        let property = parse_property("Due:date");
        assert_eq!(property.name, "Due");
        assert_eq!(property.kind, Some(PropertyType::Date));

        let property = parse_property("Owner:person");
        assert_eq!(property.name, "Owner:person");
        assert_eq!(property.kind, None);

        let property = parse_property("Time: start:date");
        assert_eq!(property.name, "Time: start");
        assert_eq!(property.kind, Some(PropertyType::Date));
    }
}
