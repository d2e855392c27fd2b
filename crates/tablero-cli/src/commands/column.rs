//! Column management commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tablero_core::board::{self, ColumnColor, ColumnUpdate, NewColumn};
use tablero_store::SharedStore;

use super::{resolve_board, resolve_column};
use crate::output;

#[derive(Subcommand)]
pub enum ColumnCommands {
    /// Append a column to a board
    Add(AddColumnArgs),

    /// Change a column's name, color or width
    Update(UpdateColumnArgs),

    /// Delete a column and its cards
    Delete(ColumnRef),
}

#[derive(Args)]
pub struct AddColumnArgs {
    /// Board id or title
    pub board: String,

    /// Column name
    pub name: String,

    /// Column color (blue, green, red, amber, ...)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct UpdateColumnArgs {
    /// Board id or title
    pub board: String,

    /// Column id or name
    pub column: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New color
    #[arg(long)]
    pub color: Option<String>,

    /// Display width in pixels
    #[arg(long)]
    pub width: Option<u32>,
}

#[derive(Args)]
pub struct ColumnRef {
    /// Board id or title
    pub board: String,

    /// Column id or name
    pub column: String,
}

fn parse_color(color: Option<&str>) -> Result<Option<ColumnColor>> {
    color
        .map(|c| {
            c.parse::<ColumnColor>().map_err(|_| {
                let known: Vec<&str> = ColumnColor::ALL.iter().map(|c| c.as_str()).collect();
                anyhow!("Unknown column color '{}'. Use one of: {}", c, known.join(", "))
            })
        })
        .transpose()
}

pub async fn execute(cmd: ColumnCommands, store: &SharedStore) -> Result<()> {
    match cmd {
        ColumnCommands::Add(args) => {
            let board = resolve_board(store, &args.board).await?;
            let mut input = NewColumn::new(args.name);
            if let Some(color) = parse_color(args.color.as_deref())? {
                input = input.with_color(color);
            }
            let column = board::add_column(store, &board.id, input).await?;
            output::success(format!(
                "Added column {} ({}) to {}",
                column.name.cyan(),
                column.id.dimmed(),
                board.title
            ));
        }

        ColumnCommands::Update(args) => {
            let board = resolve_board(store, &args.board).await?;
            let column_id = resolve_column(&board, &args.column)?.id.clone();
            let update = ColumnUpdate {
                name: args.name,
                color: parse_color(args.color.as_deref())?,
                width: args.width,
            };
            let column = board::update_column(store, &board.id, &column_id, update).await?;
            output::success(format!(
                "Updated column {} ({})",
                column.name.cyan(),
                column.color.as_str()
            ));
        }

        ColumnCommands::Delete(args) => {
            let board = resolve_board(store, &args.board).await?;
            let column = resolve_column(&board, &args.column)?;
            board::delete_column(store, &board.id, &column.id).await?;
            output::success(format!("Deleted column {}", column.name.cyan()));
        }
    }

    Ok(())
}
